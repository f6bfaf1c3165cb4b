//! Provider registry - who has opted in, and in what order
//!
//! Registration ordinals are contiguous from 1 and assigned in call order;
//! `providers_total` is the monotonic registration count that campaign
//! creation snapshots as its payout denominator. Only this component
//! mutates the provider counters.

use adrail_core::{AdrailError, AdrailResult, Address, StateChange};
use adrail_state::{
    encode_u64, provider_key, ProviderRecord, StateStore, DATA_PROVIDERS_ENABLED_KEY,
    PROVIDERS_TOTAL_KEY, RECEIVERS_ENABLED_KEY,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Provider registry over the shared market state
pub struct ProviderRegistry<S: StateStore> {
    state: Arc<S>,
}

impl<S: StateStore> Clone for ProviderRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: StateStore + 'static> ProviderRegistry<S> {
    pub fn new(state: Arc<S>) -> Self {
        Self { state }
    }

    /// Register an address as a data provider. Assigns the next ordinal
    /// and enables both opt-in flags. Fails if already registered.
    pub async fn enable_new_user(&self, address: Address) -> AdrailResult<u64> {
        if self.state.get_provider(&address).await?.is_some() {
            return Err(AdrailError::AlreadyRegistered(address.to_hex()));
        }

        let total = self.state.counter(PROVIDERS_TOTAL_KEY).await?;
        let receivers = self.state.counter(RECEIVERS_ENABLED_KEY).await?;
        let data_providers = self.state.counter(DATA_PROVIDERS_ENABLED_KEY).await?;

        let ordinal = total + 1;
        let record = ProviderRecord::new(ordinal);

        let changes = vec![
            StateChange::set(provider_key(&address), record.to_bytes()),
            StateChange::set(PROVIDERS_TOTAL_KEY.to_vec(), encode_u64(ordinal)),
            StateChange::set(RECEIVERS_ENABLED_KEY.to_vec(), encode_u64(receivers + 1)),
            StateChange::set(
                DATA_PROVIDERS_ENABLED_KEY.to_vec(),
                encode_u64(data_providers + 1),
            ),
        ];
        self.state.apply_batch(changes).await?;

        info!("Provider {} registered with ordinal {}", address, ordinal);
        Ok(ordinal)
    }

    /// Set the receive-campaigns opt-in flag on the caller's record
    pub async fn toggle_receive_campaigns(
        &self,
        address: Address,
        enabled: bool,
    ) -> AdrailResult<()> {
        let mut record = self.require_provider(&address).await?;
        if record.receives_campaigns == enabled {
            return Ok(());
        }
        record.receives_campaigns = enabled;

        let receivers = self.state.counter(RECEIVERS_ENABLED_KEY).await?;
        let receivers = if enabled {
            receivers + 1
        } else {
            receivers.saturating_sub(1)
        };

        let changes = vec![
            StateChange::set(provider_key(&address), record.to_bytes()),
            StateChange::set(RECEIVERS_ENABLED_KEY.to_vec(), encode_u64(receivers)),
        ];
        self.state.apply_batch(changes).await?;

        debug!("Provider {} receive_campaigns={}", address, enabled);
        Ok(())
    }

    /// Set the provide-data opt-in flag on the caller's record
    pub async fn toggle_provide_data(&self, address: Address, enabled: bool) -> AdrailResult<()> {
        let mut record = self.require_provider(&address).await?;
        if record.provides_data == enabled {
            return Ok(());
        }
        record.provides_data = enabled;

        let data_providers = self.state.counter(DATA_PROVIDERS_ENABLED_KEY).await?;
        let data_providers = if enabled {
            data_providers + 1
        } else {
            data_providers.saturating_sub(1)
        };

        let changes = vec![
            StateChange::set(provider_key(&address), record.to_bytes()),
            StateChange::set(DATA_PROVIDERS_ENABLED_KEY.to_vec(), encode_u64(data_providers)),
        ];
        self.state.apply_batch(changes).await?;

        debug!("Provider {} provides_data={}", address, enabled);
        Ok(())
    }

    /// Monotonic registration count (campaign snapshot source)
    pub async fn providers_total(&self) -> AdrailResult<u64> {
        self.state.counter(PROVIDERS_TOTAL_KEY).await
    }

    /// Count of providers currently opted in to receive campaigns
    pub async fn total_campaign_receivers(&self) -> AdrailResult<u64> {
        self.state.counter(RECEIVERS_ENABLED_KEY).await
    }

    /// Count of providers currently opted in to share data
    pub async fn total_data_providers(&self) -> AdrailResult<u64> {
        self.state.counter(DATA_PROVIDERS_ENABLED_KEY).await
    }

    /// Look up a provider record
    pub async fn get_provider(&self, address: &Address) -> AdrailResult<Option<ProviderRecord>> {
        self.state.get_provider(address).await
    }

    /// Whether an address has registered
    pub async fn is_registered(&self, address: &Address) -> AdrailResult<bool> {
        Ok(self.state.get_provider(address).await?.is_some())
    }

    /// Current receive-campaigns flag; fails if never registered
    pub async fn receives_campaigns(&self, address: &Address) -> AdrailResult<bool> {
        Ok(self.require_provider(address).await?.receives_campaigns)
    }

    /// Current provide-data flag; fails if never registered
    pub async fn provides_data(&self, address: &Address) -> AdrailResult<bool> {
        Ok(self.require_provider(address).await?.provides_data)
    }

    async fn require_provider(&self, address: &Address) -> AdrailResult<ProviderRecord> {
        self.state
            .get_provider(address)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(address.to_hex()))
    }
}
