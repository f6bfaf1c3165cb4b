//! Campaign market facade
//!
//! Owns the registry, escrow, reward ledger, and vault over one shared
//! store. Every mutating operation runs under a single async commit lock:
//! registrations and campaign creations need a strict total order for the
//! ordinal/snapshot invariants to hold. Read queries go straight to the
//! store.

use adrail_core::{
    AdrailResult, Address, Amount, CampaignId, CampaignMetadata, MarketConfig, StateVersion,
};
use adrail_state::{CampaignRecord, ProviderRecord, StateStore};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::escrow::CampaignEscrow;
use crate::registry::ProviderRegistry;
use crate::rewards::RewardLedger;
use crate::vault::Vault;

/// The campaign marketplace
pub struct CampaignMarket<S: StateStore> {
    state: Arc<S>,
    registry: ProviderRegistry<S>,
    escrow: CampaignEscrow<S>,
    rewards: RewardLedger<S>,
    vault: Vault<S>,
    commit_lock: Mutex<()>,
}

impl<S: StateStore + 'static> CampaignMarket<S> {
    pub fn new(state: Arc<S>, config: MarketConfig) -> Self {
        let vault = Vault::new(state.clone());
        Self {
            registry: ProviderRegistry::new(state.clone()),
            escrow: CampaignEscrow::new(state.clone(), vault.clone(), config),
            rewards: RewardLedger::new(state.clone(), vault.clone()),
            vault,
            state,
            commit_lock: Mutex::new(()),
        }
    }

    // ============ Mutating operations (serialized) ============

    pub async fn enable_new_user(&self, address: Address) -> AdrailResult<u64> {
        let _guard = self.commit_lock.lock().await;
        self.registry.enable_new_user(address).await
    }

    pub async fn toggle_receive_campaigns(
        &self,
        address: Address,
        enabled: bool,
    ) -> AdrailResult<()> {
        let _guard = self.commit_lock.lock().await;
        self.registry.toggle_receive_campaigns(address, enabled).await
    }

    pub async fn toggle_provide_data(&self, address: Address, enabled: bool) -> AdrailResult<()> {
        let _guard = self.commit_lock.lock().await;
        self.registry.toggle_provide_data(address, enabled).await
    }

    pub async fn create_campaign(
        &self,
        organizer: Address,
        metadata: CampaignMetadata,
        deposit: Amount,
    ) -> AdrailResult<CampaignId> {
        let _guard = self.commit_lock.lock().await;
        self.escrow.create_campaign(organizer, metadata, deposit).await
    }

    pub async fn withdraw_rewards(&self, address: Address) -> AdrailResult<Amount> {
        let _guard = self.commit_lock.lock().await;
        self.rewards.withdraw_rewards(address).await
    }

    // ============ Read queries ============

    pub async fn get_provider(&self, address: &Address) -> AdrailResult<Option<ProviderRecord>> {
        self.registry.get_provider(address).await
    }

    pub async fn is_registered(&self, address: &Address) -> AdrailResult<bool> {
        self.registry.is_registered(address).await
    }

    pub async fn receives_campaigns(&self, address: &Address) -> AdrailResult<bool> {
        self.registry.receives_campaigns(address).await
    }

    pub async fn provides_data(&self, address: &Address) -> AdrailResult<bool> {
        self.registry.provides_data(address).await
    }

    pub async fn providers_total(&self) -> AdrailResult<u64> {
        self.registry.providers_total().await
    }

    pub async fn total_campaign_receivers(&self) -> AdrailResult<u64> {
        self.registry.total_campaign_receivers().await
    }

    pub async fn total_data_providers(&self) -> AdrailResult<u64> {
        self.registry.total_data_providers().await
    }

    pub async fn get_campaign(&self, id: CampaignId) -> AdrailResult<CampaignRecord> {
        self.escrow.get_campaign(id).await
    }

    pub async fn campaign_count(&self) -> AdrailResult<u64> {
        self.escrow.campaign_count().await
    }

    pub async fn active_campaign_id(&self, organizer: &Address) -> AdrailResult<Option<CampaignId>> {
        self.escrow.active_campaign_id(organizer).await
    }

    pub async fn active_campaign(&self, organizer: &Address) -> AdrailResult<Option<CampaignRecord>> {
        self.escrow.active_campaign(organizer).await
    }

    pub async fn active_campaign_ids(&self, caller: &Address) -> AdrailResult<Vec<CampaignId>> {
        self.escrow.active_campaign_ids(caller).await
    }

    pub async fn pending_rewards(&self, address: &Address) -> AdrailResult<Amount> {
        self.rewards.pending_rewards(address).await
    }

    pub async fn has_withdrawn(&self, address: &Address, campaign_id: u64) -> AdrailResult<bool> {
        self.rewards.has_withdrawn(address, campaign_id).await
    }

    pub async fn vault_balance(&self) -> AdrailResult<Amount> {
        self.vault.balance().await
    }

    pub async fn total_deposited(&self) -> AdrailResult<Amount> {
        self.vault.total_deposited().await
    }

    pub async fn total_paid(&self) -> AdrailResult<Amount> {
        self.vault.total_paid().await
    }

    pub async fn account_balance(&self, address: &Address) -> AdrailResult<Amount> {
        self.vault.account_balance(address).await
    }

    pub async fn state_version(&self) -> StateVersion {
        self.state.version().await
    }
}

/// Shared market type
pub type SharedMarket<S> = Arc<CampaignMarket<S>>;
