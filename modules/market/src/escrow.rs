//! Campaign escrow - append-only campaign records with registry snapshots
//!
//! Each campaign freezes the registry size at creation time; that snapshot
//! is the payout denominator forever. Campaigns are never cancelled and
//! budgets never change.

use adrail_core::{
    AdrailError, AdrailResult, Address, Amount, CampaignId, CampaignMetadata, MarketConfig,
    StateChange, Timestamp,
};
use adrail_state::{
    campaign_key, decode_u64, encode_u64, organizer_campaign_key, CampaignRecord, StateStore,
    CAMPAIGN_COUNT_KEY, PROVIDERS_TOTAL_KEY,
};
use std::sync::Arc;
use tracing::info;

use crate::vault::Vault;

/// Campaign escrow over the shared market state
pub struct CampaignEscrow<S: StateStore> {
    state: Arc<S>,
    vault: Vault<S>,
    config: MarketConfig,
}

impl<S: StateStore> Clone for CampaignEscrow<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            vault: self.vault.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: StateStore + 'static> CampaignEscrow<S> {
    pub fn new(state: Arc<S>, vault: Vault<S>, config: MarketConfig) -> Self {
        Self {
            state,
            vault,
            config,
        }
    }

    /// Create a campaign: snapshot the registry, assign the next id,
    /// store the immutable record, and move the deposit into the vault.
    /// All writes commit in one atomic batch.
    pub async fn create_campaign(
        &self,
        organizer: Address,
        metadata: CampaignMetadata,
        deposit: Amount,
    ) -> AdrailResult<CampaignId> {
        if deposit.is_zero() {
            return Err(AdrailError::ZeroBudget);
        }
        if metadata.byte_len() > self.config.max_metadata_bytes {
            return Err(AdrailError::MetadataTooLarge {
                limit: self.config.max_metadata_bytes,
                actual: metadata.byte_len(),
            });
        }

        let providers_at_creation = self.state.counter(PROVIDERS_TOTAL_KEY).await?;
        let id = self.state.counter(CAMPAIGN_COUNT_KEY).await? + 1;

        let record = CampaignRecord {
            id,
            organizer,
            budget: deposit.0,
            providers_at_creation,
            metadata,
            created_at: Timestamp::now().0,
        };

        let mut changes = vec![
            StateChange::set(campaign_key(id), record.to_bytes()),
            StateChange::set(CAMPAIGN_COUNT_KEY.to_vec(), encode_u64(id)),
            StateChange::set(organizer_campaign_key(&organizer), encode_u64(id)),
        ];
        changes.extend(self.vault.deposit_changes(deposit).await?);
        self.state.apply_batch(changes).await?;

        info!(
            "Campaign {} created by {}: budget={} providers_at_creation={}",
            id, organizer, deposit, providers_at_creation
        );
        Ok(CampaignId::new(id))
    }

    /// Number of campaigns ever created (ids are sequential from 1)
    pub async fn campaign_count(&self) -> AdrailResult<u64> {
        self.state.counter(CAMPAIGN_COUNT_KEY).await
    }

    /// Look up a campaign by id
    pub async fn get_campaign(&self, id: CampaignId) -> AdrailResult<CampaignRecord> {
        self.state
            .get_campaign(id.0)
            .await?
            .ok_or(AdrailError::InvalidCampaignId(id.0))
    }

    /// Most recent campaign id created by an organizer
    pub async fn active_campaign_id(&self, organizer: &Address) -> AdrailResult<Option<CampaignId>> {
        match self.state.get(&organizer_campaign_key(organizer)).await? {
            Some(bytes) => Ok(Some(CampaignId::new(decode_u64(&bytes)?))),
            None => Ok(None),
        }
    }

    /// Most recent campaign record created by an organizer
    pub async fn active_campaign(&self, organizer: &Address) -> AdrailResult<Option<CampaignRecord>> {
        match self.active_campaign_id(organizer).await? {
            Some(id) => Ok(Some(self.get_campaign(id).await?)),
            None => Ok(None),
        }
    }

    /// Flat list of campaign ids visible to a receiving provider. The
    /// caller must be registered; an opted-out caller sees an empty list.
    /// Selection policy over this list belongs to the client layer.
    pub async fn active_campaign_ids(&self, caller: &Address) -> AdrailResult<Vec<CampaignId>> {
        let provider = self
            .state
            .get_provider(caller)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(caller.to_hex()))?;

        if !provider.receives_campaigns {
            return Ok(Vec::new());
        }

        let count = self.campaign_count().await?;
        Ok((1..=count).map(CampaignId::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderRegistry;
    use adrail_state::MemoryStateStore;

    fn addr(byte: u8) -> Address {
        Address([byte; 32])
    }

    fn meta() -> CampaignMetadata {
        CampaignMetadata::new("nike", "fashion", "new shoes", "0xipfshash")
    }

    fn setup() -> (
        CampaignEscrow<MemoryStateStore>,
        ProviderRegistry<MemoryStateStore>,
    ) {
        let state = Arc::new(MemoryStateStore::new());
        let vault = Vault::new(state.clone());
        (
            CampaignEscrow::new(state.clone(), vault, MarketConfig::default()),
            ProviderRegistry::new(state),
        )
    }

    #[tokio::test]
    async fn test_create_campaign_assigns_sequential_ids() {
        let (escrow, _) = setup();
        let organizer = addr(1);

        let id1 = escrow
            .create_campaign(organizer, meta(), Amount::from_milli(100))
            .await
            .unwrap();
        let id2 = escrow
            .create_campaign(organizer, meta(), Amount::from_milli(100))
            .await
            .unwrap();

        assert_eq!(id1, CampaignId::new(1));
        assert_eq!(id2, CampaignId::new(2));
        assert_eq!(escrow.campaign_count().await.unwrap(), 2);
        assert_eq!(
            escrow.active_campaign_id(&organizer).await.unwrap(),
            Some(id2)
        );
    }

    #[tokio::test]
    async fn test_zero_budget_fails() {
        let (escrow, _) = setup();

        let result = escrow.create_campaign(addr(1), meta(), Amount::ZERO).await;
        assert!(matches!(result, Err(AdrailError::ZeroBudget)));
        assert_eq!(escrow.campaign_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_metadata_fails() {
        let state = Arc::new(MemoryStateStore::new());
        let vault = Vault::new(state.clone());
        let escrow = CampaignEscrow::new(
            state,
            vault,
            MarketConfig {
                max_metadata_bytes: 8,
            },
        );

        let result = escrow
            .create_campaign(addr(1), meta(), Amount::from_milli(100))
            .await;
        assert!(matches!(result, Err(AdrailError::MetadataTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_creation() {
        let (escrow, registry) = setup();

        registry.enable_new_user(addr(2)).await.unwrap();
        let id = escrow
            .create_campaign(addr(1), meta(), Amount::from_milli(300))
            .await
            .unwrap();

        // later registrations never move the snapshot
        registry.enable_new_user(addr(3)).await.unwrap();
        registry.enable_new_user(addr(4)).await.unwrap();

        let record = escrow.get_campaign(id).await.unwrap();
        assert_eq!(record.providers_at_creation, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_campaign_fails() {
        let (escrow, _) = setup();

        let result = escrow.get_campaign(CampaignId::new(7)).await;
        assert!(matches!(result, Err(AdrailError::InvalidCampaignId(7))));
    }

    #[tokio::test]
    async fn test_active_campaign_ids_gated_on_opt_in() {
        let (escrow, registry) = setup();
        let user = addr(2);

        // unregistered callers are rejected
        let result = escrow.active_campaign_ids(&user).await;
        assert!(matches!(result, Err(AdrailError::NotRegistered(_))));

        registry.enable_new_user(user).await.unwrap();
        escrow
            .create_campaign(addr(1), meta(), Amount::from_milli(100))
            .await
            .unwrap();
        escrow
            .create_campaign(addr(1), meta(), Amount::from_milli(100))
            .await
            .unwrap();

        let ids = escrow.active_campaign_ids(&user).await.unwrap();
        assert_eq!(ids, vec![CampaignId::new(1), CampaignId::new(2)]);

        // opting out empties the view but does not error
        registry.toggle_receive_campaigns(user, false).await.unwrap();
        assert!(escrow.active_campaign_ids(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deposit_lands_in_vault() {
        let (escrow, _) = setup();
        let state_vault = escrow.vault.clone();

        escrow
            .create_campaign(addr(1), meta(), Amount::from_milli(300))
            .await
            .unwrap();

        assert_eq!(
            state_vault.balance().await.unwrap(),
            Amount::from_milli(300)
        );
    }
}
