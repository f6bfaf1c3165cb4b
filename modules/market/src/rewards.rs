//! Reward ledger - floor-share entitlement and idempotent withdrawal
//!
//! A provider is eligible for a campaign iff its registration ordinal is
//! within the campaign's creation-time registry snapshot. The share is
//! `budget / providers_at_creation` with floor division; sub-denominator
//! remainders stay in the vault permanently. Every visited campaign id
//! lands in the provider's processed set, so repeat withdrawals only ever
//! pay campaigns created since the last call.

use adrail_core::{AdrailError, AdrailResult, Address, Amount, StateChange};
use adrail_state::{provider_key, CampaignRecord, ProviderRecord, StateStore, CAMPAIGN_COUNT_KEY};
use std::sync::Arc;
use tracing::{debug, info};

use crate::vault::Vault;

/// Reward ledger over the shared market state
pub struct RewardLedger<S: StateStore> {
    state: Arc<S>,
    vault: Vault<S>,
}

impl<S: StateStore> Clone for RewardLedger<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            vault: self.vault.clone(),
        }
    }
}

impl<S: StateStore + 'static> RewardLedger<S> {
    pub fn new(state: Arc<S>, vault: Vault<S>) -> Self {
        Self { state, vault }
    }

    /// Pay out every unprocessed campaign the caller is eligible for.
    /// Bookkeeping and transfer commit in a single batch; a zero total is
    /// a successful no-op transfer, never an error.
    pub async fn withdraw_rewards(&self, address: Address) -> AdrailResult<Amount> {
        let mut provider = self
            .state
            .get_provider(&address)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(address.to_hex()))?;

        let campaign_count = self.state.counter(CAMPAIGN_COUNT_KEY).await?;

        let mut total = Amount::ZERO;
        let mut processed_any = false;

        for id in 1..=campaign_count {
            if provider.has_withdrawn(id) {
                continue;
            }

            let campaign = self.load_campaign(id).await?;
            total = total
                .checked_add(self.entitlement(&provider, &campaign)?)
                .ok_or_else(|| AdrailError::Internal("reward total overflow".into()))?;

            // Eligibility is fixed at campaign creation, so ineligible
            // campaigns are marked processed as well.
            provider.mark_withdrawn(id);
            processed_any = true;
        }

        if !processed_any {
            debug!("Provider {} has no unprocessed campaigns", address);
            return Ok(Amount::ZERO);
        }

        let mut changes = vec![StateChange::set(provider_key(&address), provider.to_bytes())];
        if !total.is_zero() {
            changes.extend(self.vault.pay_out_changes(&address, total).await?);
        }
        self.state.apply_batch(changes).await?;

        info!("Provider {} withdrew {}", address, total);
        Ok(total)
    }

    /// Read-only preview of what a withdrawal would pay right now
    pub async fn pending_rewards(&self, address: &Address) -> AdrailResult<Amount> {
        let provider = self
            .state
            .get_provider(address)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(address.to_hex()))?;

        let campaign_count = self.state.counter(CAMPAIGN_COUNT_KEY).await?;

        let mut total = Amount::ZERO;
        for id in 1..=campaign_count {
            if provider.has_withdrawn(id) {
                continue;
            }
            let campaign = self.load_campaign(id).await?;
            total = total
                .checked_add(self.entitlement(&provider, &campaign)?)
                .ok_or_else(|| AdrailError::Internal("reward total overflow".into()))?;
        }
        Ok(total)
    }

    /// Whether a campaign has already been processed for a provider
    pub async fn has_withdrawn(&self, address: &Address, campaign_id: u64) -> AdrailResult<bool> {
        let provider = self
            .state
            .get_provider(address)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(address.to_hex()))?;
        Ok(provider.has_withdrawn(campaign_id))
    }

    /// Floor-share entitlement of one provider in one campaign; zero when
    /// the provider registered after the campaign's snapshot.
    fn entitlement(
        &self,
        provider: &ProviderRecord,
        campaign: &CampaignRecord,
    ) -> AdrailResult<Amount> {
        if provider.ordinal > campaign.providers_at_creation {
            return Ok(Amount::ZERO);
        }

        // An eligible provider implies a snapshot >= 1; a zero divisor
        // here means corrupted campaign state.
        Amount::new(campaign.budget)
            .floor_div(campaign.providers_at_creation)
            .ok_or_else(|| {
                AdrailError::Internal(format!(
                    "campaign {} has a zero provider snapshot",
                    campaign.id
                ))
            })
    }

    /// Campaign ids are contiguous, so a hole is corruption, not a miss
    async fn load_campaign(&self, id: u64) -> AdrailResult<CampaignRecord> {
        self.state
            .get_campaign(id)
            .await?
            .ok_or_else(|| AdrailError::StateCorruption(format!("campaign {} missing", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::CampaignEscrow;
    use crate::registry::ProviderRegistry;
    use adrail_core::{CampaignMetadata, MarketConfig};
    use adrail_state::MemoryStateStore;

    struct Fixture {
        registry: ProviderRegistry<MemoryStateStore>,
        escrow: CampaignEscrow<MemoryStateStore>,
        ledger: RewardLedger<MemoryStateStore>,
        vault: Vault<MemoryStateStore>,
    }

    fn setup() -> Fixture {
        let state = Arc::new(MemoryStateStore::new());
        let vault = Vault::new(state.clone());
        Fixture {
            registry: ProviderRegistry::new(state.clone()),
            escrow: CampaignEscrow::new(state.clone(), vault.clone(), MarketConfig::default()),
            ledger: RewardLedger::new(state, vault.clone()),
            vault,
        }
    }

    fn addr(byte: u8) -> Address {
        Address([byte; 32])
    }

    fn meta() -> CampaignMetadata {
        CampaignMetadata::new("nike", "fashion", "new shoes", "0xipfshash")
    }

    async fn create(f: &Fixture, organizer: u8, budget_milli: u64) {
        f.escrow
            .create_campaign(addr(organizer), meta(), Amount::from_milli(budget_milli))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sole_provider_receives_full_budget() {
        // P1 registers; C1 budget 0.3; P1 withdraws 0.3
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;

        let paid = f.ledger.withdraw_rewards(addr(2)).await.unwrap();
        assert_eq!(paid, Amount::from_milli(300));
        assert_eq!(
            f.vault.account_balance(&addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );
    }

    #[tokio::test]
    async fn test_two_providers_split_budget() {
        // P1 and P2 register; C1 budget 0.3; each withdraws 0.15
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        f.registry.enable_new_user(addr(3)).await.unwrap();
        create(&f, 1, 300).await;

        assert_eq!(
            f.ledger.withdraw_rewards(addr(2)).await.unwrap(),
            Amount::from_milli(150)
        );
        assert_eq!(
            f.ledger.withdraw_rewards(addr(3)).await.unwrap(),
            Amount::from_milli(150)
        );
        assert_eq!(f.vault.balance().await.unwrap(), Amount::ZERO);
    }

    #[tokio::test]
    async fn test_post_campaign_registrant_excluded() {
        // P1 registers; C1 0.3; P2 registers; P1 gets 0.3, P2 gets 0
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;
        f.registry.enable_new_user(addr(3)).await.unwrap();

        assert_eq!(
            f.ledger.withdraw_rewards(addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );
        assert_eq!(f.ledger.withdraw_rewards(addr(3)).await.unwrap(), Amount::ZERO);

        // the zero withdrawal still marks C1 processed for P2
        assert!(f.ledger.has_withdrawn(&addr(3), 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_early_provider_collects_across_campaigns() {
        // P1 registers; C1 0.3 and C2 0.3 created; P2 registers; P1 gets 0.6
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;
        create(&f, 4, 300).await;
        f.registry.enable_new_user(addr(3)).await.unwrap();

        assert_eq!(
            f.ledger.withdraw_rewards(addr(2)).await.unwrap(),
            Amount::from_milli(600)
        );
    }

    #[tokio::test]
    async fn test_repeat_withdrawal_pays_zero() {
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;

        assert_eq!(
            f.ledger.withdraw_rewards(addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );
        // no new campaigns in between: second call transfers nothing
        assert_eq!(f.ledger.withdraw_rewards(addr(2)).await.unwrap(), Amount::ZERO);
        assert_eq!(
            f.vault.account_balance(&addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );
    }

    #[tokio::test]
    async fn test_withdrawal_picks_up_new_campaigns_only() {
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;

        f.ledger.withdraw_rewards(addr(2)).await.unwrap();
        create(&f, 1, 200).await;

        assert_eq!(
            f.ledger.withdraw_rewards(addr(2)).await.unwrap(),
            Amount::from_milli(200)
        );
        assert_eq!(
            f.vault.account_balance(&addr(2)).await.unwrap(),
            Amount::from_milli(500)
        );
    }

    #[tokio::test]
    async fn test_unregistered_withdrawal_fails() {
        let f = setup();
        create(&f, 1, 300).await;

        let result = f.ledger.withdraw_rewards(addr(9)).await;
        assert!(matches!(result, Err(AdrailError::NotRegistered(_))));
    }

    #[tokio::test]
    async fn test_floor_division_remainder_stays_in_vault() {
        // 7 units over 3 providers: each gets 2, 1 unit remains forever
        let f = setup();
        for i in 2..=4u8 {
            f.registry.enable_new_user(addr(i)).await.unwrap();
        }
        f.escrow
            .create_campaign(addr(1), meta(), Amount::new(7))
            .await
            .unwrap();

        for i in 2..=4u8 {
            assert_eq!(
                f.ledger.withdraw_rewards(addr(i)).await.unwrap(),
                Amount::new(2)
            );
        }
        assert_eq!(f.vault.balance().await.unwrap(), Amount::new(1));
    }

    #[tokio::test]
    async fn test_pending_rewards_preview() {
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;

        assert_eq!(
            f.ledger.pending_rewards(&addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );
        // preview does not mutate
        assert_eq!(
            f.ledger.pending_rewards(&addr(2)).await.unwrap(),
            Amount::from_milli(300)
        );

        f.ledger.withdraw_rewards(addr(2)).await.unwrap();
        assert_eq!(f.ledger.pending_rewards(&addr(2)).await.unwrap(), Amount::ZERO);
    }

    #[tokio::test]
    async fn test_conservation_across_interleavings() {
        let f = setup();
        f.registry.enable_new_user(addr(2)).await.unwrap();
        create(&f, 1, 300).await;
        create(&f, 4, 300).await;
        f.registry.enable_new_user(addr(3)).await.unwrap();
        create(&f, 5, 300).await;

        f.ledger.withdraw_rewards(addr(2)).await.unwrap();
        f.ledger.withdraw_rewards(addr(3)).await.unwrap();

        let deposited = f.vault.total_deposited().await.unwrap();
        let paid = f.vault.total_paid().await.unwrap();
        let balance = f.vault.balance().await.unwrap();

        assert_eq!(deposited, Amount::from_milli(900));
        assert_eq!(balance, deposited.saturating_sub(paid));
        assert!(paid <= deposited);

        // uniform per-campaign rule: P1 is in all three campaigns
        // (0.3 + 0.3 + 0.15), P2 only in the last (0.15)
        assert_eq!(
            f.vault.account_balance(&addr(2)).await.unwrap(),
            Amount::from_milli(750)
        );
        assert_eq!(
            f.vault.account_balance(&addr(3)).await.unwrap(),
            Amount::from_milli(150)
        );
    }
}
