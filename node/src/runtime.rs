//! Node runtime combining store and market

use adrail_core::{AdrailResult, NodeConfig, StateVersion};
use adrail_market::CampaignMarket;
use adrail_state::StateStore;
use std::sync::Arc;
use tracing::info;

/// Node runtime over a chosen store backend
pub struct NodeRuntime<S: StateStore> {
    config: NodeConfig,
    market: CampaignMarket<S>,
}

impl<S: StateStore + 'static> NodeRuntime<S> {
    pub fn new(config: NodeConfig, state: Arc<S>) -> Self {
        let market = CampaignMarket::new(state, config.market.clone());
        info!("Node runtime '{}' initialized", config.name);
        Self { config, market }
    }

    pub fn market(&self) -> &CampaignMarket<S> {
        &self.market
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub async fn state_version(&self) -> StateVersion {
        self.market.state_version().await
    }

    /// Aggregate counters for the status endpoint
    pub async fn status(&self) -> AdrailResult<RuntimeStatus> {
        Ok(RuntimeStatus {
            providers_total: self.market.providers_total().await?,
            campaign_receivers: self.market.total_campaign_receivers().await?,
            data_providers: self.market.total_data_providers().await?,
            campaign_count: self.market.campaign_count().await?,
            vault_balance: self.market.vault_balance().await?.0,
            state_version: self.state_version().await.0,
        })
    }
}

/// Snapshot of node-level counters
#[derive(Debug, Clone)]
pub struct RuntimeStatus {
    pub providers_total: u64,
    pub campaign_receivers: u64,
    pub data_providers: u64,
    pub campaign_count: u64,
    pub vault_balance: u128,
    pub state_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use adrail_core::{Address, Amount, CampaignMetadata};
    use adrail_state::create_memory_store;

    fn create_test_runtime() -> NodeRuntime<adrail_state::MemoryStateStore> {
        NodeRuntime::new(NodeConfig::default(), create_memory_store())
    }

    #[tokio::test]
    async fn test_runtime_status() {
        let runtime = create_test_runtime();

        let status = runtime.status().await.unwrap();
        assert_eq!(status.providers_total, 0);
        assert_eq!(status.campaign_count, 0);
        assert_eq!(status.state_version, 0);

        runtime
            .market()
            .enable_new_user(Address([2u8; 32]))
            .await
            .unwrap();
        runtime
            .market()
            .create_campaign(
                Address([1u8; 32]),
                CampaignMetadata::new("nike", "fashion", "new shoes", "0xipfshash"),
                Amount::from_milli(300),
            )
            .await
            .unwrap();

        let status = runtime.status().await.unwrap();
        assert_eq!(status.providers_total, 1);
        assert_eq!(status.campaign_count, 1);
        assert_eq!(status.vault_balance, Amount::from_milli(300).0);
    }
}
