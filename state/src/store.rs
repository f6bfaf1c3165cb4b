//! Core state store traits and persisted record types

use adrail_core::{
    AdrailError, AdrailResult, Address, CampaignMetadata, StateMutator, StateProvider,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Registered data-provider record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Registration ordinal, contiguous from 1 in call order
    pub ordinal: u64,
    /// Opt-in: receive ad campaigns
    pub receives_campaigns: bool,
    /// Opt-in: share profile data
    pub provides_data: bool,
    /// Campaign ids already processed for this provider
    pub withdrawn: BTreeSet<u64>,
}

impl ProviderRecord {
    /// New registration. Both opt-in flags start enabled; registering at
    /// all is the opt-in, toggles narrow it afterwards.
    pub fn new(ordinal: u64) -> Self {
        Self {
            ordinal,
            receives_campaigns: true,
            provides_data: true,
            withdrawn: BTreeSet::new(),
        }
    }

    pub fn has_withdrawn(&self, campaign_id: u64) -> bool {
        self.withdrawn.contains(&campaign_id)
    }

    pub fn mark_withdrawn(&mut self, campaign_id: u64) {
        self.withdrawn.insert(campaign_id);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> AdrailResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AdrailError::DeserializationError(e.to_string()))
    }
}

/// Escrowed campaign record, immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: u64,
    pub organizer: Address,
    /// Deposited budget in smallest units, fixed at creation
    pub budget: u128,
    /// Registry size snapshot at creation; the payout denominator
    pub providers_at_creation: u64,
    pub metadata: CampaignMetadata,
    pub created_at: u64,
}

impl CampaignRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> AdrailResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AdrailError::DeserializationError(e.to_string()))
    }
}

/// Payout account state (reward destination balance)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountRecord {
    pub balance: u128,
}

impl AccountRecord {
    pub fn new(balance: u128) -> Self {
        Self { balance }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> AdrailResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AdrailError::DeserializationError(e.to_string()))
    }
}

// Key prefixes
const PROVIDER_PREFIX: &[u8] = b"provider:";
const CAMPAIGN_PREFIX: &[u8] = b"campaign:";
const ACCOUNT_PREFIX: &[u8] = b"account:";
const ORGANIZER_PREFIX: &[u8] = b"organizer:";

// Market counter keys. Only the registry mutates the provider counters and
// only the escrow mutates the campaign/vault counters.
pub const PROVIDERS_TOTAL_KEY: &[u8] = b"meta:providers_total";
pub const RECEIVERS_ENABLED_KEY: &[u8] = b"meta:receivers_enabled";
pub const DATA_PROVIDERS_ENABLED_KEY: &[u8] = b"meta:data_providers_enabled";
pub const CAMPAIGN_COUNT_KEY: &[u8] = b"meta:campaign_count";
pub const VAULT_BALANCE_KEY: &[u8] = b"vault:balance";
pub const TOTAL_DEPOSITED_KEY: &[u8] = b"vault:total_deposited";
pub const TOTAL_PAID_KEY: &[u8] = b"vault:total_paid";

/// Build provider key
pub fn provider_key(address: &Address) -> Vec<u8> {
    let mut key = PROVIDER_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Build campaign key (big-endian id for ordered iteration)
pub fn campaign_key(id: u64) -> Vec<u8> {
    let mut key = CAMPAIGN_PREFIX.to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Build payout account key
pub fn account_key(address: &Address) -> Vec<u8> {
    let mut key = ACCOUNT_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Build organizer -> latest campaign id key
pub fn organizer_campaign_key(address: &Address) -> Vec<u8> {
    let mut key = ORGANIZER_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Encode an unsigned counter value
pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decode an unsigned counter value
pub fn decode_u64(bytes: &[u8]) -> AdrailResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| AdrailError::StateCorruption("bad u64 counter encoding".into()))?;
    Ok(u64::from_le_bytes(arr))
}

/// Encode an amount counter value
pub fn encode_u128(value: u128) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decode an amount counter value
pub fn decode_u128(bytes: &[u8]) -> AdrailResult<u128> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| AdrailError::StateCorruption("bad u128 counter encoding".into()))?;
    Ok(u128::from_le_bytes(arr))
}

/// Abstract state store interface with typed record helpers
#[async_trait]
pub trait StateStore: StateProvider + StateMutator {
    /// Get provider record
    async fn get_provider(&self, address: &Address) -> AdrailResult<Option<ProviderRecord>> {
        let key = provider_key(address);
        match self.get(&key).await? {
            Some(bytes) => Ok(Some(ProviderRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set provider record
    async fn set_provider(&self, address: &Address, record: &ProviderRecord) -> AdrailResult<()> {
        self.set(&provider_key(address), &record.to_bytes()).await
    }

    /// Get campaign record
    async fn get_campaign(&self, id: u64) -> AdrailResult<Option<CampaignRecord>> {
        match self.get(&campaign_key(id)).await? {
            Some(bytes) => Ok(Some(CampaignRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set campaign record
    async fn set_campaign(&self, record: &CampaignRecord) -> AdrailResult<()> {
        self.set(&campaign_key(record.id), &record.to_bytes()).await
    }

    /// Get payout account record
    async fn get_account(&self, address: &Address) -> AdrailResult<Option<AccountRecord>> {
        match self.get(&account_key(address)).await? {
            Some(bytes) => Ok(Some(AccountRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get payout account balance
    async fn get_balance(&self, address: &Address) -> AdrailResult<u128> {
        Ok(self
            .get_account(address)
            .await?
            .map(|a| a.balance)
            .unwrap_or(0))
    }

    /// Read a u64 counter, zero when unset
    async fn counter(&self, key: &[u8]) -> AdrailResult<u64> {
        match self.get(key).await? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    /// Read a u128 amount counter, zero when unset
    async fn amount_counter(&self, key: &[u8]) -> AdrailResult<u128> {
        match self.get(key).await? {
            Some(bytes) => decode_u128(&bytes),
            None => Ok(0),
        }
    }

    /// Create a read-only consistent snapshot
    async fn snapshot(&self) -> AdrailResult<Box<dyn StateStore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_record_serialization() {
        let mut record = ProviderRecord::new(3);
        record.mark_withdrawn(1);
        record.mark_withdrawn(5);

        let restored = ProviderRecord::from_bytes(&record.to_bytes()).unwrap();
        assert_eq!(restored.ordinal, 3);
        assert!(restored.receives_campaigns);
        assert!(restored.provides_data);
        assert!(restored.has_withdrawn(1));
        assert!(restored.has_withdrawn(5));
        assert!(!restored.has_withdrawn(2));
    }

    #[test]
    fn test_campaign_record_serialization() {
        let record = CampaignRecord {
            id: 1,
            organizer: Address([9u8; 32]),
            budget: 300,
            providers_at_creation: 2,
            metadata: CampaignMetadata::new("nike", "fashion", "new shoes", "0xipfshash"),
            created_at: 0,
        };

        let restored = CampaignRecord::from_bytes(&record.to_bytes()).unwrap();
        assert_eq!(restored.id, 1);
        assert_eq!(restored.budget, 300);
        assert_eq!(restored.providers_at_creation, 2);
        assert_eq!(restored.metadata.organization, "nike");
    }

    #[test]
    fn test_key_builders_distinct() {
        let addr = Address([1u8; 32]);
        assert_ne!(provider_key(&addr), account_key(&addr));
        assert_ne!(provider_key(&addr), organizer_campaign_key(&addr));
        assert_ne!(campaign_key(1), campaign_key(2));
    }

    #[test]
    fn test_campaign_keys_ordered() {
        // big-endian ids keep lexicographic order aligned with numeric order
        assert!(campaign_key(1) < campaign_key(2));
        assert!(campaign_key(255) < campaign_key(256));
    }

    #[test]
    fn test_counter_codecs() {
        assert_eq!(decode_u64(&encode_u64(42)).unwrap(), 42);
        assert_eq!(decode_u128(&encode_u128(u128::MAX)).unwrap(), u128::MAX);
        assert!(decode_u64(b"short").is_err());
    }
}
