//! Core types for Adrail
//!
//! Defines fundamental data structures used across the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

/// Escrowed value amount (in smallest unit)
/// Using u128 for large amounts support
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u128::MAX);

    /// One token = 10^18 smallest units (like ETH wei)
    pub const DECIMALS: u32 = 18;
    pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

    pub fn new(value: u128) -> Self {
        Amount(value)
    }

    pub fn from_tokens(tokens: u64) -> Self {
        Amount(tokens as u128 * Self::ONE_TOKEN)
    }

    /// Convenience for fractional budgets, e.g. 300 milli = 0.3 tokens
    pub fn from_milli(milli: u64) -> Self {
        Amount(milli as u128 * (Self::ONE_TOKEN / 1000))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Floor division by a share count. Remainders are not redistributed.
    pub fn floor_div(self, divisor: u64) -> Option<Amount> {
        self.0.checked_div(divisor as u128).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::ONE_TOKEN;
        let frac = self.0 % Self::ONE_TOKEN;
        if frac == 0 {
            write!(f, "{} ADR", whole)
        } else {
            write!(f, "{}.{:018} ADR", whole, frac)
        }
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

/// Campaign identifier (sequential from 1)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct CampaignId(pub u64);

impl CampaignId {
    pub fn new(value: u64) -> Self {
        CampaignId(value)
    }

    pub fn next(&self) -> CampaignId {
        CampaignId(self.0 + 1)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CampaignId({})", self.0)
    }
}

/// Opaque campaign metadata, stored but never interpreted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignMetadata {
    /// Organization running the ad
    pub organization: String,
    /// Free-form category label
    pub category: String,
    /// Display title
    pub title: String,
    /// Content-addressed reference to the creative (e.g. an IPFS hash);
    /// retrieval is entirely external
    pub content_ref: String,
}

impl CampaignMetadata {
    pub fn new(
        organization: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
        content_ref: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            category: category.into(),
            title: title.into(),
            content_ref: content_ref.into(),
        }
    }

    /// Total byte length of all fields, for size limits
    pub fn byte_len(&self) -> usize {
        self.organization.len() + self.category.len() + self.title.len() + self.content_ref.len()
    }
}

/// Timestamp in milliseconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// State version, bumped on every committed batch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StateVersion(pub u64);

impl StateVersion {
    pub fn new(value: u64) -> Self {
        StateVersion(value)
    }

    pub fn next(&self) -> StateVersion {
        StateVersion(self.0 + 1)
    }
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let addr = Address([1u8; 32]);
        let hex = addr.to_hex();
        let parsed = Address::from_hex(&hex).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_address_hex_with_prefix() {
        let addr = Address([7u8; 32]);
        let parsed = Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_amount_operations() {
        let a = Amount::from_tokens(10);
        let b = Amount::from_tokens(5);
        assert_eq!(a.checked_sub(b), Some(Amount::from_tokens(5)));
        assert_eq!(b.checked_sub(a), None);
    }

    #[test]
    fn test_amount_floor_div() {
        // 0.3 tokens over 2 providers, floor division
        let budget = Amount::from_milli(300);
        assert_eq!(budget.floor_div(2), Some(Amount::from_milli(150)));
        // remainder is lost, not redistributed
        let odd = Amount::new(7);
        assert_eq!(odd.floor_div(2), Some(Amount::new(3)));
        assert_eq!(odd.floor_div(0), None);
    }

    #[test]
    fn test_campaign_id_sequence() {
        let id = CampaignId::new(1);
        assert_eq!(id.next(), CampaignId::new(2));
    }

    #[test]
    fn test_metadata_byte_len() {
        let meta = CampaignMetadata::new("nike", "fashion", "new shoes", "0xipfshash");
        assert_eq!(meta.byte_len(), 4 + 7 + 9 + 10);
    }
}
