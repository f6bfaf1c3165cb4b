//! Error types for Adrail

use thiserror::Error;

/// Main error type for Adrail
#[derive(Error, Debug)]
pub enum AdrailError {
    // ============ Registry Errors ============
    #[error("Address {0} is already registered as a provider")]
    AlreadyRegistered(String),

    #[error("Address {0} is not a registered provider")]
    NotRegistered(String),

    // ============ Campaign Errors ============
    #[error("Campaign budget must be greater than zero")]
    ZeroBudget,

    #[error("Unknown campaign id: {0}")]
    InvalidCampaignId(u64),

    #[error("Campaign metadata too large: limit {limit} bytes, got {actual}")]
    MetadataTooLarge { limit: usize, actual: usize },

    // ============ Vault Errors ============
    #[error("Insufficient vault balance: required {required}, available {available}")]
    InsufficientVaultBalance { required: u128, available: u128 },

    // ============ State Errors ============
    #[error("State corruption detected: {0}")]
    StateCorruption(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for AdrailError {
    fn from(err: std::io::Error) -> Self {
        AdrailError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for AdrailError {
    fn from(err: bincode::Error) -> Self {
        AdrailError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for AdrailError {
    fn from(err: serde_json::Error) -> Self {
        AdrailError::SerializationError(err.to_string())
    }
}
