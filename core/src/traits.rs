//! Core traits defining Adrail interfaces
//!
//! These traits define the contract between the market module and the
//! underlying state storage.

use crate::types::StateVersion;
use async_trait::async_trait;

/// Result type for Adrail operations
pub type AdrailResult<T> = Result<T, crate::error::AdrailError>;

/// State provider trait
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Get the current state version
    async fn version(&self) -> StateVersion;

    /// Get a value by key
    async fn get(&self, key: &[u8]) -> AdrailResult<Option<Vec<u8>>>;

    /// Check if a key exists
    async fn exists(&self, key: &[u8]) -> AdrailResult<bool>;
}

/// State mutator trait
#[async_trait]
pub trait StateMutator: StateProvider {
    /// Set a value
    async fn set(&self, key: &[u8], value: &[u8]) -> AdrailResult<()>;

    /// Delete a key
    async fn delete(&self, key: &[u8]) -> AdrailResult<()>;

    /// Apply a batch of changes atomically
    async fn apply_batch(&self, changes: Vec<StateChange>) -> AdrailResult<StateVersion>;
}

/// State change operation
#[derive(Debug, Clone)]
pub enum StateChange {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl StateChange {
    pub fn set(key: Vec<u8>, value: Vec<u8>) -> Self {
        StateChange::Set { key, value }
    }

    pub fn delete(key: Vec<u8>) -> Self {
        StateChange::Delete { key }
    }
}
