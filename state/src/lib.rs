//! Adrail State Management
//!
//! Provides the key-value state model for the campaign market: typed
//! records for providers, campaigns, and payout accounts, an in-memory
//! store for tests and light deployments, and a sled-backed persistent
//! store.

pub mod store;
pub mod memory;
pub mod persistent;

pub use store::*;
pub use memory::*;
pub use persistent::*;
