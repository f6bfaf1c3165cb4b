//! Campaign Marketplace Module for Adrail
//!
//! Implements the escrowed ad-campaign rewards ledger:
//! - Provider registration with ordered ordinals
//! - Campaign escrow with registry snapshots
//! - Floor-share reward computation and idempotent withdrawal
//! - Vault conservation accounting

pub mod registry;
pub mod escrow;
pub mod rewards;
pub mod vault;
pub mod market;

pub use registry::*;
pub use escrow::*;
pub use rewards::*;
pub use vault::*;
pub use market::*;
