//! Adrail node: runtime wiring and HTTP API

pub mod runtime;
pub mod api;

pub use runtime::*;
pub use api::*;
