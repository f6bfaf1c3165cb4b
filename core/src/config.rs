//! Configuration types for Adrail

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Market configuration
    pub market: MarketConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "adrail-node".to_string(),
            data_dir: PathBuf::from("./data"),
            storage: StorageConfig::default(),
            market: MarketConfig::default(),
            api: ApiConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-memory store, for tests and development
    Memory,
    /// sled-backed persistent store
    Sled,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use
    pub backend: StorageBackend,

    /// Database directory under data_dir (sled backend only)
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            db_path: PathBuf::from("market-db"),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable HTTP API
    pub enabled: bool,

    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

/// Campaign market configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Maximum total byte length of campaign metadata fields
    pub max_metadata_bytes: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_metadata_bytes: 4096,
        }
    }
}
