//! Adrail Node Binary

use adrail_core::{NodeConfig, StorageBackend};
use adrail_node::{start_api_server, NodeRuntime};
use adrail_state::{create_memory_store, create_persistent_store};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "adrail-node")]
#[command(about = "Adrail Node - Escrowed Ad-Campaign Rewards Rail")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Use the volatile in-memory store instead of sled
        #[arg(long)]
        in_memory: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output file path
        #[arg(short, long, default_value = "adrail.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            api_addr,
            data_dir,
            in_memory,
        } => {
            let mut config = load_config(config)?;
            if let Some(addr) = api_addr {
                config.api.listen_addr = addr;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if in_memory {
                config.storage.backend = StorageBackend::Memory;
            }

            let level = config
                .log_level
                .parse::<Level>()
                .unwrap_or(Level::INFO);
            FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .init();

            info!("Starting Adrail node '{}'...", config.name);

            match config.storage.backend {
                StorageBackend::Memory => {
                    info!("Using in-memory state store");
                    let state = create_memory_store();
                    serve(config, state).await?;
                }
                StorageBackend::Sled => {
                    let path = config.data_dir.join(&config.storage.db_path);
                    info!("Using sled state store at {}", path.display());
                    std::fs::create_dir_all(&config.data_dir)?;
                    let state = create_persistent_store(&path)?;
                    serve(config, state).await?;
                }
            }
        }

        Commands::InitConfig { output } => {
            let config = NodeConfig::default();
            std::fs::write(&output, serde_json::to_string_pretty(&config)?)?;
            println!("Configuration written to: {}", output.display());
        }
    }

    Ok(())
}

async fn serve<S: adrail_state::StateStore + 'static>(
    config: NodeConfig,
    state: Arc<S>,
) -> anyhow::Result<()> {
    let listen_addr = config.api.listen_addr.clone();
    let runtime = Arc::new(NodeRuntime::new(config, state));
    start_api_server(runtime, &listen_addr).await
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<NodeConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(NodeConfig::default()),
    }
}
