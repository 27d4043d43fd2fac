//! Semcheck Server Binary
//!
//! OTLP gRPC receiver that reports semantic-convention violations.
//!
//! ## Usage
//!
//! ```bash
//! # config.yaml from the working directory, embedded model
//! semcheck-server
//!
//! # Explicit config and a model directory (one sub-directory per version)
//! semcheck-server --config checker.yaml --registry ./semconv
//!
//! # Override single settings through the environment
//! SEMCHECK_DISABLE_ERROR=true SEMCHECK_SERVER_ADDRESS=127.0.0.1:14317 semcheck-server
//! ```

use std::path::PathBuf;

use clap::Parser;
use semcheck_core::{CheckerConfig, GroupRegistry, RegistryLoader};
use semcheck_server::{ServerConfig, SemcheckServer, DEFAULT_MAX_MESSAGE_SIZE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "semcheck-server")]
#[command(about = "Check OTLP telemetry against OpenTelemetry semantic conventions")]
#[command(version)]
struct Args {
    /// Config file (default: config.yaml in the working directory, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Semantic-convention model directory, one sub-directory per version
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Version used when a rule names none or an unknown one
    #[arg(long)]
    default_version: Option<String>,

    /// Listen address, overriding server_address from the config
    #[arg(short, long)]
    address: Option<String>,

    /// Largest export request accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "semcheck_server=info,semcheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let registry = load_registry(&args)?;
    tracing::info!(
        versions = ?registry.versions(),
        default_version = %registry.default_version(),
        "semantic-convention registry loaded"
    );

    tracing::info!("Starting Semcheck Server v{}", env!("CARGO_PKG_VERSION"));

    let server = SemcheckServer::new(&config, &registry)?;
    let server_config = ServerConfig::builder()
        .address(server.addr())
        .max_message_size(args.max_message_size)
        .build();
    let server = server.with_config(server_config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

fn load_config(args: &Args) -> semcheck_core::Result<CheckerConfig> {
    let mut config = CheckerConfig::load(args.config.as_deref())?;
    if let Some(address) = &args.address {
        config.server_address = address.clone();
        config.validate()?;
    }
    Ok(config)
}

fn load_registry(args: &Args) -> semcheck_core::Result<GroupRegistry> {
    let mut loader = RegistryLoader::new();
    if let Some(version) = &args.default_version {
        loader = loader.with_default_version(version.clone());
    }

    if let Some(dir) = &args.registry {
        let versions = loader.load_directory(dir)?;
        tracing::info!("Loaded {} version(s) from {:?}", versions.len(), dir);
    }

    loader.build()
}
