use anyhow::Context;
use clap::Parser;
use puglands_server::{Api, Config, Service, Store};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the configured ledger storage directory.
    #[arg(short, long)]
    directory: Option<String>,

    /// Override the configured admin public key (hex).
    #[arg(short, long)]
    admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args and merge overrides into the config
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            serde_yaml::from_str::<Config>(&raw).context("could not parse config file")?
        }
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(directory) = args.directory {
        config.directory = Some(directory);
    }
    if let Some(admin) = args.admin {
        config.admin_public_key = Some(admin);
    }
    let config = config.validate().context("invalid configuration")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // Open the ledger
    let store = match &config.directory {
        Some(directory) => {
            Store::open(directory.clone()).context("failed to open ledger store")?
        }
        None => {
            warn!("no storage directory configured, state is ephemeral");
            Store::ephemeral()
        }
    };
    if config.admin.is_none() {
        info!("no admin key configured, privileged instructions are disabled");
    }

    let service = Arc::new(Service::new(config.admin.clone(), store));
    let api = Api::new(service);
    let app = api.router();

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("axum server error")?;

    Ok(())
}
