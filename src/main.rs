use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pokemon_trainer::{build_trainer, create_router, AppState, ServiceConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON config file (defaults to $POKEMON_TRAINER_CONFIG, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Serve from the built-in species table instead of PokéAPI
    #[arg(long)]
    offline: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServiceConfig> {
        let mut config = ServiceConfig::resolve(self.config.as_deref())?;
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.offline |= self.offline;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    log::info!("Starting pokemon trainer API server...");

    let state = Arc::new(AppState::new(build_trainer(&config)));
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    log::info!("Server is running on {}. Press Ctrl+C to stop.", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("Stopping server...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to install CTRL+C signal handler: {}", err);
    }
}
