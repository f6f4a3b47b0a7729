use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use appshelf_core::HubClient;
use appshelf_http::AppShelf;

mod config;
use crate::config::{Config, Overrides};

#[derive(Parser)]
struct Cli {
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // load configuration
    let config = Config::load(cli.config_file.as_deref(), &cli.overrides)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();

    let client = HubClient::new(config.registry.clone())?;
    tracing::info!(
        "serving namespace {} from {}",
        client.config().namespace,
        client.config().hub_url,
    );

    let router = AppShelf::new(client).router()?;

    // run HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {addr}");
    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}
