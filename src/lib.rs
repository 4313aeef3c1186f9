pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use config::DEFAULT_JWT_SECRET;
use db::Store;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    init_tracing(&config);

    match cli.command() {
        Commands::Serve => run_server(config).await,
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml");
            } else {
                println!("config.toml already exists, leaving it untouched");
            }
            Ok(())
        }
        Commands::HashPassword { password } => {
            let hash = db::hash_password(&password, Some(&config.security))?;
            println!("{hash}");
            Ok(())
        }
        Commands::Migrate => {
            Store::with_pool_options(&config.general.database_path, 1, 1).await?;
            println!("Migrations applied to {}", config.general.database_path);
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    if config.security.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("security.jwt_secret is the built-in default; set HRDESK_JWT_SECRET in production");
    }

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    info!("hrdesk v{} starting...", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_addr()?;
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web API listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
