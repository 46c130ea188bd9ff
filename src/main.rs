use std::path::PathBuf;

use anyhow::anyhow;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use waav_controllers::{
    AppState, ControllerLoader, ServerConfig, controllers::HealthController, register_controller,
};

register_controller!("builtin/controllers/health", class: HealthController);

/// WaaV Controllers - serves the routes of every registered controller module
#[derive(Parser, Debug)]
#[command(name = "waav-controllers")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let address = config.address();
    let app_state = AppState::new(config);

    let mut loader = ControllerLoader::new(app_state.clone());
    loader.attach(Router::new());
    let report = loader.load_all().await;

    for failure in &report.failures {
        tracing::warn!(
            module = %failure.module,
            stage = %failure.stage,
            error = %failure.error,
            "Controller module not fully loaded"
        );
    }

    let app = loader
        .into_router()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(&address).await?;
    info!(
        "Server listening on {} ({} controllers, {} routes)",
        address,
        report.controllers.len(),
        report.route_count()
    );

    axum::serve(listener, app).await?;

    Ok(())
}
