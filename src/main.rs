use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sheets_api_rust::auth::TokenService;
use sheets_api_rust::config::AppConfig;
use sheets_api_rust::sheets::{GoogleSheetsBackend, SpreadsheetClient};
use sheets_api_rust::state::AppState;
use sheets_api_rust::types::ShareGrant;

#[derive(Parser, Debug)]
#[command(name = "sheets-api", version, about = "Authenticated HTTP API over Google Sheets")]
struct Cli {
    /// Port to listen on (overrides PORT / SHEETS_API_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind (overrides SHEETS_API_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Dotenv file to load before reading the environment
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env if present so cargo run picks up ADMIN_USERNAME, SECRET_KEY, etc.
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    tracing::info!("Starting Sheets API in {:?} mode", config.environment);
    tracing::debug!("{:?}", config);

    let backend = GoogleSheetsBackend::from_config(&config.sheets)
        .await
        .context("failed to initialise Google Sheets backend")?;
    let share = config.sheets.share_with_email.clone().map(|email| ShareGrant {
        email,
        role: config.sheets.share_role.clone(),
    });
    let sheets = SpreadsheetClient::new(Arc::new(backend), share);
    let tokens = TokenService::new(&config.auth);
    let state = AppState::new(tokens, sheets);

    let app = sheets_api_rust::app(state, &config.security.cors_origins);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Sheets API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
