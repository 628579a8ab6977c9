//! scriba-server - Audio transcription management backend
//!
//! Organizes uploaded audio into projects, folders and time-aligned
//! segments, tracks per-segment transcription/translation state, and
//! enforces role- and language-based access control.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use scriba_common::config::{ServerConfig, TomlConfig};
use scriba_server::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "scriba-server", version, about = "Audio transcription management backend")]
struct Cli {
    /// Address to bind, e.g. 127.0.0.1:5800
    #[arg(long)]
    bind: Option<String>,

    /// Root folder for the database and uploaded files
    #[arg(long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting scriba-server v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let toml_config = TomlConfig::load()?;
    let config = ServerConfig::resolve(cli.bind.as_deref(), cli.root_folder.as_deref(), &toml_config);

    config.ensure_directories()?;
    info!("Root folder: {}", config.root_folder.display());

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = scriba_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool, &config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
