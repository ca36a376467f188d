//! medexam server binary.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use medexam_api::{app, AppState};
use medexam_providers::{create_provider, load_config_from};
use medexam_store::Store;

#[derive(Parser)]
#[command(name = "medexam", version, about = "Exam assessment backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:8080", env = "MEDEXAM_ADDR")]
        addr: String,

        /// SQLite database path
        #[arg(long, default_value = "./medexam.db", env = "MEDEXAM_DB")]
        db: PathBuf,

        /// Config file path (defaults to medexam.toml / ~/.config/medexam)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create the database schema and exit
    InitDb {
        /// SQLite database path
        #[arg(long, default_value = "./medexam.db", env = "MEDEXAM_DB")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medexam=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { addr, db, config } => serve(&addr, &db, config.as_deref()).await,
        Commands::InitDb { db } => Store::open(&db).map(|_| {
            tracing::info!(db = %db.display(), "database initialized");
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn serve(
    addr: &str,
    db: &std::path::Path,
    config_path: Option<&std::path::Path>,
) -> Result<(), medexam_core::error::CoreError> {
    let store = Store::open(db)?;
    let config = load_config_from(config_path).map_err(medexam_core::error::CoreError::Internal)?;
    let generator =
        create_provider(&config.provider).map_err(medexam_core::error::CoreError::Internal)?;

    let state = AppState::new(store, generator);
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::Error::new(e).context("binding listener"))?;
    tracing::info!(%addr, db = %db.display(), "listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| anyhow::Error::new(e).context("serving"))?;
    Ok(())
}
