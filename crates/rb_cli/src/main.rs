use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rb_core::Config;
use rb_scrapers::{handle_command, init_logging, ScraperCommands, ScraperManager};
use rb_web::AppState;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Blog catalogue scraper and article refresher", long_about = None)]
pub struct Cli {
    /// Article store backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// SQLite database file (defaults to DATABASE_PATH)
    #[arg(long)]
    db_path: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    #[command(flatten)]
    Scraper(ScraperCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let db_path = cli.db_path.unwrap_or_else(|| config.database_path.clone());
    let storage = rb_storage::create_storage(&cli.storage, &db_path).await?;
    info!("💾 Storage ready ({})", cli.storage);

    match cli.command {
        Commands::Serve { port } => {
            let manager = ScraperManager::from_config(&config, storage)?;
            rb_web::serve(AppState::new(manager), port.unwrap_or(config.port)).await?;
        }
        Commands::Scraper(command) => handle_command(command, &config, storage).await?,
    }
    Ok(())
}
