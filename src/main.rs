// Marketplace harvester CLI
//
// Discovers extensions from the marketplace listing into a SQLite store and
// snapshots stored extensions to disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marketscrape::utils::{DEFAULT_DATABASE_PATH, DEFAULT_LISTING_URL};
use marketscrape::{
    ExtensionStore, HarvestConfig, NoOpProgress, SqliteExtensionStore, harvest_listings,
    rescrape_with_browser,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "marketscrape", version, about = "Harvest marketplace extension metadata")]
struct Cli {
    /// SQLite database file (falls back to MARKETSCRAPE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Explore the listing under every sort mode and store new extensions
    Discover {
        /// Listing URL to explore
        #[arg(long, default_value = DEFAULT_LISTING_URL)]
        listing_url: String,

        /// Detail pages fetched per wave
        #[arg(long)]
        concurrency: Option<usize>,

        /// Scroll cycles per sort mode
        #[arg(long)]
        max_scrolls: Option<u32>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
    /// Save an HTML snapshot of every stored extension not yet saved locally
    Rescrape {
        /// Root folder for snapshots
        save_dir: PathBuf,

        /// Snapshots taken per wave
        #[arg(long)]
        concurrency: Option<usize>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
    /// Print stored and materialized counts
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,chromiumoxide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let db_path = cli
        .db
        .or_else(|| std::env::var_os("MARKETSCRAPE_DB").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

    match cli.command {
        Command::Discover {
            listing_url,
            concurrency,
            max_scrolls,
            headed,
        } => {
            let mut builder = HarvestConfig::builder()
                .database_path(db_path)
                .listing_url(listing_url)
                .headless(!headed);
            if let Some(limit) = concurrency {
                builder = builder.detail_concurrency(limit);
            }
            if let Some(scrolls) = max_scrolls {
                builder = builder.max_scrolls(scrolls);
            }
            let config = builder.build().context("Invalid configuration")?;

            let store = open_store(&config).await?;
            let result = harvest_listings(&config, &store, &NoOpProgress).await;
            store.close().await;
            let report = result?;

            let outcome = report.outcome();
            for mode in &report.modes {
                tracing::info!(
                    "{}: {} scrolls, {} URLs, {} stored, {} failed ({:?})",
                    mode.mode,
                    mode.scrolls,
                    mode.discovered,
                    mode.outcome.succeeded,
                    mode.outcome.failed,
                    mode.termination
                );
            }
            println!(
                "Processed {} extensions ({} succeeded, {} failed) in {:.1}s",
                report.total_processed,
                outcome.succeeded,
                outcome.failed,
                report.elapsed.as_secs_f64()
            );
        }
        Command::Rescrape {
            save_dir,
            concurrency,
            headed,
        } => {
            let mut builder = HarvestConfig::builder()
                .database_path(db_path)
                .listing_url(DEFAULT_LISTING_URL)
                .save_dir(save_dir)
                .headless(!headed);
            if let Some(limit) = concurrency {
                builder = builder.materialize_concurrency(limit);
            }
            let config = builder.build().context("Invalid configuration")?;

            let store = open_store(&config).await?;
            let result = rescrape_with_browser(&config, &store, &NoOpProgress).await;
            store.close().await;
            let report = result?;

            println!(
                "Saved {} of {} extensions ({} failed, {}% success rate)",
                report.processed,
                report.total,
                report.failed,
                report.success_rate()
            );
        }
        Command::Stats => {
            let config = HarvestConfig::builder()
                .database_path(db_path)
                .listing_url(DEFAULT_LISTING_URL)
                .build()
                .context("Invalid configuration")?;

            let store = open_store(&config).await?;
            let result = store.stats().await;
            store.close().await;
            let stats = result.context("Failed to read store statistics")?;

            println!(
                "{} extensions stored, {} saved locally, {} pending",
                stats.total,
                stats.materialized,
                stats.pending()
            );
        }
    }

    Ok(())
}

async fn open_store(config: &HarvestConfig) -> Result<SqliteExtensionStore> {
    SqliteExtensionStore::open(config.database_path(), config.max_store_connections())
        .await
        .with_context(|| format!("Failed to open {}", config.database_path().display()))
}
