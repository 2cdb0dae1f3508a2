//! magnetkeeper - command-line magnet bookmarks and multi-source search.

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magnetkeeper_core::{load_config, load_config_from_env, validate_config, Config};

use app::App;

/// Environment variable naming the config file
const CONFIG_ENV: &str = "MAGNETKEEPER_CONFIG";

/// Config file picked up from the working directory when present
const DEFAULT_CONFIG_FILE: &str = "magnetkeeper.toml";

#[derive(Parser)]
#[command(name = "magnetkeeper")]
#[command(version, about = "Bookmark magnet links and search external sources")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = resolve_config(cli.config)?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Database path: {:?}", config.database.path);

    let app = App::open(config)?;
    let options = commands::Options {
        json: cli.json,
        yes: cli.yes,
    };
    commands::handle_command(&app, cli.command, options).await
}

/// `--config`, then `MAGNETKEEPER_CONFIG`, then `./magnetkeeper.toml` if it
/// exists, else defaults. Environment overrides apply in every case.
fn resolve_config(flag: Option<PathBuf>) -> Result<Config> {
    let explicit = flag.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
    let path = match explicit {
        Some(path) => path,
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !local.exists() {
                debug!("No config file, using defaults");
                return load_config_from_env().context("Failed to load configuration");
            }
            local
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}
