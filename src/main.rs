use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventwatch::config::Config;
use eventwatch::scheduler::Watcher;

#[derive(Parser)]
#[command(
    name = "eventwatch",
    version,
    about = "Watches a game event feed and keeps scanner state in sync with event transitions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watcher loop
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Validate the configuration file and exit
    CheckConfig {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(&config)?;
            rust_i18n::set_locale(&config.watcher.language);

            tracing::info!(
                refresh_interval_secs = config.watcher.refresh_interval_secs,
                backend = %config.scanner.backend,
                "starting event watcher"
            );
            let watcher = Watcher::connect(config)
                .await
                .context("Failed to connect collaborators")?;
            watcher.run().await?;
        }

        Commands::CheckConfig { config } => {
            let path = config;
            let config = load_config(&path)?;
            println!("Configuration OK: {}", path.display());
            println!("  feed url:         {}", config.watcher.feed_url);
            println!("  refresh interval: {}s", config.watcher.refresh_interval_secs);
            println!("  scanner backend:  {}", config.scanner.backend);
            println!("  monster reset:    {}", config.monster_reset.enable);
            println!("  quest reset:      {}", config.quest_reset.enable);
            println!("  telegram:         {}", config.telegram.enable);
            println!("  discord:          {}", config.discord.enable);
        }
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let config = Config::from_file(path)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;
    Ok(config)
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("eventwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("eventwatch=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
