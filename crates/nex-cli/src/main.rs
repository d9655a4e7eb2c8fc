mod config;
mod error;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nex_core::{NORMAL_FLOOR, OBFUSCATION_KEY_HEX, Tier, format_value, parse_value, transform};
use nex_store::decode_token;

use crate::config::ServeConfig;

#[derive(Parser)]
#[command(name = "nexhub", version, about = "Tiered ingestion service and tooling")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen port (overrides PORT and the config file)
        #[arg(long)]
        port: Option<u16>,

        /// TOML config file (overrides NEXHUB_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Obfuscate a job token with the built-in key
    Encode {
        text: String,
    },

    /// Recover a job token obfuscated with the built-in key
    Decode {
        token: String,
    },

    /// Render a magnitude as an abbreviated string
    Format {
        magnitude: f64,
    },

    /// Parse an abbreviated string such as "12.3M/s" into a magnitude
    Parse {
        display: String,
    },

    /// Show which tier a magnitude would be filed under
    Classify {
        magnitude: f64,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { port, config } => cmd_serve(port, config).await,
        Commands::Encode { text } => cmd_encode(&text),
        Commands::Decode { token } => cmd_decode(&token),
        Commands::Format { magnitude } => {
            println!("{}", format_value(magnitude));
            Ok(())
        }
        Commands::Parse { display } => {
            println!("{}", parse_value(&display));
            Ok(())
        }
        Commands::Classify { magnitude } => {
            match Tier::classify(magnitude) {
                Some(tier) => println!("{tier}"),
                None => println!("rejected (below {NORMAL_FLOOR})"),
            }
            Ok(())
        }
    }
}

async fn cmd_serve(port: Option<u16>, config: Option<PathBuf>) -> Result<()> {
    let config = ServeConfig::load(port, config.as_deref()).context("failed to load config")?;
    tracing::info!(
        port = config.port,
        tier_capacity = config.store.tier_capacity,
        retention_secs = config.sweeper.retention_secs,
        "starting nexhub"
    );
    server::serve(config).await
}

fn cmd_encode(text: &str) -> Result<()> {
    let encoded = transform(text, OBFUSCATION_KEY_HEX).context("built-in key is empty")?;
    println!("{encoded}");
    Ok(())
}

fn cmd_decode(token: &str) -> Result<()> {
    let decoded = decode_token(token.trim(), OBFUSCATION_KEY_HEX).context("failed to decode token")?;
    println!("{decoded}");
    Ok(())
}
