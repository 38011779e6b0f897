//! # LexAdvisor
//!
//! Legal question answering grounded in a curated article corpus.
//!
//! Usage:
//!   lexadvisor serve                        # Start the HTTP API (default 127.0.0.1:8000)
//!   lexadvisor serve --host 0.0.0.0 --port 9000
//!   lexadvisor seed data/legal_data.json    # Replace the corpus from a JSON file
//!   lexadvisor seed extra.json --keep       # Add to the existing corpus
//!   lexadvisor search "How many days of annual leave do I get?"
//!   lexadvisor articles                     # Print the admin listing

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexadvisor_core::config::LexConfig;
use lexadvisor_knowledge::{LegalAdvisor, SqliteAnnexStore, SqliteArticleStore, seed};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lexadvisor",
    version,
    about = "⚖️ LexAdvisor: grounded answers from legal articles"
)]
struct Cli {
    /// Config file (default: $LEXADVISOR_CONFIG or ~/.lexadvisor/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Bind address (overrides [gateway] host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides [gateway] port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load articles and annexes from a JSON seed file
    Seed {
        file: PathBuf,
        /// Keep existing records instead of clearing both stores first
        #[arg(long)]
        keep: bool,
    },
    /// Answer one question and print the JSON response
    Search { query: String },
    /// List stored articles with their knowledge annex
    Articles,
}

fn load_config(path: Option<&PathBuf>) -> Result<LexConfig> {
    let config = match path {
        Some(p) => LexConfig::load_from(p)?,
        None => LexConfig::load()?,
    };
    Ok(config)
}

/// Open both stores and construct the encoder and generator.
///
/// Missing credentials fail here, before any request is served.
fn build_advisor(config: &LexConfig) -> Result<LegalAdvisor> {
    let db_path = config.storage.resolved_path();
    let articles = SqliteArticleStore::open(&db_path)
        .with_context(|| format!("opening article store at {}", db_path.display()))?;
    let annexes = SqliteAnnexStore::open(&db_path)
        .with_context(|| format!("opening knowledge annex store at {}", db_path.display()))?;
    tracing::info!(
        "💾 Knowledge DB: {} ({} articles)",
        db_path.display(),
        articles.count()?
    );

    let encoder = lexadvisor_providers::create_encoder(config)?;
    let generator = lexadvisor_providers::create_generator(config)?;

    Ok(LegalAdvisor::new(
        encoder,
        generator,
        Arc::new(articles),
        Arc::new(annexes),
        config,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "lexadvisor=debug,lexadvisor_knowledge=debug,lexadvisor_gateway=debug,lexadvisor_providers=debug,tower_http=debug"
    } else {
        "lexadvisor=info,lexadvisor_knowledge=info,lexadvisor_gateway=info,lexadvisor_providers=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let advisor = Arc::new(build_advisor(&config)?);
            lexadvisor_gateway::start(&config.gateway, advisor).await?;
        }
        Command::Seed { file, keep } => {
            let records = seed::load_seed_file(&file)?;
            let advisor = build_advisor(&config)?;
            let count = seed::seed(&advisor, records, !keep).await?;
            println!("✅ Seeded {count} articles from {}", file.display());
        }
        Command::Search { query } => {
            let advisor = build_advisor(&config)?;
            let response = advisor.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Articles => {
            let advisor = build_advisor(&config)?;
            let articles = advisor.list_articles().await?;
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
    }

    Ok(())
}
