//! Ecopulse CLI
//!
//! Admin tool and web server runner.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ecopulse_api::{create_router, AppState};
use ecopulse_fetcher::FetcherConfig;
use ecopulse_refresh::{refresh_metadata, run_refresh};
use ecopulse_scoring::ScoreConfig;
use ecopulse_store::{keys, HealthScore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ecopulse")]
#[command(about = "Ecopulse - Ecosystem Health Dashboard")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },

    /// Run one full refresh of all sources
    Refresh,

    /// Show metadata of the most recent refresh
    Status,

    /// Show the latest health score breakdown
    Score,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let store = Store::from_env();

    match cli.command {
        Commands::Serve { bind } => {
            serve(store, bind).await?;
        }
        Commands::Refresh => {
            refresh(&store).await;
        }
        Commands::Status => {
            status(&store).await;
        }
        Commands::Score => {
            score(&store).await;
        }
    }

    Ok(())
}

async fn serve(store: Store, bind: SocketAddr) -> Result<()> {
    let state = Arc::new(AppState::new(store));
    let router = create_router(state);

    info!("Starting Ecopulse server on {}", bind);
    info!("API available at http://{}/api/v1", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn refresh(store: &Store) {
    let config = FetcherConfig::default();

    if config.issues.token.is_none() {
        eprintln!("Warning: GITHUB_TOKEN not set. API rate limits will be restricted.");
    }

    println!("Running refresh...");
    let outcome = run_refresh(store, &config, &ScoreConfig::default()).await;

    println!("\nStatus: {} ({} ms)", outcome.status, outcome.duration_ms);
    for error in &outcome.errors {
        eprintln!("  {}: {}", error.source, error.error);
    }
}

async fn status(store: &Store) {
    let metadata = refresh_metadata(store).await;

    let fmt = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
    };

    println!("Last attempt: {}", fmt(metadata.last_attempt));
    println!("Last success: {}", fmt(metadata.last_success));
    println!(
        "Last status:  {}",
        metadata
            .last_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    if !metadata.last_errors.is_empty() {
        println!("\nErrors from last run:");
        for error in &metadata.last_errors {
            println!("  [{}] {}: {}", error.timestamp, error.source, error.error);
        }
    }
}

async fn score(store: &Store) {
    let Some(score) = store.get::<HealthScore>(keys::HEALTH_SCORE).await else {
        println!("No health score available yet. Run 'ecopulse refresh' first.");
        return;
    };

    println!("Overall Health Score: {}", score.overall);
    println!("Calculated: {}", score.calculated_at);
    println!();

    let c = &score.components;
    println!(
        "  Responsiveness:      {:>3}  (weight {:.2})  {}",
        c.responsiveness.score, c.responsiveness.weight, c.responsiveness.description
    );
    println!(
        "  Closure Ratio:       {:>3}  (weight {:.2})  {}",
        c.closure_ratio.score, c.closure_ratio.weight, c.closure_ratio.description
    );
    println!(
        "  Community Sentiment: {:>3}  (weight {:.2})  {}",
        c.community_sentiment.score, c.community_sentiment.weight, c.community_sentiment.description
    );
    println!(
        "  Complaint Severity:  {:>3}  (weight {:.2})  {}",
        c.complaint_severity.score, c.complaint_severity.weight, c.complaint_severity.description
    );
}
