mod advisor;
mod client;
mod config;
mod errors;
mod flow;
mod gateway;
mod llm_client;
mod profile;
mod routes;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::AiGateway;
use crate::llm_client::LlmClient;
use crate::profile::store::JsonFileStore;
use crate::routes::build_router;
use crate::state::AppState;

/// Pathway: AI-guided study abroad advisor
#[derive(Parser, Debug)]
#[command(name = "pathway")]
#[command(about = "AI-guided study abroad advisor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Answer the questionnaire in the terminal against a running API
    Questionnaire {
        /// Base URL of the Pathway API
        #[arg(long, env = "PATHWAY_BASE_URL", default_value = "http://localhost:5000")]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Questionnaire { base_url } => {
            init_tracing("warn");
            client::terminal::run(&base_url).await
        }
    }
}

async fn serve() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    init_tracing(&config.rust_log);
    info!("Starting Pathway API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize profile store
    let store = JsonFileStore::open(&config.profile_store_path)?;
    info!("Profile store opened at {}", store.path().display());

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    let policy = config.retry_policy();
    info!(
        "AI gateway: {} attempts, {}ms backoff step",
        policy.max_attempts,
        policy.base_delay.as_millis()
    );

    // Build app state
    let state = AppState {
        store: Arc::new(store),
        gateway: AiGateway::new(Arc::new(llm), policy),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Structured logging; `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
