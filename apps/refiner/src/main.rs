mod config;
mod document;
mod errors;
mod llm_client;
mod refine;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::refine::{LlmTransform, Pipeline};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Letter Refiner v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the pipeline. A missing key is reported now; the UI still
    // starts so the user sees the error instead of a dead page.
    let pipeline = match config.require_api_key() {
        Ok(api_key) => {
            let llm = LlmClient::new(api_key.to_string())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Pipeline::new(Arc::new(LlmTransform::new(llm))))
        }
        Err(e) => {
            error!("{e}. Uploads are accepted but letters cannot be refined.");
            None
        }
    };

    let state = AppState::new(config.clone(), pipeline);
    state.sessions.clone().start_cleanup_task();
    info!("Session cleanup enabled (ttl: {}s)", config.session_ttl_secs);

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port).parse()?;
    info!("Letter Refiner UI available at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
