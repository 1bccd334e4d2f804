//! IntelliLearn · Multi-Agent Tutor Backend
//!
//! - Axum HTTP API (upload → quiz → submit, difficulty adapting per round)
//! - Optional NVIDIA NIM integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 8000)
//!   NIM_API_KEY         : enables the LLM integration if present
//!   NIM_BASE_URL        : default "https://integrate.api.nvidia.com/v1"
//!   NIM_MODEL           : default "meta/llama-3.1-405b-instruct"
//!   NIM_TIMEOUT_SECS    : default 30
//!   TRANSCRIPT_API_URL  : enables YouTube transcript ingestion
//!   AGENT_CONFIG_PATH   : path to TOML config (prompt overrides)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod store;
mod state;
mod llm;
mod extract;
mod workflow;
mod resources;
mod transcript;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (session store, LLM client, prompts).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 8000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "intellilearn_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
