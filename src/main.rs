//! Globetrotter · Geography Trivia Backend
//!
//! - Axum HTTP + WebSocket API
//! - Two-player asynchronous challenges with a shared question queue
//! - Static SPA fallback (<static_dir>/index.html)
//!
//! Important env variables:
//!   PORT                     : u16 (default 8080)
//!   GLOBETROTTER_CONFIG_PATH : path to TOML config (rules, store bounds, dataset path)
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

mod telemetry;
mod error;
mod domain;
mod config;
mod seeds;
mod catalog;
mod accounts;
mod store;
mod evaluator;
mod generator;
mod engine;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (catalog, stores, engine).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 8080.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "globetrotter", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "globetrotter", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "globetrotter", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
