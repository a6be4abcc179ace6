//! Error taxonomy for the game backend.
//!
//! `StoreError` covers collaborator and persistence failures; `GameError` is what
//! the engine hands to the transport layer. Store detail is logged, never sent.

use std::time::Duration;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("no {kind} available for destination {destination_id}")]
  MissingContent { kind: &'static str, destination_id: Uuid },

  #[error("store operation timed out after {0:?}")]
  Timeout(Duration),

  #[error("store unavailable: {0}")]
  Unavailable(String),
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }
}

#[derive(Debug, Error)]
pub enum GameError {
  #[error("{0}")]
  Validation(String),

  #[error("{entity} not found")]
  NotFound { entity: &'static str, id: String },

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error")]
  Store(#[source] StoreError),
}

impl GameError {
  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      GameError::Validation(_) => StatusCode::BAD_REQUEST,
      GameError::NotFound { .. } => StatusCode::NOT_FOUND,
      GameError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      GameError::Conflict(_) => StatusCode::CONFLICT,
      GameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<StoreError> for GameError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::NotFound { entity, id } => GameError::NotFound { entity, id },
      other => GameError::Store(other),
    }
  }
}

/// Malformed or incomplete request bodies are client errors, reported like any other validation failure.
impl From<JsonRejection> for GameError {
  fn from(rejection: JsonRejection) -> Self {
    GameError::Validation(rejection.body_text())
  }
}

impl IntoResponse for GameError {
  fn into_response(self) -> axum::response::Response {
    match &self {
      GameError::Store(inner) => error!(target: "globetrotter", error = %inner, "Request failed in store layer"),
      GameError::NotFound { entity, id } => debug!(target: "globetrotter", %entity, %id, "Requested entity not found"),
      _ => {}
    }
    let body = match &self {
      GameError::NotFound { entity, .. } => json!({ "error": format!("{} not found", capitalize(entity)) }),
      other => json!({ "error": other.to_string() }),
    };
    (self.status(), Json(body)).into_response()
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) => c.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
