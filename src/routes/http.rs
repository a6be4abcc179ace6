//! HTTP endpoint handlers. These are thin wrappers that forward to request logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{FromRequest, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::GameError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `GameError::Validation` (400 with an `error` body).
#[derive(FromRequest)]
#[from_request(via(Json), rejection(GameError))]
pub struct ApiJson<T>(pub T);

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> Result<impl IntoResponse, GameError> {
  let out = logic::register(&state, body).await?;
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> Result<Json<CredentialsOut>, GameError> {
  Ok(Json(logic::login(&state, body).await?))
}

#[instrument(level = "info", skip(state), fields(challenge_id = q.challenge_id.as_deref().unwrap_or("")))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<QuestionOut>, GameError> {
  let out = logic::fetch_question(&state, q.challenge_id.as_deref(), q.username.as_deref()).await?;
  if let QuestionOut::Question(p) = &out {
    info!(target: "challenge", question_id = %p.question_id, "HTTP question served");
  }
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.question_id, city_len = body.city.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<AnswerIn>,
) -> Result<Json<AnswerOut>, GameError> {
  let out = logic::answer(&state, body).await?;
  info!(target: "challenge", correct = out.correct, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(username = body.username.as_deref().unwrap_or("")))]
pub async fn http_post_reveal_clue(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<RevealClueIn>,
) -> Result<Json<MessageOut>, GameError> {
  Ok(Json(logic::reveal_clue(&state, body.challenge_id.as_deref()).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.username))]
pub async fn http_create_challenge(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CreateChallengeIn>,
) -> Result<impl IntoResponse, GameError> {
  let out = logic::create_challenge(&state, &body.username).await?;
  info!(target: "challenge", id = %out.challenge_id, "HTTP challenge created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, GameError> {
  Ok(Json(logic::get_challenge(&state, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.challenge_id))]
pub async fn http_end_challenge(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<EndChallengeIn>,
) -> Result<Json<MessageOut>, GameError> {
  Ok(Json(logic::end_challenge(&state, body).await?))
}
