//! Request-level behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - decoding wire identifiers and choosing solo vs challenge mode
//!   - forwarding to the challenge engine
//!   - shaping engine results into protocol DTOs

use tracing::{debug, instrument};

use crate::accounts;
use crate::error::GameError;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn fetch_question(
  state: &AppState,
  challenge_id: Option<&str>,
  username: Option<&str>,
) -> Result<QuestionOut, GameError> {
  let outcome = match challenge_id.filter(|s| !s.is_empty()) {
    Some(raw) => {
      let username = username.unwrap_or_default();
      if username.is_empty() {
        return Err(GameError::validation("Username is required for challenge mode"));
      }
      let id = parse_id(raw, "challenge")?;
      state.engine.next_question(id, username).await?
    }
    None => state.engine.solo_question().await?,
  };
  Ok(question_out(outcome))
}

#[instrument(level = "info", skip(state, body), fields(question_id = %body.question_id, username = body.username.as_deref().unwrap_or("")))]
pub async fn answer(state: &AppState, body: AnswerIn) -> Result<AnswerOut, GameError> {
  let question_id = parse_id(&body.question_id, "question")?;
  let challenge_id = parse_optional_id(body.challenge_id.as_deref(), "challenge")?;
  let verdict = state.engine.submit_answer(question_id, &body.city, challenge_id).await?;
  Ok(AnswerOut { correct: verdict.correct, fun_fact: verdict.fun_fact })
}

#[instrument(level = "info", skip(state))]
pub async fn reveal_clue(state: &AppState, challenge_id: Option<&str>) -> Result<MessageOut, GameError> {
  let challenge_id = parse_optional_id(challenge_id, "challenge")?;
  state.engine.reveal_clue(challenge_id).await?;
  Ok(MessageOut::new("Clue revealed"))
}

#[instrument(level = "info", skip(state))]
pub async fn create_challenge(state: &AppState, username: &str) -> Result<CreateChallengeOut, GameError> {
  let created = state.engine.create_session(username).await?;
  Ok(CreateChallengeOut {
    challenge_id: created.id,
    inviter: created.inviter,
    account_provisioned: created.account_provisioned,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn get_challenge(state: &AppState, raw_id: &str) -> Result<SessionOut, GameError> {
  let id = parse_id(raw_id, "challenge")?;
  let session = state.engine.get_session(id).await?;
  Ok(session_out(session))
}

#[instrument(level = "info", skip(state, body), fields(challenge_id = %body.challenge_id))]
pub async fn end_challenge(state: &AppState, body: EndChallengeIn) -> Result<MessageOut, GameError> {
  let id = parse_id(&body.challenge_id, "challenge")?;
  let tally = body.tally()?;
  let session = state.engine.end_session(id, tally).await?;
  debug!(target: "challenge", %id, score = session.score, by = body.username.as_deref().unwrap_or(""), "End request applied");
  Ok(MessageOut::new("Challenge ended successfully"))
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn register(state: &AppState, body: CredentialsIn) -> Result<CredentialsOut, GameError> {
  let c = accounts::register(state.engine.accounts(), &body.username, &body.password).await?;
  Ok(CredentialsOut {
    message: Some("User registered successfully".to_string()),
    username: c.username,
    auth_token: c.auth_token,
  })
}

#[instrument(level = "info", skip(state, body), fields(username = %body.username))]
pub async fn login(state: &AppState, body: CredentialsIn) -> Result<CredentialsOut, GameError> {
  let c = accounts::login(state.engine.accounts(), &body.username, &body.password).await?;
  Ok(CredentialsOut { message: None, username: c.username, auth_token: c.auth_token })
}
