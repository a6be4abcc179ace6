//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to request logic. We reply with a single JSON message per request;
//! nothing is ever pushed unprompted.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::GameError;
use crate::logic;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "globetrotter", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "globetrotter", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "globetrotter", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "globetrotter", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "globetrotter", "WebSocket disconnected");
}

fn error_reply(e: GameError) -> ServerWsMessage {
  if let GameError::Store(inner) = &e {
    error!(target: "globetrotter", error = %inner, "WS request failed in store layer");
  }
  ServerWsMessage::Error { message: e.to_string() }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let reply = match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),

    ClientWsMessage::NextQuestion { challenge_id, username } =>
      logic::fetch_question(state, challenge_id.as_deref(), username.as_deref())
        .await
        .map(|question| ServerWsMessage::Question { question }),

    ClientWsMessage::SubmitAnswer { answer } =>
      logic::answer(state, answer).await.map(|result| {
        info!(target: "challenge", correct = result.correct, "WS submit_answer evaluated");
        ServerWsMessage::AnswerResult { result }
      }),

    ClientWsMessage::RevealClue { challenge_id } =>
      logic::reveal_clue(state, challenge_id.as_deref()).await.map(|m| ServerWsMessage::ClueRevealed { message: m.message }),

    ClientWsMessage::CreateChallenge { username } =>
      logic::create_challenge(state, &username).await.map(|created| ServerWsMessage::ChallengeCreated { created }),

    ClientWsMessage::GetChallenge { challenge_id } =>
      logic::get_challenge(state, &challenge_id).await.map(|challenge| ServerWsMessage::Challenge { challenge }),

    ClientWsMessage::EndChallenge { end } =>
      logic::end_challenge(state, end).await.map(|m| ServerWsMessage::ChallengeEnded { message: m.message }),
  };
  reply.unwrap_or_else(error_reply)
}
