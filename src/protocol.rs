//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChallengeSession, FinalTally};
use crate::engine::QuestionOutcome;
use crate::error::GameError;
use crate::generator::QuestionPayload;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NextQuestion {
        #[serde(default)]
        challenge_id: Option<String>,
        #[serde(default)]
        username: Option<String>,
    },
    SubmitAnswer {
        #[serde(flatten)]
        answer: AnswerIn,
    },
    RevealClue {
        #[serde(default)]
        challenge_id: Option<String>,
    },
    CreateChallenge {
        username: String,
    },
    GetChallenge {
        challenge_id: String,
    },
    EndChallenge {
        #[serde(flatten)]
        end: EndChallengeIn,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        #[serde(flatten)]
        question: QuestionOut,
    },
    AnswerResult {
        #[serde(flatten)]
        result: AnswerOut,
    },
    ClueRevealed {
        message: String,
    },
    ChallengeCreated {
        #[serde(flatten)]
        created: CreateChallengeOut,
    },
    Challenge {
        challenge: SessionOut,
    },
    ChallengeEnded {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Parse a wire identifier; malformed ids are validation errors.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, GameError> {
    Uuid::parse_str(raw.trim()).map_err(|_| GameError::validation(format!("Invalid {what} ID")))
}

/// Optional identifier: absent or blank means "not given".
pub fn parse_optional_id(raw: Option<&str>, what: &str) -> Result<Option<Uuid>, GameError> {
    raw.filter(|s| !s.trim().is_empty()).map(|s| parse_id(s, what)).transpose()
}

//
// Questions
//

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    #[serde(default)]
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionPayloadOut {
    pub question_id: Uuid,
    pub clues: Vec<String>,
    pub choices: Vec<String>,
    pub trivia: String,
}

/// Either a playable question or a terminal message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuestionOut {
    Question(QuestionPayloadOut),
    Message(MessageOut),
}

pub fn question_out(outcome: QuestionOutcome) -> QuestionOut {
    match outcome {
        QuestionOutcome::Question(QuestionPayload { question_id, clues, choices, trivia }) => {
            QuestionOut::Question(QuestionPayloadOut { question_id, clues, choices, trivia })
        }
        other => QuestionOut::Message(MessageOut::new(other.message().unwrap_or_default())),
    }
}

//
// Answers and clues
//

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub question_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub city: String,
    #[serde(default)]
    pub challenge_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub fun_fact: String,
}

#[derive(Debug, Deserialize)]
pub struct RevealClueIn {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub challenge_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageOut {
    pub message: String,
}

impl MessageOut {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

//
// Challenges
//

#[derive(Debug, Deserialize)]
pub struct CreateChallengeIn {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CreateChallengeOut {
    pub challenge_id: Uuid,
    pub inviter: String,
    pub account_provisioned: bool,
}

#[derive(Debug, Deserialize)]
pub struct EndChallengeIn {
    pub challenge_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub incorrect_answers: u32,
    #[serde(default)]
    pub clues_revealed: u32,
    #[serde(default)]
    pub question_ids: Vec<String>,
}

impl EndChallengeIn {
    pub fn tally(&self) -> Result<FinalTally, GameError> {
        let question_ids = self
            .question_ids
            .iter()
            .map(|raw| parse_id(raw, "question"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FinalTally {
            score: self.score,
            correct_answers: self.correct_answers,
            incorrect_answers: self.incorrect_answers,
            clues_revealed: self.clues_revealed,
            question_ids,
        })
    }
}

/// Session snapshot as seen by clients.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: Uuid,
    pub inviter: String,
    pub score: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub clues_revealed: u32,
    pub is_active: bool,
    pub question_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

pub fn session_out(s: ChallengeSession) -> SessionOut {
    SessionOut {
        id: s.id,
        inviter: s.inviter,
        score: s.score,
        correct_answers: s.correct_answers,
        incorrect_answers: s.incorrect_answers,
        clues_revealed: s.clues_revealed,
        is_active: s.is_active,
        question_ids: s.question_ids,
        created_at: s.created_at,
        ended_at: s.ended_at,
    }
}

//
// Accounts
//

#[derive(Deserialize)]
pub struct CredentialsIn {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct CredentialsOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub username: String,
    pub auth_token: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
