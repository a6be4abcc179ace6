//! Domain models: destinations, questions, challenge sessions and the
//! participant role of a caller inside a session.
//!
//! State transitions of `ChallengeSession` live here so every store
//! implementation applies them identically inside its own atomic unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DestinationId = Uuid;
pub type QuestionId = Uuid;
pub type ChallengeId = Uuid;

/// Immutable reference data: a city the player has to guess.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
  pub id: DestinationId,
  pub city: String,
  pub country: String,
}

/// One play instance bound to a destination. Never mutated, never deleted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub id: QuestionId,
  pub destination_id: DestinationId,
  pub created_at: DateTime<Utc>,
}

impl Question {
  pub fn new(destination_id: DestinationId) -> Self {
    Self { id: Uuid::new_v4(), destination_id, created_at: Utc::now() }
  }
}

/// Which side of a challenge the caller is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
  /// Created the session; the only role allowed to fill its question queue.
  Inviter,
  /// Anyone else joining through the shared link.
  Guest,
}

impl Participant {
  /// Resolve the role once, at the point the caller joins a request.
  pub fn resolve(session: &ChallengeSession, username: &str) -> Self {
    if session.inviter == username { Participant::Inviter } else { Participant::Guest }
  }

  pub fn may_populate(self) -> bool {
    matches!(self, Participant::Inviter)
  }
}

/// Final tallies reported by the client when a challenge ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalTally {
  pub score: u32,
  pub correct_answers: u32,
  pub incorrect_answers: u32,
  pub clues_revealed: u32,
  pub question_ids: Vec<QuestionId>,
}

/// Shared two-player game instance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeSession {
  pub id: ChallengeId,
  pub inviter: String,
  pub score: u32,
  pub correct_answers: u32,
  pub incorrect_answers: u32,
  pub clues_revealed: u32,
  pub is_active: bool,
  /// Questions not yet answered, in serving order.
  pub question_ids: Vec<QuestionId>,
  pub created_at: DateTime<Utc>,
  #[serde(default)] pub ended_at: Option<DateTime<Utc>>,
}

impl ChallengeSession {
  /// Sessions start active with an empty queue and zeroed counters.
  pub fn new(inviter: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      inviter: inviter.into(),
      score: 0,
      correct_answers: 0,
      incorrect_answers: 0,
      clues_revealed: 0,
      is_active: true,
      question_ids: Vec::new(),
      created_at: Utc::now(),
      ended_at: None,
    }
  }

  /// Head of the queue; peeked, never popped.
  pub fn current_question(&self) -> Option<QuestionId> {
    self.question_ids.first().copied()
  }

  /// Append a batch only while the queue is empty. Returns whether it was applied.
  pub fn populate_if_empty(&mut self, batch: &[QuestionId]) -> bool {
    if !self.question_ids.is_empty() {
      return false;
    }
    for id in batch {
      if !self.question_ids.contains(id) {
        self.question_ids.push(*id);
      }
    }
    true
  }

  /// Score one answer and drop that question from the queue by value.
  pub fn apply_answer(&mut self, question_id: QuestionId, correct: bool, points: u32) {
    if correct {
      self.score = self.score.saturating_add(points);
      self.correct_answers = self.correct_answers.saturating_add(1);
    } else {
      self.incorrect_answers = self.incorrect_answers.saturating_add(1);
    }
    self.question_ids.retain(|id| *id != question_id);
  }

  /// One more revealed clue; the score never drops below zero.
  pub fn apply_clue_penalty(&mut self, penalty: u32) {
    self.clues_revealed = self.clues_revealed.saturating_add(1);
    self.score = self.score.saturating_sub(penalty);
  }

  /// Overwrite tallies with the client's final numbers and close the session.
  pub fn finalize(&mut self, tally: FinalTally, ended_at: DateTime<Utc>) {
    self.score = tally.score;
    self.correct_answers = tally.correct_answers;
    self.incorrect_answers = tally.incorrect_answers;
    self.clues_revealed = tally.clues_revealed;
    self.question_ids = tally.question_ids;
    self.is_active = false;
    self.ended_at = Some(ended_at);
  }

  /// Reopen for rejoining. The end timestamp is kept.
  pub fn reactivate(&mut self) -> bool {
    let changed = !self.is_active;
    self.is_active = true;
    changed
  }
}
