//! Challenge session store: questions and sessions behind an async interface.
//!
//! `MemoryStore` owns:
//!   - questions by id (append-only)
//!   - challenge sessions by id
//!
//! Each mutating call takes the write guard once, applies the change through
//! `ChallengeSession`'s transition methods and releases it. There is no await
//! between read and write, so a mutation is either fully applied or not at all,
//! even if the calling request is dropped mid-flight.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{ChallengeId, ChallengeSession, DestinationId, FinalTally, Question, QuestionId};
use crate::error::StoreError;

/// Result of a conditional queue fill.
#[derive(Clone, Debug)]
pub struct QueueFill {
  /// False when another request filled the queue first.
  pub applied: bool,
  pub session: ChallengeSession,
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
  /// Persist a new question bound to `destination_id`.
  async fn insert_question(&self, destination_id: DestinationId) -> Result<Question, StoreError>;

  async fn question(&self, id: QuestionId) -> Result<Question, StoreError>;

  async fn insert_session(&self, session: ChallengeSession) -> Result<(), StoreError>;

  async fn session(&self, id: ChallengeId) -> Result<ChallengeSession, StoreError>;

  /// Append `question_ids` only if the queue is still empty, as one atomic step.
  async fn populate_queue_if_empty(&self, id: ChallengeId, question_ids: &[QuestionId]) -> Result<QueueFill, StoreError>;

  /// Score an answer and remove the question from the queue, as one atomic step.
  async fn record_answer(
    &self,
    id: ChallengeId,
    question_id: QuestionId,
    correct: bool,
    points: u32,
  ) -> Result<ChallengeSession, StoreError>;

  /// Single-statement clue reveal: counter up, score down (floored at zero).
  async fn reveal_clue(&self, id: ChallengeId, penalty: u32) -> Result<ChallengeSession, StoreError>;

  async fn finalize(&self, id: ChallengeId, tally: FinalTally, ended_at: DateTime<Utc>) -> Result<ChallengeSession, StoreError>;

  /// Flip `is_active` back on. Returns whether anything changed.
  async fn reactivate(&self, id: ChallengeId) -> Result<bool, StoreError>;
}

/// Bound a store call by `limit`; the inner future is dropped on expiry.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
  F: Future<Output = Result<T, StoreError>>,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(res) => res,
    Err(_) => Err(StoreError::Timeout(limit)),
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  questions: Arc<RwLock<HashMap<QuestionId, Question>>>,
  sessions: Arc<RwLock<HashMap<ChallengeId, ChallengeSession>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  async fn mutate<R: Send>(
    &self,
    id: ChallengeId,
    f: impl FnOnce(&mut ChallengeSession) -> R + Send,
  ) -> Result<(R, ChallengeSession), StoreError> {
    let mut sessions = self.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| StoreError::not_found("challenge", id))?;
    let out = f(session);
    Ok((out, session.clone()))
  }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
  #[instrument(level = "debug", skip(self))]
  async fn insert_question(&self, destination_id: DestinationId) -> Result<Question, StoreError> {
    let q = Question::new(destination_id);
    self.questions.write().await.insert(q.id, q.clone());
    Ok(q)
  }

  async fn question(&self, id: QuestionId) -> Result<Question, StoreError> {
    self.questions.read().await.get(&id).cloned().ok_or_else(|| StoreError::not_found("question", id))
  }

  async fn insert_session(&self, session: ChallengeSession) -> Result<(), StoreError> {
    self.sessions.write().await.insert(session.id, session);
    Ok(())
  }

  async fn session(&self, id: ChallengeId) -> Result<ChallengeSession, StoreError> {
    self.sessions.read().await.get(&id).cloned().ok_or_else(|| StoreError::not_found("challenge", id))
  }

  #[instrument(level = "debug", skip(self, question_ids), fields(%id, batch = question_ids.len()))]
  async fn populate_queue_if_empty(&self, id: ChallengeId, question_ids: &[QuestionId]) -> Result<QueueFill, StoreError> {
    let (applied, session) = self.mutate(id, |s| s.populate_if_empty(question_ids)).await?;
    debug!(target: "challenge", %id, applied, queue = session.question_ids.len(), "Conditional queue fill");
    Ok(QueueFill { applied, session })
  }

  #[instrument(level = "debug", skip(self), fields(%id, %question_id))]
  async fn record_answer(
    &self,
    id: ChallengeId,
    question_id: QuestionId,
    correct: bool,
    points: u32,
  ) -> Result<ChallengeSession, StoreError> {
    let ((), session) = self.mutate(id, |s| s.apply_answer(question_id, correct, points)).await?;
    Ok(session)
  }

  async fn reveal_clue(&self, id: ChallengeId, penalty: u32) -> Result<ChallengeSession, StoreError> {
    let ((), session) = self.mutate(id, |s| s.apply_clue_penalty(penalty)).await?;
    Ok(session)
  }

  async fn finalize(&self, id: ChallengeId, tally: FinalTally, ended_at: DateTime<Utc>) -> Result<ChallengeSession, StoreError> {
    let ((), session) = self.mutate(id, move |s| s.finalize(tally, ended_at)).await?;
    Ok(session)
  }

  async fn reactivate(&self, id: ChallengeId) -> Result<bool, StoreError> {
    let (changed, _) = self.mutate(id, |s| s.reactivate()).await?;
    Ok(changed)
  }
}
