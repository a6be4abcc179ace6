//! Challenge session engine: the operations behind both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - creating sessions (with explicit account provisioning)
//!   - serving questions, solo or from a session's shared queue
//!   - evaluating answers and scoring them against a session
//!   - clue-reveal penalties, finalization and snapshot reads
//!
//! Collaborators are injected as trait objects so tests can swap in fakes.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::accounts::{self, AccountStore};
use crate::catalog::Catalog;
use crate::config::{GameConfig, GameRules};
use crate::domain::{ChallengeId, ChallengeSession, FinalTally, Participant, QuestionId};
use crate::error::{GameError, StoreError};
use crate::evaluator::is_correct;
use crate::generator::{QuestionGenerator, QuestionPayload};
use crate::store::{bounded, ChallengeStore};

/// What a question request produced. The two exhausted variants are successes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionOutcome {
  Question(QuestionPayload),
  /// A guest found the shared queue empty.
  ChallengeComplete,
  /// Nothing could be generated (e.g. empty catalog).
  NoQuestions,
}

impl QuestionOutcome {
  pub fn message(&self) -> Option<&'static str> {
    match self {
      QuestionOutcome::Question(_) => None,
      QuestionOutcome::ChallengeComplete => Some("Challenge complete! No more questions available."),
      QuestionOutcome::NoQuestions => Some("No questions available for this challenge"),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerVerdict {
  pub correct: bool,
  pub fun_fact: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedSession {
  pub id: ChallengeId,
  pub inviter: String,
  /// True when the inviter had no account and a placeholder was created.
  pub account_provisioned: bool,
}

#[derive(Clone)]
pub struct ChallengeEngine {
  catalog: Arc<dyn Catalog>,
  store: Arc<dyn ChallengeStore>,
  accounts: Arc<dyn AccountStore>,
  generator: QuestionGenerator,
  rules: GameRules,
  limit: Duration,
}

impl ChallengeEngine {
  pub fn new(
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ChallengeStore>,
    accounts: Arc<dyn AccountStore>,
    config: &GameConfig,
  ) -> Self {
    let limit = config.store.timeout();
    let generator = QuestionGenerator::new(catalog.clone(), store.clone(), config.rules.clone(), limit);
    Self { catalog, store, accounts, generator, rules: config.rules.clone(), limit }
  }

  pub fn accounts(&self) -> &dyn AccountStore {
    self.accounts.as_ref()
  }

  /// Provision `username` if unknown. Returns whether an account was created.
  pub async fn ensure_account_exists(&self, username: &str) -> Result<bool, GameError> {
    accounts::ensure_account_exists(self.accounts.as_ref(), username).await
  }

  #[instrument(level = "info", skip(self), fields(%username))]
  pub async fn create_session(&self, username: &str) -> Result<CreatedSession, GameError> {
    if username.is_empty() {
      return Err(GameError::validation("username is required"));
    }
    let account_provisioned = self.ensure_account_exists(username).await?;
    let session = ChallengeSession::new(username);
    let id = session.id;
    bounded(self.limit, self.store.insert_session(session)).await.map_err(|e| {
      error!(target: "challenge", %username, error = %e, "Failed to create challenge");
      e
    })?;
    info!(target: "challenge", %id, %username, account_provisioned, "Challenge created");
    Ok(CreatedSession { id, inviter: username.to_string(), account_provisioned })
  }

  /// Solo play: fresh destination, fresh question, full payload.
  #[instrument(level = "info", skip(self))]
  pub async fn solo_question(&self) -> Result<QuestionOutcome, GameError> {
    let drawn = bounded(self.limit, self.catalog.random_destinations(1)).await?;
    let Some(destination_id) = drawn.first().copied() else {
      warn!(target: "challenge", "Catalog is empty; no solo question");
      return Ok(QuestionOutcome::NoQuestions);
    };
    let payload = self.generator.generate(destination_id).await?;
    Ok(QuestionOutcome::Question(payload))
  }

  /// Serve the head of a session's queue, filling it first if the inviter finds it empty.
  #[instrument(level = "info", skip(self), fields(%session_id, %username))]
  pub async fn next_question(&self, session_id: ChallengeId, username: &str) -> Result<QuestionOutcome, GameError> {
    if username.is_empty() {
      return Err(GameError::validation("Username is required for challenge mode"));
    }
    let mut session = bounded(self.limit, self.store.session(session_id)).await?;
    let role = Participant::resolve(&session, username);

    if session.question_ids.is_empty() {
      if !role.may_populate() {
        info!(target: "challenge", %session_id, %username, "Guest reached an empty queue");
        return Ok(QuestionOutcome::ChallengeComplete);
      }
      session = self.populate_queue(session_id).await?;
    }

    let Some(question_id) = session.current_question() else {
      warn!(target: "challenge", %session_id, "No questions available after population");
      return Ok(QuestionOutcome::NoQuestions);
    };

    let question = bounded(self.limit, self.store.question(question_id)).await.map_err(|e| {
      error!(target: "challenge", %session_id, %question_id, error = %e, "Queued question cannot be resolved");
      e
    })?;
    let payload = self.generator.build_payload(question.id, question.destination_id).await?;
    info!(target: "challenge", %session_id, %question_id, ?role, remaining = session.question_ids.len(), "Challenge question served");
    Ok(QuestionOutcome::Question(payload))
  }

  /// Draw a batch, link questions, then fill the queue only if it is still empty.
  /// When another request won the race its batch stands and ours is left unqueued.
  async fn populate_queue(&self, session_id: ChallengeId) -> Result<ChallengeSession, GameError> {
    let destinations = bounded(self.limit, self.catalog.random_destinations(self.rules.questions_per_challenge)).await?;
    let mut batch: Vec<QuestionId> = Vec::with_capacity(destinations.len());
    for destination_id in destinations {
      let q = self.generator.link(destination_id).await.map_err(|e| {
        error!(target: "challenge", %session_id, %destination_id, error = %e, "Failed to create question");
        e
      })?;
      batch.push(q.id);
    }
    let fill = bounded(self.limit, self.store.populate_queue_if_empty(session_id, &batch)).await?;
    if fill.applied {
      info!(target: "challenge", %session_id, queued = fill.session.question_ids.len(), "Inviter populated challenge queue");
    } else {
      warn!(target: "challenge", %session_id, "Queue already populated by a concurrent request; discarding batch");
    }
    Ok(fill.session)
  }

  /// Evaluate an answer and, when challenge-scoped, score it in one atomic store step.
  #[instrument(level = "info", skip(self, submitted_city), fields(%question_id, city_len = submitted_city.len()))]
  pub async fn submit_answer(
    &self,
    question_id: QuestionId,
    submitted_city: &str,
    challenge_id: Option<ChallengeId>,
  ) -> Result<AnswerVerdict, GameError> {
    if submitted_city.is_empty() {
      return Err(GameError::validation("city is required"));
    }
    let question = bounded(self.limit, self.store.question(question_id)).await?;
    let canonical = bounded(self.limit, self.catalog.city(question.destination_id)).await?;
    let correct = is_correct(submitted_city, &canonical);

    let fun_fact = bounded(self.limit, self.catalog.random_fun_fact(question.destination_id)).await.map_err(|e| {
      error!(target: "challenge", destination_id = %question.destination_id, error = %e, "Error retrieving fun fact");
      e
    })?;

    if let Some(challenge_id) = challenge_id.filter(|id| !id.is_nil()) {
      let session = bounded(
        self.limit,
        self.store.record_answer(challenge_id, question_id, correct, self.rules.correct_points),
      )
      .await
      .map_err(|e| {
        if !matches!(e, StoreError::NotFound { .. }) {
          error!(target: "challenge", %challenge_id, error = %e, "Error updating challenge");
        }
        e
      })?;
      info!(target: "challenge", %challenge_id, %correct, score = session.score, remaining = session.question_ids.len(), "Challenge answer recorded");
    }

    Ok(AnswerVerdict { correct, fun_fact })
  }

  /// Count a revealed clue against the session's score. Solo reveals are no-ops.
  #[instrument(level = "info", skip(self))]
  pub async fn reveal_clue(&self, session_id: Option<ChallengeId>) -> Result<Option<ChallengeSession>, GameError> {
    let Some(session_id) = session_id.filter(|id| !id.is_nil()) else {
      return Ok(None);
    };
    let session = bounded(self.limit, self.store.reveal_clue(session_id, self.rules.clue_penalty)).await?;
    info!(target: "challenge", %session_id, score = session.score, clues = session.clues_revealed, "Clue revealed");
    Ok(Some(session))
  }

  /// Overwrite tallies with the client's final state and close the session.
  #[instrument(level = "info", skip(self, tally), fields(%session_id, score = tally.score))]
  pub async fn end_session(&self, session_id: ChallengeId, tally: FinalTally) -> Result<ChallengeSession, GameError> {
    let session = bounded(self.limit, self.store.finalize(session_id, tally, Utc::now())).await?;
    info!(target: "challenge", %session_id, score = session.score, "Challenge ended");
    Ok(session)
  }

  /// Snapshot read. Inactive sessions are flipped back to active so they can be
  /// rejoined; a failure to persist that is logged and otherwise ignored.
  #[instrument(level = "info", skip(self), fields(%session_id))]
  pub async fn get_session(&self, session_id: ChallengeId) -> Result<ChallengeSession, GameError> {
    let mut session = bounded(self.limit, self.store.session(session_id)).await?;
    if !session.is_active {
      match bounded(self.limit, self.store.reactivate(session_id)).await {
        Ok(_) => {
          session.reactivate();
          info!(target: "challenge", %session_id, "Challenge reactivated");
        }
        Err(e) => error!(target: "challenge", %session_id, error = %e, "Error reactivating challenge"),
      }
    }
    Ok(session)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use chrono::DateTime;
  use uuid::Uuid;

  use crate::accounts::MemoryAccounts;
  use crate::catalog::MemoryCatalog;
  use crate::domain::{DestinationId, Question};
  use crate::store::{MemoryStore, QueueFill};

  struct Fixture {
    engine: ChallengeEngine,
    catalog: Arc<MemoryCatalog>,
    store: Arc<MemoryStore>,
    accounts: Arc<MemoryAccounts>,
  }

  fn fixture_with(catalog: MemoryCatalog) -> Fixture {
    let catalog = Arc::new(catalog);
    let store = Arc::new(MemoryStore::new());
    let accounts = Arc::new(MemoryAccounts::new());
    let engine = ChallengeEngine::new(catalog.clone(), store.clone(), accounts.clone(), &GameConfig::default());
    Fixture { engine, catalog, store, accounts }
  }

  fn fixture() -> Fixture {
    fixture_with(MemoryCatalog::from_dataset(crate::seeds::seed_destinations()))
  }

  impl Fixture {
    async fn city_of(&self, question_id: QuestionId) -> String {
      let q = self.store.question(question_id).await.expect("question");
      self.catalog.city(q.destination_id).await.expect("city")
    }

    async fn started(&self, inviter: &str) -> (ChallengeId, Vec<QuestionId>) {
      let created = self.engine.create_session(inviter).await.expect("create");
      let outcome = self.engine.next_question(created.id, inviter).await.expect("next");
      assert!(matches!(outcome, QuestionOutcome::Question(_)));
      let session = self.store.session(created.id).await.expect("session");
      (created.id, session.question_ids)
    }
  }

  #[tokio::test]
  async fn create_session_provisions_unknown_inviter() {
    let f = fixture();
    let created = f.engine.create_session("alice").await.expect("create");
    assert!(created.account_provisioned);
    assert!(f.accounts.exists("alice").await.expect("exists"));

    let again = f.engine.create_session("alice").await.expect("create");
    assert!(!again.account_provisioned);

    let s = f.store.session(created.id).await.expect("session");
    assert!(s.is_active);
    assert!(s.question_ids.is_empty());
    assert_eq!((s.score, s.correct_answers, s.incorrect_answers, s.clues_revealed), (0, 0, 0, 0));
  }

  #[tokio::test]
  async fn inviter_populates_exactly_once_while_queue_is_non_empty() {
    let f = fixture();
    let (id, first) = f.started("alice").await;
    assert_eq!(first.len(), 5);

    f.engine.next_question(id, "alice").await.expect("next");
    let after = f.store.session(id).await.expect("session");
    assert_eq!(after.question_ids, first);
  }

  #[tokio::test]
  async fn next_question_serves_the_head_without_removing_it() {
    let f = fixture();
    let (id, queue) = f.started("alice").await;
    let QuestionOutcome::Question(p) = f.engine.next_question(id, "alice").await.expect("next") else {
      panic!("expected a question");
    };
    assert_eq!(p.question_id, queue[0]);
    assert_eq!(p.choices.len(), 6);
    assert!(p.choices.contains(&f.city_of(queue[0]).await));
  }

  #[tokio::test]
  async fn guest_never_generates() {
    let f = fixture();
    let created = f.engine.create_session("alice").await.expect("create");
    let outcome = f.engine.next_question(created.id, "bob").await.expect("next");
    assert_eq!(outcome, QuestionOutcome::ChallengeComplete);
    assert!(f.store.session(created.id).await.expect("session").question_ids.is_empty());
  }

  #[tokio::test]
  async fn empty_catalog_yields_no_questions() {
    let f = fixture_with(MemoryCatalog::default());
    let created = f.engine.create_session("alice").await.expect("create");
    assert_eq!(f.engine.next_question(created.id, "alice").await.expect("next"), QuestionOutcome::NoQuestions);
    assert_eq!(f.engine.solo_question().await.expect("solo"), QuestionOutcome::NoQuestions);
  }

  #[tokio::test]
  async fn unknown_session_and_missing_username_are_rejected() {
    let f = fixture();
    assert!(matches!(f.engine.next_question(Uuid::new_v4(), "alice").await, Err(GameError::NotFound { .. })));
    let created = f.engine.create_session("alice").await.expect("create");
    assert!(matches!(f.engine.next_question(created.id, "").await, Err(GameError::Validation(_))));
    assert!(matches!(f.engine.create_session("").await, Err(GameError::Validation(_))));
  }

  #[tokio::test]
  async fn answers_accept_any_case_of_the_canonical_city() {
    let f = fixture();
    let QuestionOutcome::Question(p) = f.engine.solo_question().await.expect("solo") else {
      panic!("expected a question");
    };
    let city = f.city_of(p.question_id).await;
    for variant in [city.to_lowercase(), city.to_uppercase(), city.clone()] {
      let v = f.engine.submit_answer(p.question_id, &variant, None).await.expect("answer");
      assert!(v.correct, "{variant} should be correct");
      assert!(!v.fun_fact.is_empty());
    }
  }

  #[tokio::test]
  async fn tallies_follow_correct_and_incorrect_submissions() {
    let f = fixture();
    let (id, queue) = f.started("alice").await;
    let (n, m) = (2u32, 2u32);
    for (i, qid) in queue.iter().take((n + m) as usize).enumerate() {
      let city = if (i as u32) < n { f.city_of(*qid).await } else { "Atlantis".to_string() };
      f.engine.submit_answer(*qid, &city, Some(id)).await.expect("answer");
    }
    let s = f.store.session(id).await.expect("session");
    assert_eq!(s.score, 3 * n);
    assert_eq!(s.correct_answers, n);
    assert_eq!(s.incorrect_answers, m);
    assert_eq!(s.question_ids.len(), queue.len() - (n + m) as usize);
  }

  #[tokio::test]
  async fn nil_challenge_id_is_treated_as_solo() {
    let f = fixture();
    let (id, queue) = f.started("alice").await;
    let city = f.city_of(queue[0]).await;
    f.engine.submit_answer(queue[0], &city, Some(Uuid::nil())).await.expect("answer");
    assert_eq!(f.store.session(id).await.expect("session").score, 0);
  }

  #[tokio::test]
  async fn reveal_clue_never_goes_negative() {
    let f = fixture();
    let created = f.engine.create_session("alice").await.expect("create");
    for _ in 0..3 {
      f.engine.reveal_clue(Some(created.id)).await.expect("reveal");
    }
    let s = f.store.session(created.id).await.expect("session");
    assert_eq!(s.score, 0);
    assert_eq!(s.clues_revealed, 3);
    assert_eq!(f.engine.reveal_clue(None).await.expect("solo reveal"), None);
  }

  #[tokio::test]
  async fn end_then_get_reactivates_and_keeps_end_time() {
    let f = fixture();
    let created = f.engine.create_session("alice").await.expect("create");
    let tally = FinalTally { score: 7, correct_answers: 3, incorrect_answers: 2, clues_revealed: 2, question_ids: vec![] };
    let ended = f.engine.end_session(created.id, tally).await.expect("end");
    assert!(!ended.is_active);

    let snap = f.engine.get_session(created.id).await.expect("get");
    assert!(snap.is_active);
    assert_eq!(snap.ended_at, ended.ended_at);
    assert_eq!((snap.score, snap.correct_answers, snap.incorrect_answers, snap.clues_revealed), (7, 3, 2, 2));
    assert!(f.store.session(created.id).await.expect("session").is_active);
  }

  #[tokio::test]
  async fn client_max_tallies_do_not_overflow_later_updates() {
    let f = fixture();
    let (id, queue) = f.started("alice").await;
    let tally = FinalTally {
      score: u32::MAX,
      correct_answers: u32::MAX,
      incorrect_answers: u32::MAX,
      clues_revealed: u32::MAX,
      question_ids: queue.clone(),
    };
    f.engine.end_session(id, tally).await.expect("end");

    f.engine.reveal_clue(Some(id)).await.expect("reveal");
    let city = f.city_of(queue[0]).await;
    f.engine.submit_answer(queue[0], &city, Some(id)).await.expect("correct answer");
    f.engine.submit_answer(queue[1], "Atlantis", Some(id)).await.expect("wrong answer");

    let s = f.store.session(id).await.expect("session");
    assert_eq!((s.correct_answers, s.incorrect_answers, s.clues_revealed), (u32::MAX, u32::MAX, u32::MAX));
    assert_eq!(s.question_ids, queue[2..].to_vec());
  }

  #[tokio::test]
  async fn missing_fun_fact_fails_the_answer_and_leaves_session_untouched() {
    let dataset = r#"[
      {"city": "Lima", "country": "Peru", "clues": ["a", "b"], "trivia": ["t"]},
      {"city": "Oslo", "country": "Norway", "clues": ["c", "d"], "trivia": ["t"]},
      {"city": "Quito", "country": "Ecuador", "clues": ["e", "f"], "trivia": ["t"]}
    ]"#;
    let f = fixture_with(MemoryCatalog::parse_dataset(dataset).expect("dataset"));
    let (id, queue) = f.started("alice").await;
    let before = f.store.session(id).await.expect("session");

    let city = f.city_of(queue[0]).await;
    let res = f.engine.submit_answer(queue[0], &city, Some(id)).await;
    assert!(matches!(res, Err(GameError::Store(StoreError::MissingContent { kind: "fun fact", .. }))));
    assert_eq!(f.store.session(id).await.expect("session"), before);
  }

  #[tokio::test]
  async fn two_player_scenario() {
    let f = fixture();
    let (id, queue) = f.started("alice").await;
    assert_eq!(queue.len(), 5);

    let city = f.city_of(queue[0]).await;
    let verdict = f.engine.submit_answer(queue[0], &city, Some(id)).await.expect("answer");
    assert!(verdict.correct);

    let s = f.store.session(id).await.expect("session");
    assert_eq!(s.score, 3);
    assert_eq!(s.question_ids.len(), 4);
    assert!(!s.question_ids.contains(&queue[0]));

    let QuestionOutcome::Question(p) = f.engine.next_question(id, "bob").await.expect("next") else {
      panic!("bob should get a question");
    };
    assert_eq!(p.question_id, queue[1]);
    assert_eq!(f.store.session(id).await.expect("session").question_ids.len(), 4);
  }

  #[tokio::test]
  async fn concurrent_inviter_requests_queue_one_batch() {
    let f = fixture();
    let id = f.engine.create_session("alice").await.expect("create").id;
    let mut handles = Vec::new();
    for _ in 0..8 {
      let engine = f.engine.clone();
      handles.push(tokio::spawn(async move { engine.next_question(id, "alice").await }));
    }
    for h in handles {
      h.await.expect("join").expect("next");
    }
    assert_eq!(f.store.session(id).await.expect("session").question_ids.len(), 5);
  }

  /// Delegates to a MemoryStore but fails selected operations.
  struct FailingStore {
    inner: MemoryStore,
    fail_answers: bool,
    fail_reactivate: bool,
  }

  #[async_trait]
  impl ChallengeStore for FailingStore {
    async fn insert_question(&self, destination_id: DestinationId) -> Result<Question, StoreError> {
      self.inner.insert_question(destination_id).await
    }
    async fn question(&self, id: QuestionId) -> Result<Question, StoreError> {
      self.inner.question(id).await
    }
    async fn insert_session(&self, session: ChallengeSession) -> Result<(), StoreError> {
      self.inner.insert_session(session).await
    }
    async fn session(&self, id: ChallengeId) -> Result<ChallengeSession, StoreError> {
      self.inner.session(id).await
    }
    async fn populate_queue_if_empty(&self, id: ChallengeId, ids: &[QuestionId]) -> Result<QueueFill, StoreError> {
      self.inner.populate_queue_if_empty(id, ids).await
    }
    async fn record_answer(&self, id: ChallengeId, q: QuestionId, correct: bool, points: u32) -> Result<ChallengeSession, StoreError> {
      if self.fail_answers {
        return Err(StoreError::Unavailable("commit failed".into()));
      }
      self.inner.record_answer(id, q, correct, points).await
    }
    async fn reveal_clue(&self, id: ChallengeId, penalty: u32) -> Result<ChallengeSession, StoreError> {
      self.inner.reveal_clue(id, penalty).await
    }
    async fn finalize(&self, id: ChallengeId, tally: FinalTally, at: DateTime<Utc>) -> Result<ChallengeSession, StoreError> {
      self.inner.finalize(id, tally, at).await
    }
    async fn reactivate(&self, id: ChallengeId) -> Result<bool, StoreError> {
      if self.fail_reactivate {
        return Err(StoreError::Unavailable("read-only replica".into()));
      }
      self.inner.reactivate(id).await
    }
  }

  fn failing_engine(fail_answers: bool, fail_reactivate: bool) -> (ChallengeEngine, MemoryStore) {
    let inner = MemoryStore::new();
    let store = Arc::new(FailingStore { inner: inner.clone(), fail_answers, fail_reactivate });
    let catalog = Arc::new(MemoryCatalog::from_dataset(crate::seeds::seed_destinations()));
    let engine = ChallengeEngine::new(catalog, store, Arc::new(MemoryAccounts::new()), &GameConfig::default());
    (engine, inner)
  }

  #[tokio::test]
  async fn failed_answer_commit_leaves_session_untouched() {
    let (engine, inner) = failing_engine(true, false);
    let created = engine.create_session("alice").await.expect("create");
    engine.next_question(created.id, "alice").await.expect("next");
    let before = inner.session(created.id).await.expect("session");

    let res = engine.submit_answer(before.question_ids[0], "Paris", Some(created.id)).await;
    assert!(matches!(res, Err(GameError::Store(_))));
    assert_eq!(inner.session(created.id).await.expect("session"), before);
  }

  #[tokio::test]
  async fn reactivation_failure_is_swallowed() {
    let (engine, inner) = failing_engine(false, true);
    let created = engine.create_session("alice").await.expect("create");
    engine.end_session(created.id, FinalTally::default()).await.expect("end");

    let snap = engine.get_session(created.id).await.expect("get still succeeds");
    assert!(!snap.is_active);
    assert!(!inner.session(created.id).await.expect("session").is_active);
  }
}
