//! Question generation: link a play instance to a destination and build the
//! multiple-choice payload (clues, trivia, shuffled choices) served to players.

use std::{sync::Arc, time::Duration};

use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::config::GameRules;
use crate::domain::{DestinationId, Question, QuestionId};
use crate::error::StoreError;
use crate::store::{bounded, ChallengeStore};

/// Everything a client needs to render one question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionPayload {
  pub question_id: QuestionId,
  pub clues: Vec<String>,
  /// Correct city plus distractors, uniformly shuffled.
  pub choices: Vec<String>,
  pub trivia: String,
}

#[derive(Clone)]
pub struct QuestionGenerator {
  catalog: Arc<dyn Catalog>,
  store: Arc<dyn ChallengeStore>,
  rules: GameRules,
  limit: Duration,
}

impl QuestionGenerator {
  pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ChallengeStore>, rules: GameRules, limit: Duration) -> Self {
    Self { catalog, store, rules, limit }
  }

  /// Persist a new question for `destination_id` without building its payload.
  pub async fn link(&self, destination_id: DestinationId) -> Result<Question, StoreError> {
    bounded(self.limit, self.store.insert_question(destination_id)).await
  }

  /// Link a new question and build its full payload.
  #[instrument(level = "debug", skip(self), fields(%destination_id))]
  pub async fn generate(&self, destination_id: DestinationId) -> Result<QuestionPayload, StoreError> {
    let question = self.link(destination_id).await?;
    self.build_payload(question.id, destination_id).await
  }

  /// Build the payload for an existing question.
  #[instrument(level = "debug", skip(self), fields(%question_id, %destination_id))]
  pub async fn build_payload(&self, question_id: QuestionId, destination_id: DestinationId) -> Result<QuestionPayload, StoreError> {
    let clues = bounded(self.limit, self.catalog.random_clues(destination_id, self.rules.clues_per_question)).await?;
    let trivia = bounded(self.limit, self.catalog.random_trivia(destination_id)).await?;
    let correct = bounded(self.limit, self.catalog.city(destination_id)).await?;
    let distractors = bounded(self.limit, self.catalog.random_cities(destination_id, self.rules.distractors)).await?;
    let choices = shuffled_choices(correct, distractors);
    debug!(target: "challenge", %question_id, clues = clues.len(), choices = choices.len(), "Question payload built");
    Ok(QuestionPayload { question_id, clues, choices, trivia })
  }
}

/// Correct answer plus distractors in uniformly random order.
pub fn shuffled_choices(correct: String, distractors: Vec<String>) -> Vec<String> {
  let mut choices = Vec::with_capacity(distractors.len() + 1);
  choices.push(correct);
  choices.extend(distractors);
  choices.shuffle(&mut rand::thread_rng());
  choices
}
