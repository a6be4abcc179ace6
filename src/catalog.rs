//! Reference content catalog: destinations with their clues, fun facts and trivia.
//!
//! The catalog is read-only at runtime. It is built once, either from a JSON
//! dataset in the import format or from the built-in seeds, and then only sampled.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Destination, DestinationId};
use crate::error::StoreError;

/// Random-sampling view of the content catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
  /// Up to `n` distinct destinations, uniformly at random.
  async fn random_destinations(&self, n: usize) -> Result<Vec<DestinationId>, StoreError>;

  async fn destination(&self, id: DestinationId) -> Result<Destination, StoreError>;

  async fn city(&self, id: DestinationId) -> Result<String, StoreError> {
    Ok(self.destination(id).await?.city)
  }

  /// Up to `n` distinct city names, none equal to the excluded destination's city.
  async fn random_cities(&self, excluding: DestinationId, n: usize) -> Result<Vec<String>, StoreError>;

  /// Up to `n` clues of one destination, without replacement.
  async fn random_clues(&self, id: DestinationId, n: usize) -> Result<Vec<String>, StoreError>;

  async fn random_trivia(&self, id: DestinationId) -> Result<String, StoreError>;

  async fn random_fun_fact(&self, id: DestinationId) -> Result<String, StoreError>;
}

/// One record of the import dataset.
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetEntry {
  pub city: String,
  pub country: String,
  #[serde(default)] pub clues: Vec<String>,
  #[serde(default)] pub fun_fact: Vec<String>,
  #[serde(default)] pub trivia: Vec<String>,
}

#[derive(Clone, Debug, Default)]
struct Content {
  clues: Vec<String>,
  fun_facts: Vec<String>,
  trivia: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
  destinations: Vec<Destination>,
  content: HashMap<DestinationId, Content>,
}

impl MemoryCatalog {
  pub fn from_dataset(entries: Vec<DatasetEntry>) -> Self {
    let mut catalog = MemoryCatalog::default();
    for e in entries {
      if e.city.trim().is_empty() {
        warn!(target: "globetrotter", country = %e.country, "Skipping dataset entry without a city");
        continue;
      }
      let id = Uuid::new_v4();
      catalog.destinations.push(Destination { id, city: e.city, country: e.country });
      catalog.content.insert(id, Content { clues: e.clues, fun_facts: e.fun_fact, trivia: e.trivia });
    }
    catalog
  }

  pub fn parse_dataset(json: &str) -> Result<Self, StoreError> {
    let entries: Vec<DatasetEntry> = serde_json::from_str(json)
      .map_err(|e| StoreError::Unavailable(format!("invalid dataset: {e}")))?;
    Ok(Self::from_dataset(entries))
  }

  pub fn from_dataset_file(path: &str) -> Result<Self, StoreError> {
    let raw = std::fs::read_to_string(path)
      .map_err(|e| StoreError::Unavailable(format!("cannot read dataset {path}: {e}")))?;
    let catalog = Self::parse_dataset(&raw)?;
    info!(target: "globetrotter", %path, destinations = catalog.len(), "Loaded destination dataset");
    Ok(catalog)
  }

  pub fn len(&self) -> usize {
    self.destinations.len()
  }

  #[cfg(test)]
  pub fn destinations(&self) -> &[Destination] {
    &self.destinations
  }

  fn content(&self, id: DestinationId) -> Result<&Content, StoreError> {
    self.content.get(&id).ok_or_else(|| StoreError::not_found("destination", id))
  }
}

fn pick_one(pool: &[String], kind: &'static str, destination_id: DestinationId) -> Result<String, StoreError> {
  pool
    .choose(&mut rand::thread_rng())
    .cloned()
    .ok_or(StoreError::MissingContent { kind, destination_id })
}

#[async_trait]
impl Catalog for MemoryCatalog {
  async fn random_destinations(&self, n: usize) -> Result<Vec<DestinationId>, StoreError> {
    Ok(self.destinations.choose_multiple(&mut rand::thread_rng(), n).map(|d| d.id).collect())
  }

  async fn destination(&self, id: DestinationId) -> Result<Destination, StoreError> {
    self
      .destinations
      .iter()
      .find(|d| d.id == id)
      .cloned()
      .ok_or_else(|| StoreError::not_found("destination", id))
  }

  async fn random_cities(&self, excluding: DestinationId, n: usize) -> Result<Vec<String>, StoreError> {
    let excluded_city = self.destinations.iter().find(|d| d.id == excluding).map(|d| d.city.as_str());
    let mut seen = HashSet::new();
    let pool: Vec<&str> = self
      .destinations
      .iter()
      .filter(|d| d.id != excluding && Some(d.city.as_str()) != excluded_city)
      .map(|d| d.city.as_str())
      .filter(|city| seen.insert(*city))
      .collect();
    Ok(pool.choose_multiple(&mut rand::thread_rng(), n).map(|c| c.to_string()).collect())
  }

  async fn random_clues(&self, id: DestinationId, n: usize) -> Result<Vec<String>, StoreError> {
    let content = self.content(id)?;
    Ok(content.clues.choose_multiple(&mut rand::thread_rng(), n).cloned().collect())
  }

  async fn random_trivia(&self, id: DestinationId) -> Result<String, StoreError> {
    pick_one(&self.content(id)?.trivia, "trivia", id)
  }

  async fn random_fun_fact(&self, id: DestinationId) -> Result<String, StoreError> {
    pick_one(&self.content(id)?.fun_facts, "fun fact", id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DATASET: &str = r#"[
    {"city": "Paris", "country": "France", "clues": ["a", "b", "c"], "fun_fact": ["f1"], "trivia": ["t1", "t2"]},
    {"city": "Paris", "country": "USA", "clues": ["texas"], "fun_fact": [], "trivia": []},
    {"city": "Lima", "country": "Peru", "clues": ["d"], "fun_fact": ["f2"], "trivia": ["t3"]},
    {"city": "Oslo", "country": "Norway"},
    {"city": "", "country": "Nowhere"}
  ]"#;

  fn catalog() -> MemoryCatalog {
    MemoryCatalog::parse_dataset(DATASET).expect("dataset")
  }

  fn id_of(c: &MemoryCatalog, city: &str, country: &str) -> DestinationId {
    c.destinations().iter().find(|d| d.city == city && d.country == country).expect("present").id
  }

  #[test]
  fn dataset_skips_entries_without_city() {
    assert_eq!(catalog().len(), 4);
  }

  #[test]
  fn malformed_dataset_is_rejected() {
    assert!(matches!(MemoryCatalog::parse_dataset("{"), Err(StoreError::Unavailable(_))));
  }

  #[tokio::test]
  async fn clues_are_distinct_and_capped_by_supply() {
    let c = catalog();
    let paris = id_of(&c, "Paris", "France");
    let clues = c.random_clues(paris, 2).await.expect("clues");
    assert_eq!(clues.len(), 2);
    assert_ne!(clues[0], clues[1]);

    let lima = id_of(&c, "Lima", "Peru");
    assert_eq!(c.random_clues(lima, 2).await.expect("clues"), vec!["d".to_string()]);
  }

  #[tokio::test]
  async fn cities_exclude_the_answer_by_name() {
    let c = catalog();
    let paris = id_of(&c, "Paris", "France");
    let mut cities = c.random_cities(paris, 5).await.expect("cities");
    cities.sort();
    assert_eq!(cities, vec!["Lima".to_string(), "Oslo".to_string()]);
  }

  #[tokio::test]
  async fn missing_trivia_and_fun_facts_are_errors() {
    let c = catalog();
    let oslo = id_of(&c, "Oslo", "Norway");
    assert!(matches!(c.random_trivia(oslo).await, Err(StoreError::MissingContent { kind: "trivia", .. })));
    assert!(matches!(c.random_fun_fact(oslo).await, Err(StoreError::MissingContent { kind: "fun fact", .. })));
    assert!(matches!(c.random_trivia(Uuid::new_v4()).await, Err(StoreError::NotFound { .. })));
  }

  #[tokio::test]
  async fn random_destinations_are_distinct() {
    let c = MemoryCatalog::from_dataset(crate::seeds::seed_destinations());
    let ids = c.random_destinations(5).await.expect("ids");
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(unique.len(), 5);
    assert_eq!(c.random_destinations(100).await.expect("ids").len(), c.len());
  }
}
