//! Application state: the challenge engine and the collaborators it is wired to.
//!
//! This module owns:
//!   - the content catalog (dataset file or built-in seeds)
//!   - the in-memory challenge store and account store
//!   - the loaded game config
//!
//! Handlers only ever talk to `AppState::engine`.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::accounts::MemoryAccounts;
use crate::catalog::MemoryCatalog;
use crate::config::{load_config_from_env, GameConfig};
use crate::engine::ChallengeEngine;
use crate::seeds::seed_destinations;
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: ChallengeEngine,
    pub config: GameConfig,
}

impl AppState {
    /// Build state from env: load config, load the catalog, wire the engine.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_config(load_config_from_env())
    }

    pub fn from_config(config: GameConfig) -> Self {
        let catalog = load_catalog(&config);
        info!(target: "globetrotter", destinations = catalog.len(), rules = ?config.rules, "Catalog ready");

        let engine = ChallengeEngine::new(
            Arc::new(catalog),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryAccounts::new()),
            &config,
        );
        Self { engine, config }
    }
}

/// Dataset file when configured and readable, otherwise the built-in seeds.
fn load_catalog(config: &GameConfig) -> MemoryCatalog {
    if !config.dataset_path.is_empty() {
        match MemoryCatalog::from_dataset_file(&config.dataset_path) {
            Ok(catalog) => return catalog,
            Err(e) => {
                error!(target: "globetrotter", path = %config.dataset_path, error = %e, "Dataset unavailable; using built-in seeds");
            }
        }
    }
    MemoryCatalog::from_dataset(seed_destinations())
}
