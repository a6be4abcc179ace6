//! Loading game configuration (rules, store bounds, dataset location) from TOML.
//!
//! See `GameConfig` and `GameRules` for expected schema. Every field is optional.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
  /// JSON dataset in the import format. Empty means built-in seed destinations.
  pub dataset_path: String,
  pub static_dir: String,
  pub rules: GameRules,
  pub store: StoreConfig,
}

impl Default for GameConfig {
  fn default() -> Self {
    Self {
      dataset_path: String::new(),
      static_dir: "./static".into(),
      rules: GameRules::default(),
      store: StoreConfig::default(),
    }
  }
}

/// Scoring and question-shape constants.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameRules {
  pub questions_per_challenge: usize,
  pub clues_per_question: usize,
  pub distractors: usize,
  pub correct_points: u32,
  pub clue_penalty: u32,
}

impl Default for GameRules {
  fn default() -> Self {
    Self {
      questions_per_challenge: 5,
      clues_per_question: 2,
      distractors: 5,
      correct_points: 3,
      clue_penalty: 1,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub timeout_ms: u64,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { timeout_ms: 2000 }
  }
}

impl StoreConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}

pub fn parse_config(s: &str) -> Result<GameConfig, toml::de::Error> {
  toml::from_str::<GameConfig>(s)
}

/// Load `GameConfig` from GLOBETROTTER_CONFIG_PATH. On any parsing/IO error, falls back to defaults.
pub fn load_config_from_env() -> GameConfig {
  let Ok(path) = std::env::var("GLOBETROTTER_CONFIG_PATH") else {
    info!(target: "globetrotter", "GLOBETROTTER_CONFIG_PATH not set; using default config");
    return GameConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "globetrotter", %path, "Loaded game config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "globetrotter", %path, error = %e, "Failed to parse TOML config");
        GameConfig::default()
      }
    },
    Err(e) => {
      error!(target: "globetrotter", %path, error = %e, "Failed to read TOML config file");
      GameConfig::default()
    }
  }
}
