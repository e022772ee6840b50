use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;
use crate::types::{AiConfig, Difficulty};

pub const MIN_BOARD_SIZE: usize = 5;
/// Column labels run A..Z.
pub const MAX_BOARD_SIZE: usize = 26;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default = "default_board_size")]
  pub board_size: usize,
  #[serde(default = "default_offense_weight")]
  pub offense_weight: f64,
  #[serde(default)]
  pub default_difficulty: Difficulty,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub seed: Option<u64>,
  #[serde(default = "default_parallel_scoring")]
  pub parallel_scoring: bool,
}

fn default_board_size() -> usize {
  19
}

fn default_offense_weight() -> f64 {
  1.1
}

fn default_parallel_scoring() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self {
      board_size: default_board_size(),
      offense_weight: default_offense_weight(),
      default_difficulty: Difficulty::default(),
      seed: None,
      parallel_scoring: default_parallel_scoring(),
    }
  }
}

impl Config {
  pub fn load(path: &Path) -> Result<Self, GameError> {
    let data = fs::read_to_string(path).map_err(|e| GameError::Config {
      reason: format!("{}: {}", path.display(), e),
    })?;
    let config: Config = serde_json::from_str(&data).map_err(|e| GameError::Config {
      reason: format!("{}: {}", path.display(), e),
    })?;
    config.validate()?;
    debug!(path = %path.display(), board_size = config.board_size, "configuration loaded");
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), GameError> {
    validate_board_size(self.board_size)?;
    if !self.offense_weight.is_finite() || self.offense_weight <= 0.0 {
      return Err(GameError::Config {
        reason: format!("offense_weight must be positive, got {}", self.offense_weight),
      });
    }
    Ok(())
  }

  pub fn ai_config(&self) -> AiConfig {
    AiConfig {
      offense_weight: self.offense_weight,
      parallel: self.parallel_scoring,
    }
  }
}

pub fn validate_board_size(size: usize) -> Result<(), GameError> {
  if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
    Ok(())
  } else {
    Err(GameError::InvalidBoardSize { size })
  }
}
