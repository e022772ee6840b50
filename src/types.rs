use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Player {
  B,
  W,
}

impl Player {
  pub fn other(self) -> Self {
    match self {
      Player::B => Player::W,
      Player::W => Player::B,
    }
  }

  /// Grid encoding: 1 for Black, 2 for White (0 is an empty cell).
  pub fn code(self) -> u8 {
    match self {
      Player::B => 1,
      Player::W => 2,
    }
  }

  pub fn from_code(code: u8) -> Option<Self> {
    match code {
      1 => Some(Player::B),
      2 => Some(Player::W),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Player::B => "Black",
      Player::W => "White",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
  pub x: usize,
  pub y: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
  pub x: usize,
  pub y: usize,
  pub player: Player,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub t: Option<i64>,
}

/// The four line axes through a cell; each is walked in both signs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Horizontal,
  Vertical,
  Diagonal,
  AntiDiagonal,
}

impl Direction {
  pub const ALL: [Direction; 4] = [
    Direction::Horizontal,
    Direction::Vertical,
    Direction::Diagonal,
    Direction::AntiDiagonal,
  ];

  pub fn delta(self) -> (i32, i32) {
    match self {
      Direction::Horizontal => (1, 0),
      Direction::Vertical => (0, 1),
      Direction::Diagonal => (1, 1),
      Direction::AntiDiagonal => (1, -1),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub enum ForbiddenKind {
  #[display("overline")]
  Overline,
  #[display("double-three")]
  DoubleThree,
  #[display("double-four")]
  DoubleFour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinePattern {
  OpenThree,
  Four,
  None,
}

/// AI strength tier. Unknown labels are kept so they can be logged, and play
/// like `Beginner`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Other(String),
}

impl Default for Difficulty {
  fn default() -> Self {
    Difficulty::Intermediate
  }
}

impl From<&str> for Difficulty {
  fn from(label: &str) -> Self {
    match label.trim().to_ascii_lowercase().as_str() {
      "beginner" => Difficulty::Beginner,
      "intermediate" => Difficulty::Intermediate,
      _ => Difficulty::Other(label.to_string()),
    }
  }
}

impl From<String> for Difficulty {
  fn from(label: String) -> Self {
    Difficulty::from(label.as_str())
  }
}

impl From<Difficulty> for String {
  fn from(difficulty: Difficulty) -> Self {
    difficulty.to_string()
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Difficulty::Beginner => f.write_str("beginner"),
      Difficulty::Intermediate => f.write_str("intermediate"),
      Difficulty::Other(label) => f.write_str(label),
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AiConfig {
  pub offense_weight: f64,
  pub parallel: bool,
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      offense_weight: 1.1,
      parallel: true,
    }
  }
}

/// Read-only view of a session. `board` is row-major: `board[y][x]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
  pub board_size: usize,
  pub board: Vec<Vec<u8>>,
  pub current_turn: u8,
  pub winner: Option<u8>,
  pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
  pub accepted: bool,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
  /// Cell chosen by the AI, set on AI replies only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coord: Option<Coord>,
  pub state: GameSnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
  pub version: String,
  pub board_size: usize,
  pub moves: Vec<Move>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub forbidden_attempt: Option<Move>,
  pub winner: Option<Player>,
  pub game_over: bool,
}
