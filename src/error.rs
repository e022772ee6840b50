use derive_more::{Display, Error};

use crate::types::ForbiddenKind;

/// Everything the engine and the session layer can refuse.
///
/// `ForbiddenMove` differs from the other move rejections: by the time it is
/// returned the session has already been ended with White as the winner.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum GameError {
  #[display("Coordinate ({x}, {y}) is outside the {size}x{size} board")]
  InvalidCoordinate { x: i64, y: i64, size: usize },
  #[display("Cell ({x}, {y}) is already occupied")]
  CellOccupied { x: usize, y: usize },
  #[display("Game is already finished")]
  GameAlreadyOver,
  #[display("Forbidden move ({kind}). White wins!")]
  ForbiddenMove { kind: ForbiddenKind },
  #[display("No legal move available")]
  NoLegalMove,
  #[display("Session {handle} not found")]
  SessionNotFound { handle: String },
  #[display("Board size {size} is not supported")]
  InvalidBoardSize { size: usize },
  #[display("Malformed board grid: {reason}")]
  MalformedGrid { reason: String },
  #[display("Corrupt game record: {reason}")]
  CorruptRecord { reason: String },
  #[display("Invalid configuration: {reason}")]
  Config { reason: String },
  #[display("Session lock poisoned")]
  LockPoisoned,
}

impl GameError {
  /// Stable machine-readable code for callers that branch on the failure kind.
  pub fn reason_code(&self) -> &'static str {
    match self {
      GameError::InvalidCoordinate { .. } => "invalid_coordinate",
      GameError::CellOccupied { .. } => "cell_occupied",
      GameError::GameAlreadyOver => "game_already_over",
      GameError::ForbiddenMove { kind } => match kind {
        ForbiddenKind::Overline => "forbidden_overline",
        ForbiddenKind::DoubleThree => "forbidden_double_three",
        ForbiddenKind::DoubleFour => "forbidden_double_four",
      },
      GameError::NoLegalMove => "no_legal_move",
      GameError::SessionNotFound { .. } => "session_not_found",
      GameError::InvalidBoardSize { .. } => "invalid_board_size",
      GameError::MalformedGrid { .. } => "malformed_grid",
      GameError::CorruptRecord { .. } => "corrupt_record",
      GameError::Config { .. } => "config",
      GameError::LockPoisoned => "lock_poisoned",
    }
  }
}
