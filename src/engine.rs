use std::ops::Deref;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::config::validate_board_size;
use crate::error::GameError;
use crate::rules;
use crate::types::{Coord, GameRecord, GameSnapshot, Move, Player};

pub const RECORD_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
  size: usize,
  cells: Vec<Option<Player>>,
}

impl Board {
  pub fn new(size: usize) -> Self {
    assert!(size > 0, "board size must be positive");
    Self {
      size,
      cells: vec![None; size * size],
    }
  }

  /// Builds a board from the 0/1/2 row-major matrix exposed in snapshots.
  pub fn from_grid(grid: &[Vec<u8>]) -> Result<Self, GameError> {
    let size = grid.len();
    if size == 0 {
      return Err(GameError::MalformedGrid {
        reason: "grid has no rows".to_string(),
      });
    }
    let mut board = Board::new(size);
    for (y, row) in grid.iter().enumerate() {
      if row.len() != size {
        return Err(GameError::MalformedGrid {
          reason: format!("row {} has {} cells, expected {}", y, row.len(), size),
        });
      }
      for (x, &code) in row.iter().enumerate() {
        match (code, Player::from_code(code)) {
          (0, _) => {}
          (_, Some(player)) => board.set(x, y, player),
          (_, None) => {
            return Err(GameError::MalformedGrid {
              reason: format!("cell ({}, {}) holds {}", x, y, code),
            })
          }
        }
      }
    }
    Ok(board)
  }

  pub fn to_grid(&self) -> Vec<Vec<u8>> {
    self
      .cells
      .chunks(self.size)
      .map(|row| row.iter().map(|cell| cell.map_or(0, Player::code)).collect())
      .collect()
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn in_bounds(&self, x: usize, y: usize) -> bool {
    x < self.size && y < self.size
  }

  pub fn index(&self, x: usize, y: usize) -> usize {
    y * self.size + x
  }

  pub fn get(&self, x: usize, y: usize) -> Option<Player> {
    if !self.in_bounds(x, y) {
      return None;
    }
    self.cells[self.index(x, y)]
  }

  pub fn set(&mut self, x: usize, y: usize, player: Player) {
    let idx = self.index(x, y);
    self.cells[idx] = Some(player);
  }

  pub fn clear(&mut self, x: usize, y: usize) {
    let idx = self.index(x, y);
    self.cells[idx] = None;
  }

  pub fn is_empty(&self, x: usize, y: usize) -> bool {
    self.in_bounds(x, y) && self.get(x, y).is_none()
  }

  /// Empty cells in row-major order (y outer, x inner).
  pub fn empty_coords(&self) -> Vec<Coord> {
    let mut coords = Vec::with_capacity(self.size * self.size);
    for y in 0..self.size {
      for x in 0..self.size {
        if self.get(x, y).is_none() {
          coords.push(Coord { x, y });
        }
      }
    }
    coords
  }

  /// Puts `player` on an empty cell until the returned guard is dropped.
  pub fn provisional(&mut self, x: usize, y: usize, player: Player) -> ProvisionalStone<'_> {
    assert!(
      self.is_empty(x, y),
      "provisional stone at ({}, {}) needs an empty cell",
      x,
      y
    );
    self.set(x, y, player);
    ProvisionalStone { board: self, x, y }
  }
}

/// A stone placed for evaluation only. The cell is emptied again on drop, on
/// every exit path.
pub struct ProvisionalStone<'a> {
  board: &'a mut Board,
  x: usize,
  y: usize,
}

impl Deref for ProvisionalStone<'_> {
  type Target = Board;

  fn deref(&self) -> &Board {
    &*self.board
  }
}

impl Drop for ProvisionalStone<'_> {
  fn drop(&mut self) {
    self.board.clear(self.x, self.y);
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
  Placed,
  Won(Player),
}

impl Placement {
  pub fn message(self) -> String {
    match self {
      Placement::Placed => "Stone placed.".to_string(),
      Placement::Won(player) => format!("Game over! {} wins.", player.name()),
    }
  }
}

#[derive(Clone, Debug)]
pub struct GameSession {
  board: Board,
  current_turn: Player,
  winner: Option<Player>,
  game_over: bool,
  moves: Vec<Move>,
  forbidden_attempt: Option<Move>,
}

impl GameSession {
  pub fn new(board_size: usize) -> Self {
    Self {
      board: Board::new(board_size),
      current_turn: Player::B,
      winner: None,
      game_over: false,
      moves: Vec::new(),
      forbidden_attempt: None,
    }
  }

  pub fn board(&self) -> &Board {
    &self.board
  }

  pub fn current_turn(&self) -> Player {
    self.current_turn
  }

  pub fn winner(&self) -> Option<Player> {
    self.winner
  }

  pub fn game_over(&self) -> bool {
    self.game_over
  }

  pub fn moves(&self) -> &[Move] {
    &self.moves
  }

  pub fn snapshot(&self) -> GameSnapshot {
    GameSnapshot {
      board_size: self.board.size(),
      board: self.board.to_grid(),
      current_turn: self.current_turn.code(),
      winner: self.winner.map(Player::code),
      game_over: self.game_over,
    }
  }

  /// The single mutator. A `ForbiddenMove` error has already ended the game.
  pub fn place_stone(&mut self, x: usize, y: usize) -> Result<Placement, GameError> {
    if self.game_over {
      return Err(GameError::GameAlreadyOver);
    }
    if !self.board.in_bounds(x, y) {
      return Err(GameError::InvalidCoordinate {
        x: x as i64,
        y: y as i64,
        size: self.board.size(),
      });
    }
    if !self.board.is_empty(x, y) {
      return Err(GameError::CellOccupied { x, y });
    }

    let player = self.current_turn;
    if player == Player::B {
      if let Some(kind) = rules::forbidden_move(&mut self.board, x, y) {
        info!(x, y, %kind, "black played a forbidden move");
        self.winner = Some(Player::W);
        self.game_over = true;
        self.forbidden_attempt = Some(Move {
          x,
          y,
          player,
          t: Some(now_ts()),
        });
        return Err(GameError::ForbiddenMove { kind });
      }
    }

    self.board.set(x, y, player);
    self.moves.push(Move {
      x,
      y,
      player,
      t: Some(now_ts()),
    });

    if rules::check_win(&self.board, x, y) {
      info!(x, y, winner = player.name(), "five in a row");
      self.winner = Some(player);
      self.game_over = true;
      return Ok(Placement::Won(player));
    }

    debug!(x, y, player = player.name(), "stone placed");
    self.current_turn = player.other();
    Ok(Placement::Placed)
  }

  pub fn to_record(&self) -> GameRecord {
    GameRecord {
      version: RECORD_VERSION.to_string(),
      board_size: self.board.size(),
      moves: self.moves.clone(),
      forbidden_attempt: self.forbidden_attempt.clone(),
      winner: self.winner,
      game_over: self.game_over,
    }
  }

  /// Rebuilds a session by replaying every recorded move through `place_stone`.
  pub fn from_record(record: &GameRecord) -> Result<Self, GameError> {
    validate_board_size(record.board_size)?;
    let mut session = GameSession::new(record.board_size);

    for mv in record.moves.iter() {
      session.replay(mv)?;
    }

    if let Some(mv) = &record.forbidden_attempt {
      match session.replay(mv) {
        Err(GameError::ForbiddenMove { .. }) => {}
        Err(err) => return Err(err),
        Ok(_) => {
          return Err(GameError::CorruptRecord {
            reason: format!("move ({}, {}) is not forbidden", mv.x, mv.y),
          })
        }
      }
    }

    if session.winner != record.winner || session.game_over != record.game_over {
      return Err(GameError::CorruptRecord {
        reason: "recorded result does not match the replayed moves".to_string(),
      });
    }
    Ok(session)
  }

  fn replay(&mut self, mv: &Move) -> Result<Placement, GameError> {
    if mv.player != self.current_turn {
      return Err(GameError::CorruptRecord {
        reason: format!("move ({}, {}) played out of turn", mv.x, mv.y),
      });
    }
    self.place_stone(mv.x, mv.y)
  }

  #[cfg(test)]
  pub(crate) fn board_mut(&mut self) -> &mut Board {
    &mut self.board
  }
}

pub(crate) fn now_ts() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs() as i64
}

#[cfg(test)]
mod tests {
  use super::*;
  use quickcheck::quickcheck;

  fn play(session: &mut GameSession, moves: &[(usize, usize)]) {
    for &(x, y) in moves {
      session.place_stone(x, y).unwrap();
    }
  }

  #[test]
  fn new_session_is_empty_with_black_to_move() {
    let session = GameSession::new(19);
    let snap = session.snapshot();
    assert_eq!(snap.board_size, 19);
    assert_eq!(snap.board.len(), 19);
    assert!(snap.board.iter().all(|row| row.len() == 19 && row.iter().all(|&c| c == 0)));
    assert_eq!(snap.current_turn, 1);
    assert_eq!(snap.winner, None);
    assert!(!snap.game_over);
  }

  #[test]
  fn turns_alternate_and_history_grows() {
    let mut session = GameSession::new(19);
    assert_eq!(session.place_stone(9, 9), Ok(Placement::Placed));
    assert_eq!(session.current_turn(), Player::W);
    assert_eq!(session.place_stone(0, 0), Ok(Placement::Placed));
    assert_eq!(session.current_turn(), Player::B);
    assert_eq!(session.moves().len(), 2);
    assert_eq!(session.moves()[0].player, Player::B);
    assert_eq!(session.moves()[1].player, Player::W);
    let snap = session.snapshot();
    assert_eq!(snap.board[9][9], 1);
    assert_eq!(snap.board[0][0], 2);
  }

  #[test]
  fn rejected_moves_leave_state_untouched() {
    let mut session = GameSession::new(19);
    play(&mut session, &[(3, 4)]);
    let before = session.snapshot();

    assert_eq!(
      session.place_stone(19, 0),
      Err(GameError::InvalidCoordinate { x: 19, y: 0, size: 19 })
    );
    assert_eq!(
      session.place_stone(3, 4),
      Err(GameError::CellOccupied { x: 3, y: 4 })
    );
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.current_turn(), Player::W);
    assert_eq!(session.moves().len(), 1);
  }

  #[test]
  fn black_wins_with_exactly_five() {
    let mut session = GameSession::new(19);
    play(
      &mut session,
      &[(5, 10), (5, 0), (6, 10), (6, 0), (7, 10), (7, 0), (8, 10), (18, 18)],
    );
    assert_eq!(session.place_stone(9, 10), Ok(Placement::Won(Player::B)));
    assert!(session.game_over());
    assert_eq!(session.winner(), Some(Player::B));
    assert_eq!(session.current_turn(), Player::B);
    assert_eq!(Placement::Won(Player::B).message(), "Game over! Black wins.");
  }

  #[test]
  fn white_wins_with_five() {
    let mut session = GameSession::new(19);
    play(
      &mut session,
      &[(0, 18), (5, 5), (2, 18), (5, 6), (4, 18), (5, 7), (6, 18), (5, 8), (8, 18)],
    );
    assert_eq!(session.place_stone(5, 9), Ok(Placement::Won(Player::W)));
    assert_eq!(session.snapshot().winner, Some(2));
  }

  #[test]
  fn terminal_session_rejects_everything() {
    let mut session = GameSession::new(19);
    play(
      &mut session,
      &[(5, 10), (5, 0), (6, 10), (6, 0), (7, 10), (7, 0), (8, 10), (18, 18), (9, 10)],
    );
    assert!(session.game_over());
    let before = session.snapshot();
    assert_eq!(session.place_stone(0, 5), Err(GameError::GameAlreadyOver));
    assert_eq!(session.place_stone(99, 99), Err(GameError::GameAlreadyOver));
    assert_eq!(session.snapshot(), before);
  }

  #[test]
  fn double_three_ends_game_for_black() {
    let mut session = GameSession::new(19);
    {
      let board = session.board_mut();
      board.set(8, 10, Player::B);
      board.set(9, 10, Player::B);
      board.set(10, 8, Player::B);
      board.set(10, 9, Player::B);
      board.set(0, 0, Player::W);
      board.set(18, 0, Player::W);
      board.set(0, 18, Player::W);
      board.set(18, 18, Player::W);
    }
    let before = session.board().clone();

    let err = session.place_stone(10, 10).unwrap_err();
    assert_eq!(
      err,
      GameError::ForbiddenMove {
        kind: crate::types::ForbiddenKind::DoubleThree
      }
    );
    assert!(session.game_over());
    assert_eq!(session.snapshot().winner, Some(2));
    assert_eq!(session.board(), &before);
    assert!(session.moves().is_empty());
    assert_eq!(session.place_stone(3, 3), Err(GameError::GameAlreadyOver));
  }

  #[test]
  fn white_is_never_checked_for_forbidden_patterns() {
    let mut session = GameSession::new(19);
    {
      let board = session.board_mut();
      board.set(8, 10, Player::W);
      board.set(9, 10, Player::W);
      board.set(10, 8, Player::W);
      board.set(10, 9, Player::W);
    }
    play(&mut session, &[(0, 0)]);
    assert_eq!(session.place_stone(10, 10), Ok(Placement::Placed));
  }

  #[test]
  fn grid_round_trips_exactly() {
    let mut session = GameSession::new(7);
    play(&mut session, &[(0, 0), (6, 6), (3, 2), (2, 3)]);
    let grid = session.snapshot().board;
    let rebuilt = Board::from_grid(&grid).unwrap();
    assert_eq!(&rebuilt, session.board());
    assert_eq!(rebuilt.to_grid(), grid);
    assert_eq!(grid[2][3], 1);
    assert_eq!(grid[3][2], 2);
  }

  #[test]
  fn malformed_grids_are_rejected() {
    assert!(matches!(
      Board::from_grid(&[]),
      Err(GameError::MalformedGrid { .. })
    ));
    assert!(matches!(
      Board::from_grid(&[vec![0, 0], vec![0]]),
      Err(GameError::MalformedGrid { .. })
    ));
    assert!(matches!(
      Board::from_grid(&[vec![0, 3], vec![0, 0]]),
      Err(GameError::MalformedGrid { .. })
    ));
  }

  #[test]
  fn provisional_stone_is_removed_on_drop() {
    let mut board = Board::new(19);
    board.set(4, 4, Player::W);
    let before = board.clone();
    {
      let trial = board.provisional(5, 5, Player::B);
      assert_eq!(trial.get(5, 5), Some(Player::B));
    }
    assert_eq!(board, before);
  }

  #[test]
  fn record_replays_to_same_state() {
    let mut session = GameSession::new(19);
    play(
      &mut session,
      &[(5, 10), (5, 0), (6, 10), (6, 0), (7, 10), (7, 0), (8, 10), (18, 18), (9, 10)],
    );
    let record = session.to_record();
    let json = serde_json::to_string(&record).unwrap();
    let parsed: GameRecord = serde_json::from_str(&json).unwrap();
    let replayed = GameSession::from_record(&parsed).unwrap();
    assert_eq!(replayed.snapshot(), session.snapshot());
    assert_eq!(replayed.moves().len(), 9);
  }

  #[test]
  fn record_replays_forbidden_loss() {
    let mut session = GameSession::new(19);
    play(
      &mut session,
      &[(8, 10), (0, 0), (9, 10), (18, 0), (10, 8), (0, 18), (10, 9), (18, 18)],
    );
    assert!(session.place_stone(10, 10).is_err());
    let record = session.to_record();
    assert!(record.forbidden_attempt.is_some());

    let replayed = GameSession::from_record(&record).unwrap();
    assert!(replayed.game_over());
    assert_eq!(replayed.winner(), Some(Player::W));
    assert_eq!(replayed.snapshot(), session.snapshot());
  }

  #[test]
  fn record_with_tampered_result_is_rejected() {
    let mut session = GameSession::new(19);
    play(&mut session, &[(1, 1), (2, 2)]);
    let mut record = session.to_record();
    record.winner = Some(Player::B);
    assert!(matches!(
      GameSession::from_record(&record),
      Err(GameError::CorruptRecord { .. })
    ));

    let mut record = session.to_record();
    record.moves[1].player = Player::B;
    assert!(matches!(
      GameSession::from_record(&record),
      Err(GameError::CorruptRecord { .. })
    ));
  }

  #[test]
  fn record_with_unsupported_size_is_rejected() {
    for size in [0, 4, 40, 3_000_000_000] {
      let mut record = GameSession::new(9).to_record();
      record.board_size = size;
      assert!(matches!(
        GameSession::from_record(&record),
        Err(GameError::InvalidBoardSize { size: got }) if got == size
      ));
    }
  }

  quickcheck! {
    fn provisional_placement_restores_board(stones: Vec<(u8, u8, bool)>, x: u8, y: u8, black: bool) -> bool {
      let size = 19usize;
      let mut board = Board::new(size);
      for (sx, sy, sb) in stones {
        let (sx, sy) = (sx as usize % size, sy as usize % size);
        board.set(sx, sy, if sb { Player::B } else { Player::W });
      }
      let (x, y) = (x as usize % size, y as usize % size);
      if !board.is_empty(x, y) {
        return true;
      }
      let before = board.clone();
      let player = if black { Player::B } else { Player::W };
      {
        let _trial = board.provisional(x, y, player);
      }
      let _ = rules::forbidden_move(&mut board, x, y);
      board == before
    }
  }
}
