use crate::engine::Board;
use crate::types::{Direction, ForbiddenKind, LinePattern, Player};

/// True when the stone at (x, y) completes a line: exactly five for Black,
/// five or more for White. An empty cell never wins.
pub fn check_win(board: &Board, x: usize, y: usize) -> bool {
  let Some(player) = board.get(x, y) else {
    return false;
  };

  Direction::ALL.iter().any(|&dir| {
    let count = run_length(board, x, y, dir, player);
    match player {
      Player::B => count == 5,
      Player::W => count >= 5,
    }
  })
}

/// Contiguous `player` stones through (x, y) along `dir`, counting (x, y) itself.
pub fn run_length(board: &Board, x: usize, y: usize, dir: Direction, player: Player) -> usize {
  let (dx, dy) = dir.delta();
  1 + count_dir(board, x, y, dx, dy, player) + count_dir(board, x, y, -dx, -dy, player)
}

/// Classifies the single line through (x, y) for the stone already there.
///
/// Only contiguous runs are seen; split shapes such as `X_XXX` read as two
/// separate runs.
pub fn classify_line(board: &Board, x: usize, y: usize, dir: Direction) -> LinePattern {
  let Some(player) = board.get(x, y) else {
    return LinePattern::None;
  };
  let (dx, dy) = dir.delta();
  let count_f = count_dir(board, x, y, dx, dy, player);
  let count_b = count_dir(board, x, y, -dx, -dy, player);
  let total = count_f + count_b + 1;

  let side_f_empty = step(board, x, y, dx, dy, count_f + 1)
    .map_or(false, |(nx, ny)| board.is_empty(nx, ny));
  let side_b_empty = step(board, x, y, -dx, -dy, count_b + 1)
    .map_or(false, |(nx, ny)| board.is_empty(nx, ny));

  match total {
    3 if side_f_empty && side_b_empty => LinePattern::OpenThree,
    4 if side_f_empty || side_b_empty => LinePattern::Four,
    _ => LinePattern::None,
  }
}

/// Renju restrictions for a Black stone at (x, y).
///
/// The stone is placed provisionally and the board is back to its previous
/// contents when this returns. Occupied or off-board cells yield `None`.
pub fn forbidden_move(board: &mut Board, x: usize, y: usize) -> Option<ForbiddenKind> {
  if !board.is_empty(x, y) {
    return None;
  }
  let trial = board.provisional(x, y, Player::B);

  if Direction::ALL
    .iter()
    .any(|&dir| run_length(&trial, x, y, dir, Player::B) > 5)
  {
    return Some(ForbiddenKind::Overline);
  }

  // A move that completes five is a win, so none of its fours count.
  let completes_five = check_win(&trial, x, y);
  let mut open_threes = 0;
  let mut fours = 0;
  for dir in Direction::ALL {
    match classify_line(&trial, x, y, dir) {
      LinePattern::OpenThree => open_threes += 1,
      LinePattern::Four if !completes_five => fours += 1,
      _ => {}
    }
  }

  if open_threes >= 2 {
    Some(ForbiddenKind::DoubleThree)
  } else if fours >= 2 {
    Some(ForbiddenKind::DoubleFour)
  } else {
    None
  }
}

fn count_dir(board: &Board, x: usize, y: usize, dx: i32, dy: i32, player: Player) -> usize {
  let mut count = 0;
  let mut cx = x as i32 + dx;
  let mut cy = y as i32 + dy;

  while cx >= 0 && cy >= 0 {
    let ux = cx as usize;
    let uy = cy as usize;
    if !board.in_bounds(ux, uy) {
      break;
    }
    if board.get(ux, uy) != Some(player) {
      break;
    }
    count += 1;
    cx += dx;
    cy += dy;
  }

  count
}

fn step(board: &Board, x: usize, y: usize, dx: i32, dy: i32, n: usize) -> Option<(usize, usize)> {
  let nx = x as i64 + dx as i64 * n as i64;
  let ny = y as i64 + dy as i64 * n as i64;
  if nx < 0 || ny < 0 {
    return None;
  }
  let (ux, uy) = (nx as usize, ny as usize);
  board.in_bounds(ux, uy).then_some((ux, uy))
}
