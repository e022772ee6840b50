use crate::types::{Coord, GameSnapshot, Player};

const COLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn coord_to_label(coord: Coord) -> String {
  let col = COLS.chars().nth(coord.x).unwrap_or('?');
  format!("{}{}", col, coord.y + 1)
}

/// Parses labels such as `J10` or `j10`. Rows count from 1.
pub fn parse_label(label: &str) -> Option<Coord> {
  let label = label.trim();
  if label.len() < 2 {
    return None;
  }
  let mut chars = label.chars();
  let col = chars.next()?.to_ascii_uppercase();
  let col_idx = COLS.find(col)?;
  let row: usize = chars.as_str().parse().ok()?;
  if row == 0 {
    return None;
  }
  Some(Coord {
    x: col_idx,
    y: row - 1,
  })
}

/// Text diagram with row 1 at the bottom, as on a printed board.
pub fn render_board(snapshot: &GameSnapshot) -> String {
  let size = snapshot.board_size;
  let mut out = String::new();
  out.push_str("   ");
  for c in COLS.chars().take(size) {
    out.push(c);
    out.push(' ');
  }
  out.push('\n');

  for row in (0..size).rev() {
    out.push_str(&format!("{:>2} ", row + 1));
    for col in 0..size {
      let ch = match Player::from_code(snapshot.board[row][col]) {
        None => '.',
        Some(Player::B) => 'X',
        Some(Player::W) => 'O',
      };
      out.push(ch);
      out.push(' ');
    }
    out.push('\n');
  }
  out
}
