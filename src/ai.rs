use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::engine::Board;
use crate::rules::run_length;
use crate::types::{AiConfig, Coord, Difficulty, Direction, Player};

const SCORE_FIVE: u32 = 100_000;
const SCORE_FOUR: u32 = 1_000;
const SCORE_THREE: u32 = 100;
const SCORE_TWO: u32 = 10;

/// Any scored cell beats this, so an empty cell is always chosen when one exists.
const SCORE_FLOOR: f64 = -1.0;

/// Picks a move for `player`. `None` means the board has no empty cell.
///
/// The board is never modified; scoring runs on a private copy.
pub fn select_move<R: Rng + ?Sized>(
  board: &Board,
  player: Player,
  difficulty: &Difficulty,
  config: AiConfig,
  rng: &mut R,
) -> Option<Coord> {
  match difficulty {
    Difficulty::Intermediate => heuristic_move(board, player, config).or_else(|| random_move(board, rng)),
    Difficulty::Beginner => random_move(board, rng),
    Difficulty::Other(label) => {
      debug!(difficulty = %label, "unrecognised difficulty, playing randomly");
      random_move(board, rng)
    }
  }
}

pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Coord> {
  board.empty_coords().choose(rng).copied()
}

/// Highest combined score over every empty cell; ties go to the first cell in
/// row-major order.
pub fn heuristic_move(board: &Board, player: Player, config: AiConfig) -> Option<Coord> {
  let empty = board.empty_coords();
  let weight = config.offense_weight;

  let scores: Vec<f64> = if config.parallel {
    empty
      .par_iter()
      .map_init(
        || board.clone(),
        |scratch, coord| score_cell(scratch, coord.x, coord.y, player, weight),
      )
      .collect()
  } else {
    let mut scratch = board.clone();
    empty
      .iter()
      .map(|coord| score_cell(&mut scratch, coord.x, coord.y, player, weight))
      .collect()
  };

  let mut best_move = None;
  let mut best_score = SCORE_FLOOR;
  for (coord, score) in empty.iter().zip(scores) {
    if score > best_score {
      best_score = score;
      best_move = Some(*coord);
    }
  }

  if let Some(coord) = best_move {
    debug!(x = coord.x, y = coord.y, score = best_score, "heuristic move");
  }
  best_move
}

/// Offense (our stone here) weighted by `offense_weight`, plus defense (their
/// stone here).
pub fn score_cell(board: &mut Board, x: usize, y: usize, player: Player, offense_weight: f64) -> f64 {
  let offense = {
    let trial = board.provisional(x, y, player);
    line_score(&trial, x, y, player)
  };
  let defense = {
    let opponent = player.other();
    let trial = board.provisional(x, y, opponent);
    line_score(&trial, x, y, opponent)
  };
  offense as f64 * offense_weight + defense as f64
}

/// Sum of run-length points over the four lines through (x, y). Open ends are
/// not considered.
pub fn line_score(board: &Board, x: usize, y: usize, player: Player) -> u32 {
  Direction::ALL
    .iter()
    .map(|&dir| run_points(run_length(board, x, y, dir, player)))
    .sum()
}

fn run_points(len: usize) -> u32 {
  match len {
    n if n >= 5 => SCORE_FIVE,
    4 => SCORE_FOUR,
    3 => SCORE_THREE,
    2 => SCORE_TWO,
    _ => 0,
  }
}
