use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use renju::notation::{coord_to_label, parse_label, render_board};
use renju::{Config, Difficulty, GameError, GameService, MemorySessionStore, MoveReport, Player};

#[derive(Parser, Debug)]
#[command(name = "renju", about = "Gomoku with Renju restrictions against a heuristic AI")]
struct Cli {
  /// JSON configuration file
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[arg(long, global = true)]
  board_size: Option<usize>,

  /// Seed for the beginner AI and session handles
  #[arg(long, global = true)]
  seed: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Play against the AI on stdin/stdout
  Play {
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long, value_enum, default_value_t = Side::Black)]
    human: Side,
    /// Write the finished game record here
    #[arg(long)]
    record: Option<PathBuf>,
  },
  /// Let the AI play both sides
  Selfplay {
    #[arg(long, default_value = "intermediate")]
    black: String,
    #[arg(long, default_value = "intermediate")]
    white: String,
    #[arg(long)]
    record: Option<PathBuf>,
  },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
  Black,
  White,
}

impl Side {
  fn player(self) -> Player {
    match self {
      Side::Black => Player::B,
      Side::White => Player::W,
    }
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let mut config = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  if let Some(size) = cli.board_size {
    config.board_size = size;
  }
  if cli.seed.is_some() {
    config.seed = cli.seed;
  }
  config.validate()?;

  let service = GameService::in_memory(config);
  match cli.command {
    Command::Play {
      difficulty,
      human,
      record,
    } => {
      let difficulty = difficulty
        .map(Difficulty::from)
        .unwrap_or_else(|| service.config().default_difficulty.clone());
      play(&service, &difficulty, human.player(), record.as_deref())
    }
    Command::Selfplay {
      black,
      white,
      record,
    } => self_play(
      &service,
      &Difficulty::from(black),
      &Difficulty::from(white),
      record.as_deref(),
    ),
  }
}

fn play(
  service: &GameService<MemorySessionStore>,
  difficulty: &Difficulty,
  human: Player,
  record: Option<&Path>,
) -> Result<()> {
  let handle = service.create_session(service.config().board_size)?;
  info!(handle = %handle, %difficulty, human = human.name(), "starting game");
  let stdin = io::stdin();
  let mut lines = stdin.lock().lines();

  loop {
    let state = service.get_state(&handle)?;
    if state.game_over {
      break;
    }
    print!("{}", render_board(&state));

    if state.current_turn != human.code() {
      let report = match service.request_ai_move(&handle, difficulty) {
        Err(GameError::NoLegalMove) => {
          println!("No empty cell left. The game is drawn.");
          break;
        }
        other => other?,
      };
      announce_ai_move(&report);
      continue;
    }

    print!("{} to move (e.g. J10, or 'quit'): ", human.name());
    io::stdout().flush()?;
    let Some(line) = lines.next() else {
      break;
    };
    let line = line?;
    let input = line.trim();
    if input.eq_ignore_ascii_case("quit") {
      break;
    }
    let Some(coord) = parse_label(input) else {
      println!("Could not read '{}'.", input);
      continue;
    };
    let report = service.apply_move(&handle, coord.x as i64, coord.y as i64)?;
    println!("{}", report.message);
  }

  finish(service, &handle, record)
}

fn self_play(
  service: &GameService<MemorySessionStore>,
  black: &Difficulty,
  white: &Difficulty,
  record: Option<&Path>,
) -> Result<()> {
  let handle = service.create_session(service.config().board_size)?;
  info!(handle = %handle, %black, %white, "starting self-play");

  loop {
    let state = service.get_state(&handle)?;
    if state.game_over {
      break;
    }
    let difficulty = if state.current_turn == Player::B.code() { black } else { white };
    match service.request_ai_move(&handle, difficulty) {
      Ok(report) => announce_ai_move(&report),
      Err(GameError::NoLegalMove) => {
        println!("No empty cell left. The game is drawn.");
        break;
      }
      Err(err) => return Err(err.into()),
    }
  }

  finish(service, &handle, record)
}

fn announce_ai_move(report: &MoveReport) {
  match report.coord {
    Some(coord) if report.accepted => println!("AI plays {}.", coord_to_label(coord)),
    Some(coord) => println!(
      "AI plays {} and is refused ({}).",
      coord_to_label(coord),
      report.reason.as_deref().unwrap_or("rejected")
    ),
    None => println!("{}", report.message),
  }
}

fn finish(service: &GameService<MemorySessionStore>, handle: &str, record: Option<&Path>) -> Result<()> {
  let state = service.get_state(handle)?;
  print!("{}", render_board(&state));
  match state.winner.and_then(Player::from_code) {
    Some(winner) => println!("{} wins.", winner.name()),
    None if state.game_over => bail!("game ended without a winner"),
    None => println!("No winner."),
  }

  if let Some(path) = record {
    let json = serde_json::to_string_pretty(&service.export_record(handle)?)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "game record written");
  }
  service.delete_session(handle)?;
  Ok(())
}
