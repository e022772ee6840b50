//! Session-keyed entry points for a surrounding transport layer.
//!
//! Each session sits behind its own mutex, so calls against one session are
//! serialised while different sessions run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::ai;
use crate::config::{validate_board_size, Config};
use crate::engine::{now_ts, GameSession};
use crate::error::GameError;
use crate::types::{Difficulty, GameRecord, GameSnapshot, MoveReport};

pub type SessionHandle = String;
pub type SharedSession = Arc<Mutex<GameSession>>;

pub trait SessionStore: Send + Sync {
  fn create(&self, handle: SessionHandle, session: GameSession) -> Result<SharedSession, GameError>;
  fn get(&self, handle: &str) -> Result<SharedSession, GameError>;
  fn delete(&self, handle: &str) -> Result<(), GameError>;
  fn len(&self) -> Result<usize, GameError>;

  fn is_empty(&self) -> Result<bool, GameError> {
    Ok(self.len()? == 0)
  }
}

#[derive(Default)]
pub struct MemorySessionStore {
  sessions: RwLock<HashMap<SessionHandle, SharedSession>>,
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for MemorySessionStore {
  fn create(&self, handle: SessionHandle, session: GameSession) -> Result<SharedSession, GameError> {
    let shared = Arc::new(Mutex::new(session));
    self
      .sessions
      .write()
      .map_err(|_| GameError::LockPoisoned)?
      .insert(handle, shared.clone());
    Ok(shared)
  }

  fn get(&self, handle: &str) -> Result<SharedSession, GameError> {
    self
      .sessions
      .read()
      .map_err(|_| GameError::LockPoisoned)?
      .get(handle)
      .cloned()
      .ok_or_else(|| GameError::SessionNotFound {
        handle: handle.to_string(),
      })
  }

  fn delete(&self, handle: &str) -> Result<(), GameError> {
    self
      .sessions
      .write()
      .map_err(|_| GameError::LockPoisoned)?
      .remove(handle)
      .map(|_| ())
      .ok_or_else(|| GameError::SessionNotFound {
        handle: handle.to_string(),
      })
  }

  fn len(&self) -> Result<usize, GameError> {
    Ok(self.sessions.read().map_err(|_| GameError::LockPoisoned)?.len())
  }
}

pub struct GameService<S: SessionStore> {
  store: S,
  config: Config,
  rng: Mutex<StdRng>,
}

impl GameService<MemorySessionStore> {
  pub fn in_memory(config: Config) -> Self {
    GameService::new(MemorySessionStore::new(), config)
  }
}

impl<S: SessionStore> GameService<S> {
  pub fn new(store: S, config: Config) -> Self {
    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    Self {
      store,
      config,
      rng: Mutex::new(rng),
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  #[instrument(skip(self))]
  pub fn create_session(&self, board_size: usize) -> Result<SessionHandle, GameError> {
    validate_board_size(board_size)?;
    let handle = self.new_handle()?;
    self.store.create(handle.clone(), GameSession::new(board_size))?;
    info!(handle = %handle, board_size, "session created");
    Ok(handle)
  }

  #[instrument(skip(self, record))]
  pub fn restore_session(&self, record: &GameRecord) -> Result<SessionHandle, GameError> {
    let session = GameSession::from_record(record)?;
    let handle = self.new_handle()?;
    self.store.create(handle.clone(), session)?;
    info!(handle = %handle, moves = record.moves.len(), "session restored");
    Ok(handle)
  }

  pub fn get_state(&self, handle: &str) -> Result<GameSnapshot, GameError> {
    let shared = self.store.get(handle)?;
    let session = lock(&shared)?;
    Ok(session.snapshot())
  }

  pub fn export_record(&self, handle: &str) -> Result<GameRecord, GameError> {
    let shared = self.store.get(handle)?;
    let session = lock(&shared)?;
    Ok(session.to_record())
  }

  /// Rejected moves come back as `accepted: false`; only a missing session or
  /// a poisoned lock is an `Err`.
  #[instrument(skip(self))]
  pub fn apply_move(&self, handle: &str, x: i64, y: i64) -> Result<MoveReport, GameError> {
    let shared = self.store.get(handle)?;
    let mut session = lock(&shared)?;

    let size = session.board().size();
    let coords = usize::try_from(x).ok().zip(usize::try_from(y).ok());
    let result = match coords {
      Some((ux, uy)) => session.place_stone(ux, uy),
      None if session.game_over() => Err(GameError::GameAlreadyOver),
      None => Err(GameError::InvalidCoordinate { x, y, size }),
    };

    Ok(match result {
      Ok(placement) => MoveReport {
        accepted: true,
        message: placement.message(),
        reason: None,
        coord: None,
        state: session.snapshot(),
      },
      Err(err) => {
        debug!(error = %err, "move rejected");
        reject(err, session.snapshot())
      }
    })
  }

  /// Lets the selector choose for the side to move, then applies it through
  /// the same path as a human move.
  #[instrument(skip(self))]
  pub fn request_ai_move(&self, handle: &str, difficulty: &Difficulty) -> Result<MoveReport, GameError> {
    let shared = self.store.get(handle)?;
    let mut session = lock(&shared)?;

    if session.game_over() {
      return Ok(reject(GameError::GameAlreadyOver, session.snapshot()));
    }

    let choice = {
      let mut rng = self.rng.lock().map_err(|_| GameError::LockPoisoned)?;
      ai::select_move(
        session.board(),
        session.current_turn(),
        difficulty,
        self.config.ai_config(),
        &mut *rng,
      )
    };
    let Some(coord) = choice else {
      warn!("selector found no empty cell");
      return Err(GameError::NoLegalMove);
    };

    let placed = format!("AI placed a stone at ({}, {}).", coord.x, coord.y);
    Ok(match session.place_stone(coord.x, coord.y) {
      Ok(placement) => {
        info!(x = coord.x, y = coord.y, %difficulty, "ai move");
        MoveReport {
          accepted: true,
          message: format!("{} {}", placed, placement.message()),
          reason: None,
          coord: Some(coord),
          state: session.snapshot(),
        }
      }
      Err(err) => {
        warn!(x = coord.x, y = coord.y, error = %err, "ai move rejected");
        let mut report = reject(err, session.snapshot());
        report.message = format!("{} {}", placed, report.message);
        report.coord = Some(coord);
        report
      }
    })
  }

  #[instrument(skip(self))]
  pub fn delete_session(&self, handle: &str) -> Result<(), GameError> {
    self.store.delete(handle)?;
    info!(handle = %handle, "session deleted");
    Ok(())
  }

  fn new_handle(&self) -> Result<SessionHandle, GameError> {
    let mut rng = self.rng.lock().map_err(|_| GameError::LockPoisoned)?;
    loop {
      let handle = new_game_id(now_ts(), rng.gen());
      if let Err(GameError::SessionNotFound { .. }) = self.store.get(&handle) {
        return Ok(handle);
      }
    }
  }
}

fn lock(shared: &SharedSession) -> Result<MutexGuard<'_, GameSession>, GameError> {
  shared.lock().map_err(|_| GameError::LockPoisoned)
}

fn reject(err: GameError, state: GameSnapshot) -> MoveReport {
  MoveReport {
    accepted: false,
    message: err.to_string(),
    reason: Some(err.reason_code().to_string()),
    coord: None,
    state,
  }
}

fn new_game_id(seed: i64, rand_part: u32) -> String {
  format!("gomoku-{}-{:08x}", seed, rand_part)
}
