pub mod ai;
pub mod config;
pub mod engine;
pub mod error;
pub mod notation;
pub mod rules;
pub mod service;
pub mod types;

pub use config::Config;
pub use engine::{Board, GameSession, Placement};
pub use error::GameError;
pub use service::{GameService, MemorySessionStore, SessionHandle, SessionStore};
pub use types::{Coord, Difficulty, ForbiddenKind, GameRecord, GameSnapshot, MoveReport, Player};
