//! Dipscore Tournament - game completion and score finalization
//!
//! This crate runs tournaments on top of `dipscore-core`:
//! - Tournaments, rounds, games and the players seated in them
//! - Transactional recording of centre counts and draw votes
//! - The game completion state machine
//! - Cascading finalization of game, round and tournament scores
//! - Live "as it stands" scores for anything not yet finished
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: ScoringEngine (orchestration)
//! - Level 2: FinalizationCoordinator, LiveScorer (phases)
//! - Level 3: freezing each level, crediting replacements (steps)
//! - Level 4: configuration, storage

mod cascade;
mod completion;
mod config;
mod engine;
mod error;
mod model;
mod scores;
mod store;

pub use cascade::{CascadeReport, FinalizationCoordinator};
pub use completion::{advance, finish_reason, FinishReason, GameEvent, GameResult, GameStatus, Transition};
pub use config::{EngineConfig, ReplacementCredit, RoundConfig, TournamentConfig};
pub use engine::{EntityRef, Scores, ScoringEngine};
pub use error::{EngineError, EngineResult};
pub use model::{
    Game, GameId, GamePlayer, Player, PlayerId, PlayerScores, Round, RoundId, RoundPlayer,
    Tournament, TournamentId, TournamentPlayer, Turn,
};
pub use scores::{credited_scores, LiveScorer};
pub use store::{MemoryStore, StoreData, TournamentStore};
