//! Dipscore Core - Diplomacy tournament scoring primitives
//!
//! This crate provides the pure scoring domain:
//! - Great Powers and board constants
//! - Centre-count ledger with progression rules
//! - Draw proposals and their validity rules
//! - Tie-break allocation of ranking points
//! - Game, round and tournament scoring systems
//! - A registry for looking systems up by name

pub mod aggregate;
pub mod draw;
pub mod error;
pub mod ledger;
pub mod power;
pub mod registry;
pub mod scoring;
pub mod tiebreak;

// Re-exports for convenient access
pub use aggregate::{RoundScoring, TournamentScoring};
pub use draw::DrawProposal;
pub use error::{DrawConflict, ProgressionRule, ScoringError, ValidationError};
pub use ledger::{CentreCount, CentreCountLedger};
pub use power::{
    GreatPower, Season, UnknownPower, FIRST_YEAR, POWER_COUNT, START_YEAR, TOTAL_CENTRES,
    WINNING_CENTRES,
};
pub use registry::{
    GameScoringSystem, Named, RoundScoringSystem, ScoringRegistry, TournamentScoringSystem,
};
pub use scoring::{CDiploParams, GameScoring, GameSnapshot, PowerScores};
pub use tiebreak::allocate_position_points;
