//! Engine error type

use dipscore_core::{GreatPower, ScoringError, ValidationError};

use crate::model::{GameId, PlayerId, RoundId, TournamentId};

/// Everything that can abort an engine operation.
///
/// Any error rolls back the whole transaction it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("invalid round configuration: {0}")]
    InvalidRoundConfig(String),

    #[error("unknown game {0}")]
    UnknownGame(GameId),

    #[error("unknown round {0}")]
    UnknownRound(RoundId),

    #[error("unknown tournament {0}")]
    UnknownTournament(TournamentId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {player} is not in tournament {tournament}")]
    PlayerNotInTournament {
        player: PlayerId,
        tournament: TournamentId,
    },

    #[error("player {player} overlaps with player {other} playing {power}")]
    TenureOverlap {
        player: PlayerId,
        other: PlayerId,
        power: GreatPower,
    },

    #[error("store lock poisoned")]
    StorePoisoned,
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
