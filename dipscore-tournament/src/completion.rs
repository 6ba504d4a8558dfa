//! Game completion state machine
//!
//! A game starts `InProgress` and moves to `Finished` at most once. There is
//! no transition back.

use dipscore_core::{CentreCount, DrawProposal, GreatPower, WINNING_CENTRES};
use serde::{Deserialize, Serialize};

use crate::model::Game;

/// Why a game finished
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FinishReason {
    /// A draw or concession vote passed
    DrawPassed,
    /// A power reached the winning centre count
    Solo { power: GreatPower },
    /// Every power still in the game has a count for the round's final year
    FinalYearReached { year: u16 },
    /// Ended by an outside signal (e.g. the round ran out of time)
    MarkedEnded,
}

/// Lifecycle of a game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    InProgress,
    Finished { cause: FinishReason },
}

impl GameStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Finished { .. })
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            GameStatus::Finished { cause } => Some(*cause),
            GameStatus::InProgress => None,
        }
    }
}

/// Something that happened to a game
#[derive(Clone, Copy, Debug)]
pub enum GameEvent<'a> {
    CentreCount(CentreCount),
    DrawProposal(&'a DrawProposal),
    MarkEnded,
}

/// Does `event` end a game in a round whose final year is `round_final_year`?
pub fn finish_reason(event: &GameEvent<'_>, round_final_year: Option<u16>) -> Option<FinishReason> {
    match event {
        GameEvent::DrawProposal(draw) if draw.passed => Some(FinishReason::DrawPassed),
        GameEvent::DrawProposal(_) => None,
        GameEvent::CentreCount(cc) if cc.count >= WINNING_CENTRES => {
            Some(FinishReason::Solo { power: cc.power })
        }
        GameEvent::CentreCount(cc) if round_final_year == Some(cc.year) => {
            Some(FinishReason::FinalYearReached { year: cc.year })
        }
        GameEvent::CentreCount(_) => None,
        GameEvent::MarkEnded => Some(FinishReason::MarkedEnded),
    }
}

/// Outcome of offering an event to the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Stayed,
    /// The game just finished; finalization must run
    Finished(FinishReason),
    /// The game had already finished; finalization must not run again
    AlreadyFinished,
}

/// Apply `event` to `game`'s status.
///
/// `event` must already be in the game's ledger. Reaching the final year
/// only finishes the game once that year is complete.
pub fn advance(game: &mut Game, event: &GameEvent<'_>, round_final_year: Option<u16>) -> Transition {
    if game.is_finished() {
        return Transition::AlreadyFinished;
    }
    match finish_reason(event, round_final_year) {
        Some(FinishReason::FinalYearReached { year }) if !game.ledger.year_complete(year) => {
            Transition::Stayed
        }
        Some(cause) => {
            game.status = GameStatus::Finished { cause };
            Transition::Finished(cause)
        }
        None => Transition::Stayed,
    }
}

/// Result of a game, as reported to spectators
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GameResult {
    InProgress,
    /// A one-power vote passed
    Conceded { power: GreatPower },
    Drawn { powers: Vec<GreatPower> },
    Soloed { power: GreatPower, centres: u8 },
    /// Finished without a solo or passed vote
    Ended { board_top: u8, toppers: Vec<GreatPower> },
}

impl GameResult {
    /// Summarise a game: passed votes first, then solos, then other endings
    pub fn of(game: &Game) -> Self {
        if let Some(draw) = game.passed_draw() {
            let powers = draw.powers();
            return match powers.as_slice() {
                [power] => GameResult::Conceded { power: *power },
                _ => GameResult::Drawn { powers },
            };
        }
        if let Some(solo) = game.ledger.soloer() {
            return GameResult::Soloed {
                power: solo.power,
                centres: solo.count,
            };
        }
        if game.is_finished() {
            let toppers = game.ledger.board_toppers();
            let board_top = toppers.first().map(|cc| cc.count).unwrap_or(0);
            return GameResult::Ended {
                board_top,
                toppers: toppers.into_iter().map(|cc| cc.power).collect(),
            };
        }
        GameResult::InProgress
    }
}
