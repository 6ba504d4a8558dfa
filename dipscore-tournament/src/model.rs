//! Tournament entities and participation records

use std::fmt;

use dipscore_core::{CentreCountLedger, DrawProposal, GreatPower, PowerScores, Season, FIRST_YEAR};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::completion::GameStatus;
use crate::config::{RoundConfig, TournamentConfig};
use crate::error::{EngineError, EngineResult};

// ============================================================================
// IDENTIFIERS
// ============================================================================

macro_rules! entity_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(PlayerId, "P");
entity_id!(TournamentId, "T");
entity_id!(RoundId, "R");
entity_id!(GameId, "G");

/// Score per player for a round or tournament
pub type PlayerScores = FxHashMap<PlayerId, f64>;

// ============================================================================
// ENTITIES
// ============================================================================

/// A person who plays in tournaments
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// A Diplomacy tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub config: TournamentConfig,
    /// Rounds in number order
    pub rounds: Vec<RoundId>,
    pub players: Vec<TournamentPlayer>,
}

impl Tournament {
    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.iter().any(|tp| tp.player == player)
    }
}

/// One player in a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentPlayer {
    pub player: PlayerId,
    pub score: f64,
}

/// A single round of a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub tournament: TournamentId,
    pub number: u32,
    pub config: RoundConfig,
    pub games: Vec<GameId>,
    pub players: Vec<RoundPlayer>,
}

/// A person who played a round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundPlayer {
    pub player: PlayerId,
    pub score: f64,
}

/// A single game of Diplomacy, within a round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub round: RoundId,
    pub ledger: CentreCountLedger,
    pub draw_proposals: Vec<DrawProposal>,
    pub status: GameStatus,
    pub players: Vec<GamePlayer>,
    /// Per-power scores, written once when the game finishes
    pub final_scores: Option<PowerScores>,
}

impl Game {
    /// New in-progress game with starting centre counts recorded
    pub fn new(id: GameId, name: impl Into<String>, round: RoundId) -> Self {
        Self {
            id,
            name: name.into(),
            round,
            ledger: CentreCountLedger::with_starting_counts(),
            draw_proposals: Vec::new(),
            status: GameStatus::InProgress,
            players: Vec::new(),
            final_scores: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn passed_draw(&self) -> Option<&DrawProposal> {
        self.draw_proposals.iter().find(|d| d.passed)
    }

    /// Players of one power, latest holder first
    pub fn holders(&self, power: GreatPower) -> Vec<&GamePlayer> {
        let mut holders: Vec<&GamePlayer> =
            self.players.iter().filter(|gp| gp.power == power).collect();
        holders.sort_by(|a, b| b.first.cmp(&a.first));
        holders
    }

    /// The player holding `power` at the end of the recorded game
    pub fn final_holder(&self, power: GreatPower) -> Option<&GamePlayer> {
        self.holders(power).into_iter().next()
    }

    /// Add a participation record, rejecting overlapping terms for one power
    pub fn add_player(&mut self, record: GamePlayer) -> EngineResult<()> {
        for other in self.players.iter().filter(|gp| gp.power == record.power) {
            if record.overlaps(other) {
                return Err(EngineError::TenureOverlap {
                    player: record.player,
                    other: other.player,
                    power: record.power,
                });
            }
        }
        self.players.push(record);
        Ok(())
    }
}

/// A season of a game year, ordered chronologically
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub year: u16,
    pub season: Season,
}

impl Turn {
    pub fn new(year: u16, season: Season) -> Self {
        Self { year, season }
    }

    /// Spring of the first game year
    pub fn start() -> Self {
        Self::new(FIRST_YEAR, Season::Spring)
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season, self.year)
    }
}

/// A person who played a Great Power in a game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub player: PlayerId,
    pub power: GreatPower,
    /// First turn played
    pub first: Turn,
    /// Last turn played, if the player was replaced
    #[serde(default)]
    pub last: Option<Turn>,
    #[serde(default)]
    pub score: f64,
}

impl GamePlayer {
    /// A player holding `power` for the whole game
    pub fn new(player: PlayerId, power: GreatPower) -> Self {
        Self {
            player,
            power,
            first: Turn::start(),
            last: None,
            score: 0.0,
        }
    }

    pub fn from_turn(mut self, first: Turn) -> Self {
        self.first = first;
        self
    }

    pub fn until(mut self, last: Turn) -> Self {
        self.last = Some(last);
        self
    }

    /// Two terms overlap unless the earlier one ends before the later begins
    pub fn overlaps(&self, other: &GamePlayer) -> bool {
        let (earlier, later) = if self.first <= other.first {
            (self, other)
        } else {
            (other, self)
        };
        if earlier.first == later.first {
            return true;
        }
        match earlier.last {
            Some(last) => last >= later.first,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GreatPower::*;

    #[test]
    fn test_new_game_has_starting_counts() {
        let game = Game::new(GameId(1), "Board 1", RoundId(1));
        assert!(!game.is_finished());
        assert_eq!(game.ledger.final_year(), Some(1900));
        assert_eq!(game.ledger.count(Russia, 1900), Some(4));
        assert!(game.passed_draw().is_none());
    }

    #[test]
    fn test_turn_ordering() {
        assert!(Turn::new(1903, Season::Spring) < Turn::new(1903, Season::Fall));
        assert!(Turn::new(1903, Season::Fall) < Turn::new(1904, Season::Spring));
        assert_eq!(Turn::start().to_string(), "Spring 1901");
    }

    #[test]
    fn test_replacement_terms() {
        let mut game = Game::new(GameId(1), "Board 1", RoundId(1));
        let first_holder = GamePlayer::new(PlayerId(1), France).until(Turn::new(1904, Season::Spring));
        let replacement = GamePlayer::new(PlayerId(2), France).from_turn(Turn::new(1904, Season::Fall));
        game.add_player(first_holder).unwrap();
        game.add_player(replacement).unwrap();

        assert_eq!(game.final_holder(France).map(|gp| gp.player), Some(PlayerId(2)));
        assert_eq!(game.holders(France).len(), 2);
        assert!(game.final_holder(Italy).is_none());
    }

    #[test]
    fn test_overlapping_terms_rejected() {
        let mut game = Game::new(GameId(1), "Board 1", RoundId(1));
        game.add_player(GamePlayer::new(PlayerId(1), Turkey)).unwrap();

        // First holder never left
        let late = GamePlayer::new(PlayerId(2), Turkey).from_turn(Turn::new(1905, Season::Spring));
        assert!(matches!(
            game.add_player(late),
            Err(EngineError::TenureOverlap { player: PlayerId(2), other: PlayerId(1), power: Turkey })
        ));

        // Same start turn
        let mut game = Game::new(GameId(2), "Board 2", RoundId(1));
        game.add_player(GamePlayer::new(PlayerId(1), Turkey).until(Turn::new(1903, Season::Fall)))
            .unwrap();
        assert!(game.add_player(GamePlayer::new(PlayerId(3), Turkey)).is_err());

        // Handover in the same season
        let handover = GamePlayer::new(PlayerId(4), Turkey).from_turn(Turn::new(1903, Season::Fall));
        assert!(game.add_player(handover).is_err());

        // Different powers never clash
        assert!(game.add_player(GamePlayer::new(PlayerId(5), Austria)).is_ok());
    }
}
