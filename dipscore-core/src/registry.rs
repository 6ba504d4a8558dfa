//! Scoring system registry
//!
//! Built once at start-up and shared by reference. Systems are found by
//! their stable display name; an unknown name is a configuration error.

use serde::{Deserialize, Serialize};

use crate::aggregate::{RoundScoring, TournamentScoring};
use crate::error::ScoringError;
use crate::scoring::{CDiploParams, GameScoring};

/// A scoring rule together with the name it is selected by
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Named<T> {
    pub name: String,
    #[serde(flatten)]
    pub system: T,
}

impl<T> Named<T> {
    pub fn new(name: impl Into<String>, system: T) -> Self {
        Self {
            name: name.into(),
            system,
        }
    }
}

pub type GameScoringSystem = Named<GameScoring>;
pub type RoundScoringSystem = Named<RoundScoring>;
pub type TournamentScoringSystem = Named<TournamentScoring>;

/// All scoring systems known to the process
#[derive(Clone, Debug, Default)]
pub struct ScoringRegistry {
    game: Vec<GameScoringSystem>,
    round: Vec<RoundScoringSystem>,
    tournament: Vec<TournamentScoringSystem>,
}

impl ScoringRegistry {
    /// Registry with no systems at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard set of systems
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_game(Named::new("Solo or bust", GameScoring::SoloOrBust));
        registry.register_game(Named::new("Draw size", GameScoring::DrawSize));
        registry.register_game(Named::new(
            "CDiplo 100",
            GameScoring::CDiplo(CDiploParams::new(100.0, 1.0, 38.0, 14.0, 7.0)),
        ));
        registry.register_game(Named::new(
            "CDiplo 80",
            GameScoring::CDiplo(CDiploParams::new(80.0, 0.0, 25.0, 14.0, 7.0)),
        ));
        registry.register_game(Named::new("Sum of Squares", GameScoring::SumOfSquares));

        registry.register_round(Named::new("Best game counts", RoundScoring::BestGame));

        for rounds in 2..=4 {
            registry.register_tournament(Named::new(
                format!("Sum best {rounds} rounds"),
                TournamentScoring::SumBest { rounds },
            ));
        }
        registry
    }

    /// Add a game system, replacing any existing one with the same name
    pub fn register_game(&mut self, system: GameScoringSystem) {
        upsert(&mut self.game, system);
    }

    pub fn register_round(&mut self, system: RoundScoringSystem) {
        upsert(&mut self.round, system);
    }

    pub fn register_tournament(&mut self, system: TournamentScoringSystem) {
        upsert(&mut self.tournament, system);
    }

    /// Register game systems from a JSON list of named systems
    pub fn register_games_from_json(&mut self, json: &str) -> serde_json::Result<usize> {
        let systems: Vec<GameScoringSystem> = serde_json::from_str(json)?;
        let added = systems.len();
        for system in systems {
            self.register_game(system);
        }
        Ok(added)
    }

    pub fn find_game(&self, name: &str) -> Result<&GameScoring, ScoringError> {
        find(&self.game, name)
    }

    pub fn find_round(&self, name: &str) -> Result<&RoundScoring, ScoringError> {
        find(&self.round, name)
    }

    pub fn find_tournament(&self, name: &str) -> Result<&TournamentScoring, ScoringError> {
        find(&self.tournament, name)
    }

    /// Game system names, sorted for display
    pub fn game_names(&self) -> Vec<&str> {
        sorted_names(&self.game)
    }

    pub fn round_names(&self) -> Vec<&str> {
        sorted_names(&self.round)
    }

    pub fn tournament_names(&self) -> Vec<&str> {
        sorted_names(&self.tournament)
    }
}

fn upsert<T>(systems: &mut Vec<Named<T>>, system: Named<T>) {
    match systems.iter_mut().find(|s| s.name == system.name) {
        Some(existing) => *existing = system,
        None => systems.push(system),
    }
}

fn find<'a, T>(systems: &'a [Named<T>], name: &str) -> Result<&'a T, ScoringError> {
    systems
        .iter()
        .find(|s| s.name == name)
        .map(|s| &s.system)
        .ok_or_else(|| ScoringError::InvalidScoringSystem(name.to_string()))
}

fn sorted_names<T>(systems: &[Named<T>]) -> Vec<&str> {
    let mut names: Vec<&str> = systems.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names
}
