//! Configuration types for tournaments, rounds and the engine
//!
//! Level 4 - Utilities and configuration

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Who receives a power's score when several players held it in one game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementCredit {
    /// Only the player holding the power at the end of the game
    #[default]
    FinalHolder,
    /// Every player who held the power gets its full score
    EveryHolder,
}

/// Engine-wide behaviour
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How replacement players are credited
    #[serde(default)]
    pub replacement_credit: ReplacementCredit,
    /// Whether live round scoring evaluates games in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            replacement_credit: ReplacementCredit::FinalHolder,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn with_replacement_credit(mut self, credit: ReplacementCredit) -> Self {
        self.replacement_credit = credit;
        self
    }

    /// Evaluate live scores on one thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Tournament configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub name: String,
    /// Name of the system combining game scores into a round score
    pub round_scoring_system: String,
    /// Name of the system combining round scores into a tournament score
    pub tournament_scoring_system: String,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            name: "Tournament".to_string(),
            round_scoring_system: "Best game counts".to_string(),
            tournament_scoring_system: "Sum best 3 rounds".to_string(),
        }
    }
}

impl TournamentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_round_scoring(mut self, system: impl Into<String>) -> Self {
        self.round_scoring_system = system.into();
        self
    }

    pub fn with_tournament_scoring(mut self, system: impl Into<String>) -> Self {
        self.tournament_scoring_system = system.into();
        self
    }
}

/// Round configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Name of the system scoring each game in the round
    pub scoring_system: String,
    /// Draws Include All Survivors
    #[serde(default)]
    pub dias: bool,
    /// Last year played; recording it ends the game
    #[serde(default)]
    pub final_year: Option<u16>,
    #[serde(default)]
    pub earliest_end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub latest_end_time: Option<NaiveDateTime>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            scoring_system: "CDiplo 100".to_string(),
            dias: false,
            final_year: None,
            earliest_end_time: None,
            latest_end_time: None,
        }
    }
}

impl RoundConfig {
    /// Round scored with the named game system
    pub fn scored_by(system: impl Into<String>) -> Self {
        Self {
            scoring_system: system.into(),
            ..Default::default()
        }
    }

    pub fn with_dias(mut self, dias: bool) -> Self {
        self.dias = dias;
        self
    }

    pub fn with_final_year(mut self, year: u16) -> Self {
        self.final_year = Some(year);
        self
    }

    pub fn with_end_times(mut self, earliest: NaiveDateTime, latest: NaiveDateTime) -> Self {
        self.earliest_end_time = Some(earliest);
        self.latest_end_time = Some(latest);
        self
    }

    /// End times must be given together or not at all
    pub fn validate(&self) -> Result<(), String> {
        match (self.earliest_end_time, self.latest_end_time) {
            (Some(_), None) => Err("earliest end time specified without latest end time".to_string()),
            (None, Some(_)) => Err("latest end time specified without earliest end time".to_string()),
            (Some(earliest), Some(latest)) if earliest > latest => {
                Err("earliest end time is after latest end time".to_string())
            }
            _ => Ok(()),
        }
    }
}
