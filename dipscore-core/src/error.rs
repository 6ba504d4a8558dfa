//! Error types for validation and scoring

use crate::power::GreatPower;
use std::fmt;

/// Which ledger progression rule was broken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressionRule {
    /// Count more than doubled since the previous year
    MoreThanDoubled,
    /// Count rose from zero (eliminations are permanent)
    RecoveredFromZero,
}

impl fmt::Display for ProgressionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionRule::MoreThanDoubled => {
                f.write_str("centre count cannot more than double in a year")
            }
            ProgressionRule::RecoveredFromZero => {
                f.write_str("centre count cannot increase from zero")
            }
        }
    }
}

/// Conflicts between a draw proposal and the state of its game
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DrawConflict {
    #[error("game already has a successful draw proposal")]
    AlreadyPassed,

    #[error("dead power {0} included in proposal")]
    DeadPowerIncluded(GreatPower),

    #[error("missing surviving power {0} in DIAS game")]
    MissingSurvivor(GreatPower),
}

/// Bad input shape or range. Never mutates state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{year} is not a valid game year (earliest is {earliest})")]
    InvalidYear { year: u16, earliest: u16 },

    #[error("games in this round end with {final_year}, cannot record {year}")]
    YearAfterRoundEnd { year: u16, final_year: u16 },

    #[error("{count} is not a valid centre count (0-{max})")]
    InvalidCount { count: u8, max: u8 },

    #[error("{power} in {year}: {rule} (was {previous}, now {count})")]
    InvalidProgression {
        power: GreatPower,
        year: u16,
        previous: u8,
        count: u8,
        rule: ProgressionRule,
    },

    #[error(transparent)]
    DrawProposalConflict(#[from] DrawConflict),

    #[error("invalid draw proposal: {0}")]
    InvalidDrawProposal(String),
}

/// Failures while computing scores
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid scoring system: {0}")]
    InvalidScoringSystem(String),

    #[error("no centre counts recorded for game")]
    NoCentreCounts,

    #[error("no centres held by any power in the final year")]
    NoCentresHeld,
}
