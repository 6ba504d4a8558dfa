//! Great Powers and board constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Supply centres on the standard board
pub const TOTAL_CENTRES: u8 = 34;

/// Centres needed to win outright (majority plus one)
pub const WINNING_CENTRES: u8 = TOTAL_CENTRES / 2 + 1;

/// First playable game year
pub const FIRST_YEAR: u16 = 1901;

/// Year of the synthetic start-of-game centre counts
pub const START_YEAR: u16 = FIRST_YEAR - 1;

/// Number of Great Powers in a game
pub const POWER_COUNT: usize = 7;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One of the seven playable factions.
///
/// Variant order is the canonical order used for storage and display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GreatPower {
    Austria,
    England,
    France,
    Germany,
    Italy,
    Russia,
    Turkey,
}

impl GreatPower {
    /// All powers in canonical order
    pub const ALL: [GreatPower; POWER_COUNT] = [
        GreatPower::Austria,
        GreatPower::England,
        GreatPower::France,
        GreatPower::Germany,
        GreatPower::Italy,
        GreatPower::Russia,
        GreatPower::Turkey,
    ];

    /// Centres held at the start of a game
    pub fn starting_centres(self) -> u8 {
        match self {
            GreatPower::Russia => 4,
            _ => 3,
        }
    }

    /// Single-letter abbreviation
    pub fn abbreviation(self) -> char {
        match self {
            GreatPower::Austria => 'A',
            GreatPower::England => 'E',
            GreatPower::France => 'F',
            GreatPower::Germany => 'G',
            GreatPower::Italy => 'I',
            GreatPower::Russia => 'R',
            GreatPower::Turkey => 'T',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GreatPower::Austria => "Austria",
            GreatPower::England => "England",
            GreatPower::France => "France",
            GreatPower::Germany => "Germany",
            GreatPower::Italy => "Italy",
            GreatPower::Russia => "Russia",
            GreatPower::Turkey => "Turkey",
        }
    }

    /// Position in canonical order (0-6)
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for GreatPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a power name or abbreviation is not recognised
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown power: {0}")]
pub struct UnknownPower(pub String);

impl FromStr for GreatPower {
    type Err = UnknownPower;

    /// Accepts full names or abbreviations, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        GreatPower::ALL
            .iter()
            .copied()
            .find(|p| {
                p.name().eq_ignore_ascii_case(trimmed)
                    || (trimmed.len() == 1
                        && trimmed
                            .chars()
                            .next()
                            .is_some_and(|c| c.eq_ignore_ascii_case(&p.abbreviation())))
            })
            .ok_or_else(|| UnknownPower(trimmed.to_string()))
    }
}

/// Season within a game year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Fall,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => f.write_str("Spring"),
            Season::Fall => f.write_str("Fall"),
        }
    }
}
