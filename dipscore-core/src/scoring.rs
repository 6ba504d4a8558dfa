//! Game scoring systems
//!
//! Every system reads only the final recorded year of a game's ledger, plus
//! any passed draw, and yields one score per power. A power missing from the
//! final year is scored on its most recent earlier count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draw::DrawProposal;
use crate::error::ScoringError;
use crate::ledger::{CentreCount, CentreCountLedger};
use crate::power::{GreatPower, WINNING_CENTRES};
use crate::tiebreak::allocate_position_points;

/// Score per power for one game
pub type PowerScores = BTreeMap<GreatPower, f64>;

/// Points shared by the winners of a game
const GAME_POINTS: f64 = 100.0;

/// What a scoring system may look at
#[derive(Clone, Copy, Debug)]
pub struct GameSnapshot<'a> {
    pub ledger: &'a CentreCountLedger,
    pub passed_draw: Option<&'a DrawProposal>,
}

impl<'a> GameSnapshot<'a> {
    pub fn new(ledger: &'a CentreCountLedger, passed_draw: Option<&'a DrawProposal>) -> Self {
        Self {
            ledger,
            passed_draw,
        }
    }

    /// Carried final-year counts, largest first. Fails if nothing is recorded.
    fn final_counts(&self) -> Result<Vec<CentreCount>, ScoringError> {
        let counts = self.ledger.final_year_counts();
        if counts.is_empty() {
            return Err(ScoringError::NoCentreCounts);
        }
        Ok(counts)
    }
}

/// Parameters for a CDiplo-style system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CDiploParams {
    /// Awarded to a soloer
    pub soloer_pts: f64,
    /// Awarded to every power when nobody soloed
    pub played_pts: f64,
    pub first_pts: f64,
    pub second_pts: f64,
    pub third_pts: f64,
    /// Awarded to everyone else when somebody soloed
    #[serde(default)]
    pub loss_pts: f64,
}

impl CDiploParams {
    pub fn new(soloer_pts: f64, played_pts: f64, first_pts: f64, second_pts: f64, third_pts: f64) -> Self {
        Self {
            soloer_pts,
            played_pts,
            first_pts,
            second_pts,
            third_pts,
            loss_pts: 0.0,
        }
    }

    pub fn with_loss_pts(mut self, loss_pts: f64) -> Self {
        self.loss_pts = loss_pts;
        self
    }

    fn position_points(&self) -> [f64; 3] {
        [self.first_pts, self.second_pts, self.third_pts]
    }
}

/// How to score one game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameScoring {
    /// Soloers score 100, every other result scores 0
    SoloOrBust,
    /// Soloers score 100; otherwise draw members (or all survivors) split 100
    DrawSize,
    /// Centre count plus position bonus, or fixed points around a solo
    CDiplo(CDiploParams),
    /// Squared centre counts normalised to 100, unless somebody soloed
    SumOfSquares,
}

impl GameScoring {
    /// Compute the score for every power in the game's final year
    pub fn scores(&self, game: &GameSnapshot<'_>) -> Result<PowerScores, ScoringError> {
        let counts = game.final_counts()?;
        match self {
            GameScoring::SoloOrBust => Ok(score_solo_or_bust(&counts)),
            GameScoring::DrawSize => Ok(score_draw_size(&counts, game.passed_draw)),
            GameScoring::CDiplo(params) => Ok(score_cdiplo(&counts, params)),
            GameScoring::SumOfSquares => score_sum_of_squares(&counts),
        }
    }
}

// ============================================================================
// SYSTEMS
// ============================================================================

fn soloed(counts: &[CentreCount]) -> bool {
    counts.iter().any(|cc| cc.count >= WINNING_CENTRES)
}

fn score_solo_or_bust(counts: &[CentreCount]) -> PowerScores {
    counts
        .iter()
        .map(|cc| {
            let score = if cc.count >= WINNING_CENTRES {
                GAME_POINTS
            } else {
                0.0
            };
            (cc.power, score)
        })
        .collect()
}

fn score_draw_size(counts: &[CentreCount], draw: Option<&DrawProposal>) -> PowerScores {
    if soloed(counts) {
        return score_solo_or_bust(counts);
    }

    match draw {
        Some(draw) => {
            let share = GAME_POINTS / draw.draw_size() as f64;
            counts
                .iter()
                .map(|cc| {
                    let score = if draw.includes(cc.power) { share } else { 0.0 };
                    (cc.power, score)
                })
                .collect()
        }
        None => {
            let survivors = counts.iter().filter(|cc| cc.count > 0).count();
            counts
                .iter()
                .map(|cc| {
                    let score = if cc.count > 0 {
                        GAME_POINTS / survivors as f64
                    } else {
                        0.0
                    };
                    (cc.power, score)
                })
                .collect()
        }
    }
}

fn score_cdiplo(counts: &[CentreCount], params: &CDiploParams) -> PowerScores {
    if soloed(counts) {
        return counts
            .iter()
            .map(|cc| {
                let score = if cc.count >= WINNING_CENTRES {
                    params.soloer_pts
                } else {
                    params.loss_pts
                };
                (cc.power, score)
            })
            .collect();
    }

    let raw: Vec<u8> = counts.iter().map(|cc| cc.count).collect();
    let bonuses = allocate_position_points(&raw, &params.position_points());
    counts
        .iter()
        .zip(bonuses)
        .map(|(cc, bonus)| (cc.power, params.played_pts + f64::from(cc.count) + bonus))
        .collect()
}

fn score_sum_of_squares(counts: &[CentreCount]) -> Result<PowerScores, ScoringError> {
    if soloed(counts) {
        return Ok(score_solo_or_bust(counts));
    }

    let sum_of_squares: f64 = counts.iter().map(|cc| f64::from(cc.count).powi(2)).sum();
    if sum_of_squares == 0.0 {
        return Err(ScoringError::NoCentresHeld);
    }
    Ok(counts
        .iter()
        .map(|cc| {
            let score = GAME_POINTS * f64::from(cc.count).powi(2) / sum_of_squares;
            (cc.power, score)
        })
        .collect())
}
