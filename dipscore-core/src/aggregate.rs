//! Round and tournament scoring - combining lower-level scores per player

use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How to combine a player's game scores into a round score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundScoring {
    /// A player's best game in the round counts
    BestGame,
}

impl RoundScoring {
    /// Combine `(player, game score)` pairs into one score per player.
    ///
    /// A player may appear any number of times (several games, or a
    /// replacement in one game).
    pub fn scores<K, I>(&self, game_scores: I) -> FxHashMap<K, f64>
    where
        K: Eq + Hash,
        I: IntoIterator<Item = (K, f64)>,
    {
        match self {
            RoundScoring::BestGame => {
                let mut best: FxHashMap<K, f64> = FxHashMap::default();
                for (player, score) in game_scores {
                    best.entry(player)
                        .and_modify(|b| *b = b.max(score))
                        .or_insert(score);
                }
                best
            }
        }
    }
}

/// How to combine a player's round scores into a tournament score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TournamentScoring {
    /// Sum of a player's best `rounds` round scores
    SumBest { rounds: usize },
}

impl TournamentScoring {
    /// Combine `(player, round score)` pairs, one per round played
    pub fn scores<K, I>(&self, round_scores: I) -> FxHashMap<K, f64>
    where
        K: Eq + Hash,
        I: IntoIterator<Item = (K, f64)>,
    {
        match self {
            TournamentScoring::SumBest { rounds } => {
                let mut per_player: FxHashMap<K, Vec<f64>> = FxHashMap::default();
                for (player, score) in round_scores {
                    per_player.entry(player).or_default().push(score);
                }
                per_player
                    .into_iter()
                    .map(|(player, mut scores)| {
                        scores.sort_by(|a, b| b.total_cmp(a));
                        let total = scores.iter().take(*rounds).sum();
                        (player, total)
                    })
                    .collect()
            }
        }
    }
}
