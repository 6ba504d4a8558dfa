//! Live score evaluation for games, rounds and tournaments
//!
//! Level 2 - Phases
//!
//! Everything here is read-only. Stored scores are returned for finished
//! entities unless a recalculation is forced.

use dipscore_core::{GameSnapshot, PowerScores, ScoringRegistry};
use rayon::prelude::*;

use crate::config::{EngineConfig, ReplacementCredit};
use crate::error::EngineResult;
use crate::model::{Game, GameId, PlayerId, PlayerScores, RoundId, TournamentId};
use crate::store::StoreData;

/// Read-only scorer over one consistent view of the store
#[derive(Clone, Copy)]
pub struct LiveScorer<'a> {
    data: &'a StoreData,
    registry: &'a ScoringRegistry,
    config: &'a EngineConfig,
}

impl<'a> LiveScorer<'a> {
    pub fn new(data: &'a StoreData, registry: &'a ScoringRegistry, config: &'a EngineConfig) -> Self {
        Self {
            data,
            registry,
            config,
        }
    }

    // ========================================================================
    // Games
    // ========================================================================

    /// Per-power scores: frozen if finished, otherwise as if it ended now
    pub fn game_scores(&self, id: GameId, force: bool) -> EngineResult<PowerScores> {
        let game = self.data.game(id)?;
        self.scores_for_game(game, force)
    }

    fn scores_for_game(&self, game: &Game, force: bool) -> EngineResult<PowerScores> {
        match &game.final_scores {
            Some(frozen) if !force => Ok(frozen.clone()),
            _ => self.live_game_scores(game),
        }
    }

    /// Score a game with its round's system, ignoring anything stored
    pub fn live_game_scores(&self, game: &Game) -> EngineResult<PowerScores> {
        let round = self.data.round(game.round)?;
        let system = self.registry.find_game(&round.config.scoring_system)?;
        let snapshot = GameSnapshot::new(&game.ledger, game.passed_draw());
        Ok(system.scores(&snapshot)?)
    }

    // ========================================================================
    // Rounds
    // ========================================================================

    /// Per-player round scores
    pub fn round_scores(&self, id: RoundId, force: bool) -> EngineResult<PlayerScores> {
        if !force && self.data.round_is_finished(id)? {
            let round = self.data.round(id)?;
            return Ok(round.players.iter().map(|rp| (rp.player, rp.score)).collect());
        }
        self.live_round_scores(id)
    }

    /// Best-game style aggregation over every game of the round, finished or not
    pub fn live_round_scores(&self, id: RoundId) -> EngineResult<PlayerScores> {
        let round = self.data.round(id)?;
        let tournament = self.data.tournament(round.tournament)?;
        let system = self
            .registry
            .find_round(&tournament.config.round_scoring_system)?;

        let games = self.data.round_games(id)?;
        let per_game: Vec<Vec<(PlayerId, f64)>> = if self.config.parallel {
            games
                .par_iter()
                .map(|game| self.credited_game_scores(game))
                .collect::<EngineResult<_>>()?
        } else {
            games
                .iter()
                .map(|game| self.credited_game_scores(game))
                .collect::<EngineResult<_>>()?
        };

        Ok(system.scores(per_game.into_iter().flatten()))
    }

    fn credited_game_scores(&self, game: &Game) -> EngineResult<Vec<(PlayerId, f64)>> {
        let scores = self.scores_for_game(game, false)?;
        Ok(credited_scores(game, &scores, self.config.replacement_credit))
    }

    // ========================================================================
    // Tournaments
    // ========================================================================

    /// Per-player tournament scores
    pub fn tournament_scores(&self, id: TournamentId, force: bool) -> EngineResult<PlayerScores> {
        let tournament = self.data.tournament(id)?;
        if !force && self.data.tournament_is_finished(id)? {
            return Ok(tournament
                .players
                .iter()
                .map(|tp| (tp.player, tp.score))
                .collect());
        }

        let system = self
            .registry
            .find_tournament(&tournament.config.tournament_scoring_system)?;
        let mut per_round = Vec::new();
        for round_id in &tournament.rounds {
            let scores = self.round_scores(*round_id, false)?;
            let round = self.data.round(*round_id)?;
            per_round.extend(
                round
                    .players
                    .iter()
                    .map(|rp| (rp.player, scores.get(&rp.player).copied().unwrap_or(0.0))),
            );
        }
        Ok(system.scores(per_round))
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// The score each participation record of `game` earns, in record order
pub fn credited_scores(
    game: &Game,
    scores: &PowerScores,
    policy: ReplacementCredit,
) -> Vec<(PlayerId, f64)> {
    game.players
        .iter()
        .map(|gp| {
            let power_score = scores.get(&gp.power).copied().unwrap_or(0.0);
            let credited = match policy {
                ReplacementCredit::EveryHolder => true,
                ReplacementCredit::FinalHolder => game
                    .final_holder(gp.power)
                    .is_some_and(|holder| holder.player == gp.player && holder.first == gp.first),
            };
            (gp.player, if credited { power_score } else { 0.0 })
        })
        .collect()
}
