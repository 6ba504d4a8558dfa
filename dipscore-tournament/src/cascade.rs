//! Finalization cascade
//!
//! Level 2 - Phases
//!
//! When a game finishes its scores are frozen. If that completes the round,
//! round scores are frozen too, and likewise for the tournament. Each level
//! is written once; callers run this inside the same transaction as the
//! write that finished the game.

use dipscore_core::ScoringRegistry;
use serde::Serialize;

use crate::completion::FinishReason;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::model::{GameId, RoundId, TournamentId};
use crate::scores::{credited_scores, LiveScorer};
use crate::store::StoreData;

/// What one finalization froze
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CascadeReport {
    pub game: GameId,
    pub reason: FinishReason,
    /// Set when the game completed its round
    pub round_finalized: Option<RoundId>,
    /// Set when the round completed its tournament
    pub tournament_finalized: Option<TournamentId>,
}

/// Freezes scores level by level after a game finishes
pub struct FinalizationCoordinator<'a> {
    registry: &'a ScoringRegistry,
    config: &'a EngineConfig,
}

impl<'a> FinalizationCoordinator<'a> {
    pub fn new(registry: &'a ScoringRegistry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    // ========================================================================
    // Level 1 - Orchestration
    // ========================================================================

    /// Freeze a finished game and whatever it completes.
    ///
    /// Returns `None` when the game was already finalized.
    pub fn finalize_game(
        &self,
        data: &mut StoreData,
        id: GameId,
        reason: FinishReason,
    ) -> EngineResult<Option<CascadeReport>> {
        if data.game(id)?.final_scores.is_some() {
            tracing::debug!("Game {} already finalized, skipping cascade", id);
            return Ok(None);
        }

        let round = self.freeze_game(data, id)?;
        let mut report = CascadeReport {
            game: id,
            reason,
            round_finalized: None,
            tournament_finalized: None,
        };

        if !data.round_is_finished(round)? {
            return Ok(Some(report));
        }
        let tournament = self.freeze_round(data, round)?;
        report.round_finalized = Some(round);

        if data.tournament_is_finished(tournament)? {
            self.freeze_tournament(data, tournament)?;
            report.tournament_finalized = Some(tournament);
        }
        Ok(Some(report))
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    fn freeze_game(&self, data: &mut StoreData, id: GameId) -> EngineResult<RoundId> {
        let (scores, credited) = {
            let game = data.game(id)?;
            let scores = LiveScorer::new(data, self.registry, self.config).live_game_scores(game)?;
            let credited = credited_scores(game, &scores, self.config.replacement_credit);
            (scores, credited)
        };

        let game = data.game_mut(id)?;
        for (record, (_, score)) in game.players.iter_mut().zip(credited) {
            record.score = score;
        }
        tracing::info!("Game {} ({}) finalized: {:?}", game.name, id, scores);
        game.final_scores = Some(scores);
        Ok(game.round)
    }

    fn freeze_round(&self, data: &mut StoreData, id: RoundId) -> EngineResult<TournamentId> {
        let scores = LiveScorer::new(data, self.registry, self.config).live_round_scores(id)?;

        let round = data.round_mut(id)?;
        // Players without a game keep their stored score
        for record in &mut round.players {
            if let Some(score) = scores.get(&record.player) {
                record.score = *score;
            }
        }
        tracing::info!("Round {} ({}) finalized for {} players", round.number, id, scores.len());
        Ok(round.tournament)
    }

    fn freeze_tournament(&self, data: &mut StoreData, id: TournamentId) -> EngineResult<()> {
        let scores = LiveScorer::new(data, self.registry, self.config).tournament_scores(id, true)?;

        let tournament = data.tournament_mut(id)?;
        for record in &mut tournament.players {
            record.score = scores.get(&record.player).copied().unwrap_or(0.0);
        }
        tracing::info!("Tournament {} ({}) finalized", tournament.config.name, id);
        Ok(())
    }
}
