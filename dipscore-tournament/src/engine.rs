//! Scoring engine - the transactional entry point
//!
//! Level 1 - Orchestration
//!
//! Every write follows the same shape inside one store transaction:
//! validate and record, offer the event to the completion state machine,
//! and run the finalization cascade if the game just finished. Any error
//! leaves the store untouched.

use std::sync::Arc;

use chrono::NaiveDateTime;
use dipscore_core::{CentreCount, DrawProposal, GreatPower, PowerScores, ScoringRegistry};

use crate::cascade::{CascadeReport, FinalizationCoordinator};
use crate::completion::{advance, GameEvent, GameResult, Transition};
use crate::config::{EngineConfig, RoundConfig, TournamentConfig};
use crate::error::{EngineError, EngineResult};
use crate::model::{
    Game, GameId, GamePlayer, Player, PlayerId, PlayerScores, Round, RoundId, RoundPlayer,
    Tournament, TournamentId, TournamentPlayer,
};
use crate::scores::LiveScorer;
use crate::store::{MemoryStore, StoreData, TournamentStore};

/// Anything that can be scored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Game(GameId),
    Round(RoundId),
    Tournament(TournamentId),
}

/// Scores keyed by power (games) or by player (rounds, tournaments)
#[derive(Clone, Debug, PartialEq)]
pub enum Scores {
    Powers(PowerScores),
    Players(PlayerScores),
}

/// Records game events and reports scores
pub struct ScoringEngine<S: TournamentStore = MemoryStore> {
    store: S,
    registry: Arc<ScoringRegistry>,
    config: EngineConfig,
}

impl ScoringEngine<MemoryStore> {
    /// Engine over an empty in-memory store
    pub fn new(registry: Arc<ScoringRegistry>, config: EngineConfig) -> Self {
        Self::with_store(MemoryStore::new(), registry, config)
    }

    /// Engine with the standard systems and default configuration
    pub fn standard() -> Self {
        Self::new(Arc::new(ScoringRegistry::standard()), EngineConfig::default())
    }
}

impl<S: TournamentStore> ScoringEngine<S> {
    pub fn with_store(store: S, registry: Arc<ScoringRegistry>, config: EngineConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &ScoringRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Setup
    // ========================================================================

    pub fn register_player(&self, name: impl Into<String>) -> EngineResult<PlayerId> {
        let name = name.into();
        self.store.transaction(|data| {
            let id = PlayerId(data.allocate_id());
            data.players.insert(id, Player { id, name });
            Ok(id)
        })
    }

    /// Create a tournament; its scoring systems must be registered
    pub fn create_tournament(&self, config: TournamentConfig) -> EngineResult<TournamentId> {
        self.registry.find_round(&config.round_scoring_system)?;
        self.registry
            .find_tournament(&config.tournament_scoring_system)?;

        self.store.transaction(|data| {
            let id = TournamentId(data.allocate_id());
            tracing::info!("Created tournament {} ({})", config.name, id);
            data.tournaments.insert(
                id,
                Tournament {
                    id,
                    config,
                    rounds: Vec::new(),
                    players: Vec::new(),
                },
            );
            Ok(id)
        })
    }

    /// Register a player for a tournament. Registering twice is a no-op.
    pub fn add_tournament_player(&self, tournament: TournamentId, player: PlayerId) -> EngineResult<()> {
        self.store.transaction(|data| {
            data.player(player)?;
            let tournament = data.tournament_mut(tournament)?;
            if !tournament.has_player(player) {
                tournament.players.push(TournamentPlayer { player, score: 0.0 });
            }
            Ok(())
        })
    }

    /// Append a round, numbered after the existing ones
    pub fn add_round(&self, tournament: TournamentId, config: RoundConfig) -> EngineResult<RoundId> {
        self.registry.find_game(&config.scoring_system)?;
        config.validate().map_err(EngineError::InvalidRoundConfig)?;

        self.store.transaction(|data| {
            let number = data.tournament(tournament)?.rounds.len() as u32 + 1;
            let id = RoundId(data.allocate_id());
            data.rounds.insert(
                id,
                Round {
                    id,
                    tournament,
                    number,
                    config,
                    games: Vec::new(),
                    players: Vec::new(),
                },
            );
            data.tournament_mut(tournament)?.rounds.push(id);
            Ok(id)
        })
    }

    /// Register a player for a round. Registering twice is a no-op.
    pub fn add_round_player(&self, round: RoundId, player: PlayerId) -> EngineResult<()> {
        self.store
            .transaction(|data| ensure_round_player(data, round, player))
    }

    /// Add a game to a round, seeded with the starting centre counts
    pub fn add_game(&self, round: RoundId, name: impl Into<String>) -> EngineResult<GameId> {
        let name = name.into();
        self.store.transaction(|data| {
            data.round(round)?;
            let id = GameId(data.allocate_id());
            data.games.insert(id, Game::new(id, name, round));
            data.round_mut(round)?.games.push(id);
            Ok(id)
        })
    }

    /// Seat a player on a game.
    ///
    /// The player must be registered in the tournament and is added to the
    /// round if not already there.
    pub fn add_game_player(&self, game: GameId, record: GamePlayer) -> EngineResult<()> {
        self.store.transaction(|data| {
            let round = data.game(game)?.round;
            ensure_round_player(data, round, record.player)?;
            data.game_mut(game)?.add_player(record)
        })
    }

    // ========================================================================
    // Game events
    // ========================================================================

    /// Record one power's centre count for one year
    pub fn record_centre_count(
        &self,
        game: GameId,
        power: GreatPower,
        year: u16,
        count: u8,
    ) -> EngineResult<Option<CascadeReport>> {
        self.store.transaction(|data| {
            let final_year = data.round(data.game(game)?.round)?.config.final_year;
            let record = data.game_mut(game)?;
            let replaced = record.ledger.record(power, year, count, final_year)?;
            tracing::debug!(
                "Game {}: {} has {} centres in {} (was {:?})",
                game,
                power,
                count,
                year,
                replaced
            );

            let event = GameEvent::CentreCount(CentreCount { power, year, count });
            let transition = advance(record, &event, final_year);
            self.after_transition(data, game, transition)
        })
    }

    /// Record a whole year of centre counts at once.
    ///
    /// Every count is stored before the state machine sees any of them, so
    /// a game ending this year is scored on the complete year.
    pub fn record_centre_counts(
        &self,
        game: GameId,
        year: u16,
        counts: &[(GreatPower, u8)],
    ) -> EngineResult<Option<CascadeReport>> {
        self.store.transaction(|data| {
            let final_year = data.round(data.game(game)?.round)?.config.final_year;
            let record = data.game_mut(game)?;
            for &(power, count) in counts {
                record.ledger.record(power, year, count, final_year)?;
            }
            tracing::debug!("Game {}: recorded {} counts for {}", game, counts.len(), year);

            // Largest first, so a solo wins over reaching the final year
            let mut events: Vec<CentreCount> = counts
                .iter()
                .map(|&(power, count)| CentreCount { power, year, count })
                .collect();
            events.sort_by(|a, b| b.count.cmp(&a.count));

            let mut transition = Transition::Stayed;
            for cc in events {
                transition = advance(record, &GameEvent::CentreCount(cc), final_year);
                if transition != Transition::Stayed {
                    break;
                }
            }
            self.after_transition(data, game, transition)
        })
    }

    /// Record a draw or concession vote
    pub fn record_draw_proposal(
        &self,
        game: GameId,
        proposal: DrawProposal,
    ) -> EngineResult<Option<CascadeReport>> {
        self.store.transaction(|data| {
            let dias = data.round(data.game(game)?.round)?.config.dias;
            let record = data.game_mut(game)?;
            proposal.validate(&record.ledger, dias, record.passed_draw().is_some())?;
            tracing::debug!(
                "Game {}: draw vote {:?} in {} {} {}",
                game,
                proposal.powers(),
                proposal.season,
                proposal.year,
                if proposal.passed { "passed" } else { "failed" }
            );

            let transition = advance(record, &GameEvent::DrawProposal(&proposal), None);
            record.draw_proposals.push(proposal);
            self.after_transition(data, game, transition)
        })
    }

    /// End a game by outside decision
    pub fn mark_ended(&self, game: GameId) -> EngineResult<Option<CascadeReport>> {
        self.store.transaction(|data| {
            let transition = advance(data.game_mut(game)?, &GameEvent::MarkEnded, None);
            self.after_transition(data, game, transition)
        })
    }

    /// End every unfinished game of a round whose latest end time has passed
    pub fn close_expired_round(
        &self,
        round: RoundId,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<CascadeReport>> {
        self.store.transaction(|data| {
            let round = data.round(round)?;
            let expired = round.config.latest_end_time.is_some_and(|latest| now >= latest);
            if !expired {
                return Ok(Vec::new());
            }
            tracing::info!("Round {} ({}) out of time, ending open games", round.number, round.id);

            let mut reports = Vec::new();
            for game in round.games.clone() {
                let transition = advance(data.game_mut(game)?, &GameEvent::MarkEnded, None);
                if let Some(report) = self.after_transition(data, game, transition)? {
                    reports.push(report);
                }
            }
            Ok(reports)
        })
    }

    fn after_transition(
        &self,
        data: &mut StoreData,
        game: GameId,
        transition: Transition,
    ) -> EngineResult<Option<CascadeReport>> {
        match transition {
            Transition::Finished(reason) => {
                tracing::info!("Game {} finished: {:?}", game, reason);
                FinalizationCoordinator::new(&self.registry, &self.config)
                    .finalize_game(data, game, reason)
            }
            Transition::Stayed | Transition::AlreadyFinished => Ok(None),
        }
    }

    // ========================================================================
    // Scores
    // ========================================================================

    /// Scores for any entity; `force` recomputes even when finished
    pub fn scores(&self, entity: EntityRef, force: bool) -> EngineResult<Scores> {
        match entity {
            EntityRef::Game(id) => self.game_scores(id, force).map(Scores::Powers),
            EntityRef::Round(id) => self.round_scores(id, force).map(Scores::Players),
            EntityRef::Tournament(id) => self.tournament_scores(id, force).map(Scores::Players),
        }
    }

    pub fn game_scores(&self, id: GameId, force: bool) -> EngineResult<PowerScores> {
        self.store.read(|data| self.scorer(data).game_scores(id, force))
    }

    pub fn round_scores(&self, id: RoundId, force: bool) -> EngineResult<PlayerScores> {
        self.store.read(|data| self.scorer(data).round_scores(id, force))
    }

    pub fn tournament_scores(&self, id: TournamentId, force: bool) -> EngineResult<PlayerScores> {
        self.store
            .read(|data| self.scorer(data).tournament_scores(id, force))
    }

    fn scorer<'a>(&'a self, data: &'a StoreData) -> LiveScorer<'a> {
        LiveScorer::new(data, &self.registry, &self.config)
    }

    /// Stored for games, derived for rounds and tournaments
    pub fn is_finished(&self, entity: EntityRef) -> EngineResult<bool> {
        self.store.read(|data| match entity {
            EntityRef::Game(id) => Ok(data.game(id)?.is_finished()),
            EntityRef::Round(id) => data.round_is_finished(id),
            EntityRef::Tournament(id) => data.tournament_is_finished(id),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn player(&self, id: PlayerId) -> EngineResult<Player> {
        self.store.read(|data| data.player(id).cloned())
    }

    pub fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.store.read(|data| data.tournament(id).cloned())
    }

    pub fn round(&self, id: RoundId) -> EngineResult<Round> {
        self.store.read(|data| data.round(id).cloned())
    }

    pub fn game(&self, id: GameId) -> EngineResult<Game> {
        self.store.read(|data| data.game(id).cloned())
    }

    pub fn game_result(&self, id: GameId) -> EngineResult<GameResult> {
        self.store.read(|data| Ok(GameResult::of(data.game(id)?)))
    }

    /// The power with a winning count in the final recorded year
    pub fn soloer(&self, id: GameId) -> EngineResult<Option<CentreCount>> {
        self.store.read(|data| Ok(data.game(id)?.ledger.soloer()))
    }

    pub fn board_toppers(&self, id: GameId) -> EngineResult<Vec<CentreCount>> {
        self.store.read(|data| Ok(data.game(id)?.ledger.board_toppers()))
    }

    /// Unowned centres in `year`, or in the final recorded year
    pub fn neutrals(&self, id: GameId, year: Option<u16>) -> EngineResult<Option<u8>> {
        self.store.read(|data| Ok(data.game(id)?.ledger.neutrals(year)))
    }

    /// First unfinished round, in number order
    pub fn current_round(&self, id: TournamentId) -> EngineResult<Option<RoundId>> {
        self.store.read(|data| {
            for round in &data.tournament(id)?.rounds {
                if !data.round_is_finished(*round)? {
                    return Ok(Some(*round));
                }
            }
            Ok(None)
        })
    }
}

fn ensure_round_player(data: &mut StoreData, round: RoundId, player: PlayerId) -> EngineResult<()> {
    let tournament = data.round(round)?.tournament;
    if !data.tournament(tournament)?.has_player(player) {
        return Err(EngineError::PlayerNotInTournament { player, tournament });
    }
    let round = data.round_mut(round)?;
    if !round.players.iter().any(|rp| rp.player == player) {
        round.players.push(RoundPlayer { player, score: 0.0 });
    }
    Ok(())
}
