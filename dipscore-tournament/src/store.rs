//! Entity storage
//!
//! Mutations run inside `transaction`, which either commits every change the
//! closure made or none of them.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::model::{Game, GameId, Player, PlayerId, Round, RoundId, Tournament, TournamentId};

/// All persisted entities
#[derive(Clone, Debug, Default)]
pub struct StoreData {
    next_id: u32,
    pub players: BTreeMap<PlayerId, Player>,
    pub tournaments: BTreeMap<TournamentId, Tournament>,
    pub rounds: BTreeMap<RoundId, Round>,
    pub games: BTreeMap<GameId, Game>,
}

impl StoreData {
    /// Allocate a fresh id, unique across all entity kinds
    pub fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn player(&self, id: PlayerId) -> EngineResult<&Player> {
        self.players.get(&id).ok_or(EngineError::UnknownPlayer(id))
    }

    pub fn tournament(&self, id: TournamentId) -> EngineResult<&Tournament> {
        self.tournaments
            .get(&id)
            .ok_or(EngineError::UnknownTournament(id))
    }

    pub fn tournament_mut(&mut self, id: TournamentId) -> EngineResult<&mut Tournament> {
        self.tournaments
            .get_mut(&id)
            .ok_or(EngineError::UnknownTournament(id))
    }

    pub fn round(&self, id: RoundId) -> EngineResult<&Round> {
        self.rounds.get(&id).ok_or(EngineError::UnknownRound(id))
    }

    pub fn round_mut(&mut self, id: RoundId) -> EngineResult<&mut Round> {
        self.rounds.get_mut(&id).ok_or(EngineError::UnknownRound(id))
    }

    pub fn game(&self, id: GameId) -> EngineResult<&Game> {
        self.games.get(&id).ok_or(EngineError::UnknownGame(id))
    }

    pub fn game_mut(&mut self, id: GameId) -> EngineResult<&mut Game> {
        self.games.get_mut(&id).ok_or(EngineError::UnknownGame(id))
    }

    /// Games of a round, in creation order
    pub fn round_games(&self, id: RoundId) -> EngineResult<Vec<&Game>> {
        self.round(id)?
            .games
            .iter()
            .map(|game| self.game(*game))
            .collect()
    }

    /// A round is finished once it has games and all of them are finished
    pub fn round_is_finished(&self, id: RoundId) -> EngineResult<bool> {
        let games = self.round_games(id)?;
        Ok(!games.is_empty() && games.iter().all(|g| g.is_finished()))
    }

    /// A tournament is finished once it has rounds and all of them are finished
    pub fn tournament_is_finished(&self, id: TournamentId) -> EngineResult<bool> {
        let tournament = self.tournament(id)?;
        if tournament.rounds.is_empty() {
            return Ok(false);
        }
        for round in &tournament.rounds {
            if !self.round_is_finished(*round)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Transactional access to the entity store
pub trait TournamentStore: Send + Sync {
    /// Run a read-only closure against a consistent view
    fn read<T>(&self, f: impl FnOnce(&StoreData) -> EngineResult<T>) -> EngineResult<T>;

    /// Run a mutating closure; nothing is kept unless it returns `Ok`
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> EngineResult<T>,
    ) -> EngineResult<T>;
}

/// In-process store: clone, mutate, swap
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TournamentStore for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&StoreData) -> EngineResult<T>) -> EngineResult<T> {
        let data = self.data.read().map_err(|_| EngineError::StorePoisoned)?;
        f(&data)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> EngineResult<T>,
    ) -> EngineResult<T> {
        // Holding the write lock for the whole closure serialises writers
        let mut data = self.data.write().map_err(|_| EngineError::StorePoisoned)?;
        let mut working = data.clone();
        let result = f(&mut working)?;
        *data = working;
        Ok(result)
    }
}
