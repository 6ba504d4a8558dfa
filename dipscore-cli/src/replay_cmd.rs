//! Replay command - run a scripted tournament through the scoring engine
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_script(), build_tournament(), apply_events(), collect_report()
//! - Level 3: apply_event(), standings()
//! - Level 4: script format, output formatting

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use serde::{Deserialize, Serialize};

use dipscore_core::{DrawProposal, GameScoringSystem, GreatPower, PowerScores, ScoringRegistry, Season};
use dipscore_tournament::{
    EngineConfig, EntityRef, GameId, GamePlayer, GameResult, PlayerId, PlayerScores, RoundConfig,
    RoundId, ScoringEngine, TournamentConfig, TournamentId, Turn,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ReplayArgs {
    /// Tournament script (JSON)
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Recompute every score instead of reading finalized ones
    #[arg(long)]
    pub force: bool,
}

/// A whole tournament: setup followed by an ordered list of events
#[derive(Debug, Deserialize)]
pub struct Script {
    pub tournament: TournamentConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Extra game scoring systems, registered before anything else
    #[serde(default)]
    pub systems: Vec<GameScoringSystem>,
    pub players: Vec<String>,
    pub rounds: Vec<RoundScript>,
    #[serde(default)]
    pub events: Vec<EventScript>,
}

#[derive(Debug, Deserialize)]
pub struct RoundScript {
    #[serde(flatten)]
    pub config: RoundConfig,
    #[serde(default)]
    pub games: Vec<GameScript>,
}

#[derive(Debug, Deserialize)]
pub struct GameScript {
    /// Unique across the script; events refer to games by name
    pub name: String,
    pub seats: Vec<SeatScript>,
}

#[derive(Debug, Deserialize)]
pub struct SeatScript {
    pub power: String,
    pub player: String,
    #[serde(default)]
    pub first: Option<Turn>,
    #[serde(default)]
    pub last: Option<Turn>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventScript {
    CentreCount {
        game: String,
        power: String,
        year: u16,
        count: u8,
    },
    CentreCounts {
        game: String,
        year: u16,
        counts: BTreeMap<String, u8>,
    },
    Draw {
        game: String,
        year: u16,
        season: Season,
        powers: Vec<String>,
        passed: bool,
        #[serde(default)]
        proposer: Option<String>,
        #[serde(default)]
        votes: Option<u8>,
    },
    EndGame {
        game: String,
    },
    CloseRound {
        round: u32,
        now: NaiveDateTime,
    },
}

/// Ids of everything the script created
struct Setup {
    tournament: TournamentId,
    players: BTreeMap<String, PlayerId>,
    rounds: Vec<(u32, RoundId)>,
    games: BTreeMap<String, (u32, GameId)>,
}

impl Setup {
    fn player(&self, name: &str) -> Result<PlayerId> {
        self.players
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown player '{}'", name))
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.players
            .iter()
            .find(|(_, p)| **p == id)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn game(&self, name: &str) -> Result<GameId> {
        self.games
            .get(name)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow!("unknown game '{}'", name))
    }

    fn round(&self, number: u32) -> Result<RoundId> {
        self.rounds
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow!("unknown round {}", number))
    }
}

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub tournament: String,
    pub finished: bool,
    pub games: Vec<GameReport>,
    pub rounds: Vec<RoundReport>,
    pub standings: Vec<Standing>,
}

#[derive(Debug, Serialize)]
pub struct GameReport {
    pub round: u32,
    pub name: String,
    pub finished: bool,
    pub result: GameResult,
    pub scores: PowerScores,
}

#[derive(Debug, Serialize)]
pub struct RoundReport {
    pub number: u32,
    pub finished: bool,
    pub standings: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub player: String,
    pub score: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run replay command
///
/// 1. Load the script
/// 2. Build the tournament it describes
/// 3. Apply its events in order
/// 4. Report scores
pub fn run(args: ReplayArgs) -> Result<()> {
    let script = load_script(&args.script)?;
    tracing::info!(
        "Replaying {}: {} players, {} rounds, {} events",
        script.tournament.name,
        script.players.len(),
        script.rounds.len(),
        script.events.len()
    );

    let report = replay(&script, args.force)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

/// Build, play and score a script
pub fn replay(script: &Script, force: bool) -> Result<ReplayReport> {
    let engine = ScoringEngine::new(Arc::new(build_registry(script)), script.engine.clone());
    let setup = build_tournament(&engine, script)?;
    apply_events(&engine, &setup, &script.events)?;
    collect_report(&engine, &setup, force)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

pub fn load_script(path: &Path) -> Result<Script> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse script: {}", path.display()))
}

fn build_registry(script: &Script) -> ScoringRegistry {
    let mut registry = ScoringRegistry::standard();
    for system in &script.systems {
        tracing::debug!("Registering game system {}", system.name);
        registry.register_game(system.clone());
    }
    registry
}

fn build_tournament(engine: &ScoringEngine, script: &Script) -> Result<Setup> {
    let tournament = engine.create_tournament(script.tournament.clone())?;

    let mut players = BTreeMap::new();
    for name in &script.players {
        let id = engine.register_player(name.clone())?;
        engine.add_tournament_player(tournament, id)?;
        if players.insert(name.clone(), id).is_some() {
            bail!("player '{}' listed twice", name);
        }
    }

    let mut setup = Setup {
        tournament,
        players,
        rounds: Vec::new(),
        games: BTreeMap::new(),
    };

    for (index, round_script) in script.rounds.iter().enumerate() {
        let number = index as u32 + 1;
        let round = engine
            .add_round(tournament, round_script.config.clone())
            .with_context(|| format!("Invalid round {}", number))?;
        setup.rounds.push((number, round));

        for game_script in &round_script.games {
            if setup.games.contains_key(&game_script.name) {
                bail!("game '{}' defined twice", game_script.name);
            }
            let game = engine.add_game(round, game_script.name.clone())?;
            for seat in &game_script.seats {
                let record = seat_record(&setup, seat)?;
                engine
                    .add_game_player(game, record)
                    .with_context(|| format!("Cannot seat {} in {}", seat.player, game_script.name))?;
            }
            setup.games.insert(game_script.name.clone(), (number, game));
        }
    }
    Ok(setup)
}

fn apply_events(engine: &ScoringEngine, setup: &Setup, events: &[EventScript]) -> Result<()> {
    for (index, event) in events.iter().enumerate() {
        apply_event(engine, setup, event)
            .with_context(|| format!("Event {} failed: {:?}", index + 1, event))?;
    }
    Ok(())
}

fn collect_report(engine: &ScoringEngine, setup: &Setup, force: bool) -> Result<ReplayReport> {
    let tournament = engine.tournament(setup.tournament)?;

    let mut games = Vec::new();
    for (name, (round, id)) in &setup.games {
        games.push(GameReport {
            round: *round,
            name: name.clone(),
            finished: engine.is_finished(EntityRef::Game(*id))?,
            result: engine.game_result(*id)?,
            scores: engine.game_scores(*id, force)?,
        });
    }
    games.sort_by(|a, b| a.round.cmp(&b.round).then_with(|| a.name.cmp(&b.name)));

    let mut rounds = Vec::new();
    for (number, id) in &setup.rounds {
        let scores = engine.round_scores(*id, force)?;
        rounds.push(RoundReport {
            number: *number,
            finished: engine.is_finished(EntityRef::Round(*id))?,
            standings: standings(&scores, setup),
        });
    }

    let scores = engine.tournament_scores(setup.tournament, force)?;
    Ok(ReplayReport {
        tournament: tournament.config.name,
        finished: engine.is_finished(EntityRef::Tournament(setup.tournament))?,
        games,
        rounds,
        standings: standings(&scores, setup),
    })
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn apply_event(engine: &ScoringEngine, setup: &Setup, event: &EventScript) -> Result<()> {
    let report = match event {
        EventScript::CentreCount {
            game,
            power,
            year,
            count,
        } => {
            let power: GreatPower = power.parse()?;
            engine.record_centre_count(setup.game(game)?, power, *year, *count)?
        }
        EventScript::CentreCounts { game, year, counts } => {
            let counts = counts
                .iter()
                .map(|(power, count)| Ok((power.parse::<GreatPower>()?, *count)))
                .collect::<Result<Vec<_>>>()?;
            engine.record_centre_counts(setup.game(game)?, *year, &counts)?
        }
        EventScript::Draw {
            game,
            year,
            season,
            powers,
            passed,
            proposer,
            votes,
        } => {
            let powers = powers
                .iter()
                .map(|p| p.parse::<GreatPower>().map_err(Into::into))
                .collect::<Result<Vec<_>>>()?;
            let mut proposal = DrawProposal::new(*year, *season, &powers, *passed);
            if let Some(proposer) = proposer {
                proposal = proposal.with_proposer(proposer.parse()?);
            }
            if let Some(votes) = votes {
                proposal = proposal.with_votes(*votes);
            }
            engine.record_draw_proposal(setup.game(game)?, proposal)?
        }
        EventScript::EndGame { game } => engine.mark_ended(setup.game(game)?)?,
        EventScript::CloseRound { round, now } => {
            let reports = engine.close_expired_round(setup.round(*round)?, *now)?;
            tracing::info!("Round {} closed at {}: {} games ended", round, now, reports.len());
            reports.into_iter().last()
        }
    };

    if let Some(report) = report {
        tracing::info!(
            "{} finished ({:?}){}{}",
            report.game,
            report.reason,
            if report.round_finalized.is_some() { ", round complete" } else { "" },
            if report.tournament_finalized.is_some() { ", tournament complete" } else { "" }
        );
    }
    Ok(())
}

fn seat_record(setup: &Setup, seat: &SeatScript) -> Result<GamePlayer> {
    let power: GreatPower = seat.power.parse()?;
    let mut record = GamePlayer::new(setup.player(&seat.player)?, power);
    if let Some(first) = seat.first {
        record = record.from_turn(first);
    }
    if let Some(last) = seat.last {
        record = record.until(last);
    }
    Ok(record)
}

/// Highest score first, ties by name
fn standings(scores: &PlayerScores, setup: &Setup) -> Vec<Standing> {
    let mut table: Vec<Standing> = scores
        .iter()
        .map(|(player, score)| Standing {
            player: setup.player_name(*player),
            score: *score,
        })
        .collect();
    table.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
    table
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn describe_result(result: &GameResult) -> String {
    let letters = |powers: &[GreatPower]| -> String {
        powers.iter().map(|p| p.abbreviation()).collect()
    };
    match result {
        GameResult::InProgress => "in progress".to_string(),
        GameResult::Conceded { power } => format!("conceded to {}", power),
        GameResult::Drawn { powers } => format!("{}-way draw {}", powers.len(), letters(powers.as_slice())),
        GameResult::Soloed { power, centres } => format!("{} solo with {} centres", power, centres),
        GameResult::Ended { board_top, toppers } => {
            format!("ended, board top {} ({})", board_top, letters(toppers.as_slice()))
        }
    }
}

fn render_text(report: &ReplayReport) -> String {
    let status = |finished: bool| if finished { "finished" } else { "in progress" };
    let mut out = String::new();

    out.push_str(&format!("\n=== {} ({}) ===\n", report.tournament, status(report.finished)));
    for round in &report.rounds {
        out.push_str(&format!("\nRound {} ({})\n", round.number, status(round.finished)));
        for game in report.games.iter().filter(|g| g.round == round.number) {
            out.push_str(&format!("  {}: {}\n", game.name, describe_result(&game.result)));
            for (power, score) in &game.scores {
                out.push_str(&format!("    {:<8} {:>7.2}\n", power.name(), score));
            }
        }
        out.push_str("  Standings:\n");
        push_standings(&mut out, &round.standings, "    ");
    }

    out.push_str("\nTournament standings:\n");
    push_standings(&mut out, &report.standings, "  ");
    out
}

fn push_standings(out: &mut String, standings: &[Standing], indent: &str) {
    for (rank, standing) in standings.iter().enumerate() {
        out.push_str(&format!(
            "{}{:>2}. {:<20} {:>7.2}\n",
            indent,
            rank + 1,
            standing.player,
            standing.score
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCRIPT: &str = r#"{
        "tournament": {
            "name": "Spring Open",
            "round_scoring_system": "Best game counts",
            "tournament_scoring_system": "Sum best 2 rounds"
        },
        "players": ["Ann", "Bob", "Cat", "Dan", "Eve", "Fay", "Gus", "Hal"],
        "rounds": [
            {
                "scoring_system": "CDiplo 80",
                "final_year": 1902,
                "games": [{
                    "name": "R1 Board 1",
                    "seats": [
                        {"power": "A", "player": "Ann"},
                        {"power": "E", "player": "Bob"},
                        {"power": "F", "player": "Cat",
                         "last": {"year": 1901, "season": "Fall"}},
                        {"power": "F", "player": "Hal",
                         "first": {"year": 1902, "season": "Spring"}},
                        {"power": "G", "player": "Dan"},
                        {"power": "I", "player": "Eve"},
                        {"power": "R", "player": "Fay"},
                        {"power": "T", "player": "Gus"}
                    ]
                }]
            },
            {
                "scoring_system": "Draw size",
                "dias": true,
                "earliest_end_time": "2024-05-18T14:00:00",
                "latest_end_time": "2024-05-18T16:00:00",
                "games": [{
                    "name": "R2 Board 1",
                    "seats": [
                        {"power": "Austria", "player": "Ann"},
                        {"power": "England", "player": "Bob"},
                        {"power": "France", "player": "Cat"},
                        {"power": "Germany", "player": "Dan"},
                        {"power": "Italy", "player": "Eve"},
                        {"power": "Russia", "player": "Fay"},
                        {"power": "Turkey", "player": "Hal"}
                    ]
                }]
            }
        ],
        "events": [
            {"event": "centre_counts", "game": "R1 Board 1", "year": 1901,
             "counts": {"A": 6, "E": 6, "F": 6, "G": 0, "I": 0, "R": 0, "T": 0}},
            {"event": "centre_counts", "game": "R1 Board 1", "year": 1902,
             "counts": {"A": 10, "E": 10, "F": 6, "G": 0, "I": 0, "R": 0, "T": 0}},
            {"event": "centre_count", "game": "R2 Board 1", "power": "Italy", "year": 1901, "count": 0},
            {"event": "centre_counts", "game": "R2 Board 1", "year": 1901,
             "counts": {"A": 4, "E": 4, "F": 4, "G": 3, "R": 4, "T": 4}},
            {"event": "draw", "game": "R2 Board 1", "year": 1901, "season": "Fall",
             "powers": ["A", "E", "F", "G", "R", "T"], "passed": false, "votes": 5},
            {"event": "close_round", "round": 2, "now": "2024-05-18T16:30:00"}
        ]
    }"#;

    fn script_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn score_of(standings: &[Standing], player: &str) -> f64 {
        standings
            .iter()
            .find(|s| s.player == player)
            .map(|s| s.score)
            .unwrap()
    }

    #[test]
    fn test_full_replay() {
        let file = script_file(SCRIPT);
        let script = load_script(file.path()).unwrap();
        let report = replay(&script, false).unwrap();

        assert!(report.finished);
        assert_eq!(report.games.len(), 2);
        assert_eq!(report.games[0].name, "R1 Board 1");
        assert_eq!(
            report.games[1].result,
            GameResult::Ended {
                board_top: 4,
                toppers: vec![
                    GreatPower::Austria,
                    GreatPower::England,
                    GreatPower::France,
                    GreatPower::Russia,
                    GreatPower::Turkey
                ]
            }
        );

        // Round 1: Hal replaced Cat as France and takes the credit
        let round_one = &report.rounds[0].standings;
        assert!((score_of(round_one, "Ann") - 29.5).abs() < 1e-9);
        assert!((score_of(round_one, "Hal") - 13.0).abs() < 1e-9);
        assert!(score_of(round_one, "Cat").abs() < 1e-9);

        // Round 2 ended on time: six survivors share the board
        let round_two = &report.rounds[1].standings;
        assert!((score_of(round_two, "Ann") - 100.0 / 6.0).abs() < 1e-9);
        assert!(score_of(round_two, "Eve").abs() < 1e-9);

        assert_eq!(report.standings[0].player, "Ann");
        assert!((report.standings[0].score - (29.5 + 100.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_failing_event_aborts() {
        let mut script: Script = serde_json::from_str(SCRIPT).unwrap();
        script.events.insert(
            0,
            EventScript::CentreCount {
                game: "R1 Board 1".to_string(),
                power: "A".to_string(),
                year: 1901,
                count: 9,
            },
        );
        let error = replay(&script, false).unwrap_err();
        assert!(format!("{:#}", error).starts_with("Event 1 failed"));
    }

    #[test]
    fn test_unknown_names_rejected() {
        let script = SCRIPT.replace(r#""player": "Gus""#, r#""player": "Zed""#);
        let script: Script = serde_json::from_str(&script).unwrap();
        assert!(replay(&script, false).is_err());

        let script = SCRIPT.replace(r#""event": "close_round", "round": 2"#, r#""event": "close_round", "round": 7"#);
        let script: Script = serde_json::from_str(&script).unwrap();
        assert!(replay(&script, false).is_err());
    }

    #[test]
    fn test_render_text() {
        let script: Script = serde_json::from_str(SCRIPT).unwrap();
        let text = render_text(&replay(&script, false).unwrap());
        assert!(text.contains("=== Spring Open (finished) ==="));
        assert!(text.contains("R1 Board 1: ended, board top 10 (AE)"));
        assert!(text.contains("Tournament standings:"));
    }

    #[test]
    fn test_missing_script_file() {
        assert!(load_script(Path::new("/nonexistent/script.json")).is_err());
    }
}
