//! Score command - what-if scoring of a single centre distribution
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_ledger(), report()
//! - Level 4: argument parsing

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use dipscore_core::{
    CentreCountLedger, DrawProposal, GameSnapshot, GreatPower, PowerScores, Season, FIRST_YEAR,
};

use crate::systems_cmd::load_registry;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ScoreArgs {
    /// Game scoring system name, e.g. "CDiplo 100"
    pub system: String,

    /// Centre counts, e.g. A=10,E=10,F=6 (unlisted powers hold none)
    #[arg(long)]
    pub counts: String,

    /// Powers in a passed draw, e.g. A,E
    #[arg(long)]
    pub draw: Option<String>,

    /// JSON list of extra game scoring systems
    #[arg(long, value_name = "FILE")]
    pub extra: Option<PathBuf>,

    /// Output scores as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: ScoreArgs) -> Result<()> {
    let registry = load_registry(args.extra.as_ref())?;
    let system = registry.find_game(&args.system)?;

    let counts = parse_counts(&args.counts)?;
    let ledger = build_ledger(&counts)?;
    let draw = match &args.draw {
        Some(powers) => Some(DrawProposal::new(
            FIRST_YEAR,
            Season::Fall,
            &parse_powers(powers)?,
            true,
        )),
        None => None,
    };

    tracing::debug!("Scoring {:?} under {}", counts, args.system);
    let scores = system.scores(&GameSnapshot::new(&ledger, draw.as_ref()))?;
    report(&scores, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// One year of counts, every power present
fn build_ledger(counts: &[(GreatPower, u8)]) -> Result<CentreCountLedger> {
    let mut ledger = CentreCountLedger::new();
    for power in GreatPower::ALL {
        let count = counts
            .iter()
            .find(|(p, _)| *p == power)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        ledger.record(power, FIRST_YEAR, count, None)?;
    }
    Ok(ledger)
}

fn report(scores: &PowerScores, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(scores)?);
    } else {
        for (power, score) in scores {
            println!("{:<8} {:>7.2}", power.name(), score);
        }
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Parse `A=10,E=10,F=6`
pub fn parse_counts(text: &str) -> Result<Vec<(GreatPower, u8)>> {
    let mut counts: Vec<(GreatPower, u8)> = Vec::new();
    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (power, count) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected POWER=COUNT, got '{}'", entry))?;
        let power: GreatPower = power.trim().parse()?;
        let count: u8 = count
            .trim()
            .parse()
            .with_context(|| format!("invalid centre count in '{}'", entry))?;
        if counts.iter().any(|(p, _)| *p == power) {
            return Err(anyhow!("{} listed twice", power));
        }
        counts.push((power, count));
    }
    Ok(counts)
}

/// Parse `A,E`
pub fn parse_powers(text: &str) -> Result<Vec<GreatPower>> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<GreatPower>().map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipscore_core::ScoringRegistry;
    use GreatPower::*;

    #[test]
    fn test_parse_counts() {
        let counts = parse_counts("A=10, england=10,F=6").unwrap();
        assert_eq!(counts, vec![(Austria, 10), (England, 10), (France, 6)]);
        assert!(parse_counts("A10").is_err());
        assert!(parse_counts("X=3").is_err());
        assert!(parse_counts("A=lots").is_err());
        assert!(parse_counts("A=3,Austria=4").is_err());
    }

    #[test]
    fn test_parse_powers() {
        assert_eq!(parse_powers("A,E").unwrap(), vec![Austria, England]);
        assert!(parse_powers("A,Q").is_err());
    }

    #[test]
    fn test_build_ledger_fills_missing_powers() {
        let ledger = build_ledger(&[(Austria, 10), (England, 10), (France, 6)]).unwrap();
        assert_eq!(ledger.year_counts(FIRST_YEAR).len(), 7);
        assert_eq!(ledger.count(Turkey, FIRST_YEAR), Some(0));
        assert!(build_ledger(&[(Austria, 40)]).is_err());
    }

    #[test]
    fn test_what_if_cdiplo_80() {
        let ledger = build_ledger(&parse_counts("A=10,E=10,F=6").unwrap()).unwrap();
        let registry = ScoringRegistry::standard();
        let scores = registry
            .find_game("CDiplo 80")
            .unwrap()
            .scores(&GameSnapshot::new(&ledger, None))
            .unwrap();
        assert!((scores[&Austria] - 29.5).abs() < 1e-9);
        assert!((scores[&France] - 13.0).abs() < 1e-9);
        assert!(scores[&Italy].abs() < 1e-9);
    }
}
