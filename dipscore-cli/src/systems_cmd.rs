//! Systems command - list the scoring systems that can be selected by name

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use dipscore_core::ScoringRegistry;

#[derive(Args)]
pub struct SystemsArgs {
    /// JSON list of extra game scoring systems to register first
    #[arg(long, value_name = "FILE")]
    pub extra: Option<PathBuf>,
}

pub fn run(args: SystemsArgs) -> Result<()> {
    let registry = load_registry(args.extra.as_ref())?;
    print!("{}", render(&registry));
    Ok(())
}

/// Standard registry plus any systems from `extra`
pub fn load_registry(extra: Option<&PathBuf>) -> Result<ScoringRegistry> {
    let mut registry = ScoringRegistry::standard();
    if let Some(path) = extra {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read systems file: {}", path.display()))?;
        let added = registry
            .register_games_from_json(&json)
            .with_context(|| format!("Failed to parse systems file: {}", path.display()))?;
        tracing::info!("Registered {} game systems from {}", added, path.display());
    }
    Ok(registry)
}

fn render(registry: &ScoringRegistry) -> String {
    let mut out = String::new();
    let sections = [
        ("Game", registry.game_names()),
        ("Round", registry.round_names()),
        ("Tournament", registry.tournament_names()),
    ];
    for (title, names) in sections {
        out.push_str(&format!("{} scoring systems:\n", title));
        for name in names {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out
}
