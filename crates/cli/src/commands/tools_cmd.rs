//! `toolrun tools` — List the built-in tools.

use std::sync::Arc;

use toolrun_agent::ScriptedEngine;
use toolrun_tools::KeywordIndex;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // No network here; a scripted engine satisfies the translate tool's
    // constructor without being callable.
    let registry = toolrun_tools::builtin_registry(
        Arc::new(ScriptedEngine::new(Vec::new())),
        Arc::new(KeywordIndex::new(Vec::new())),
        Some(std::path::PathBuf::from("session.db")),
    );

    println!();
    println!("  Built-in tools:");
    println!();
    for spec in {
        let mut specs = registry.specs();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    } {
        println!("  {:<14} {}", spec.name, spec.description);
    }
    println!();
    println!("  db_query is only registered when the session database is provisioned.");
    println!();

    Ok(())
}
