//! `toolrun doctor` — Diagnose configuration and resources.

use toolrun_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("toolrun doctor — diagnostics");
    println!("============================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ok   Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  FAIL Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  warn No config file at {} — using defaults", config_path.display());
        AppConfig::load().ok()
    };

    if let Some(config) = config {
        if config.has_api_key() {
            println!("  ok   API key configured");
        } else {
            println!("  warn No API key — set TOOLRUN_API_KEY or add api_key to config.toml");
            issues += 1;
        }

        if config.ephemeral.template_db.exists() {
            println!("  ok   Template database present");
        } else {
            println!(
                "  warn No template database at {} — db_query will be unavailable",
                config.ephemeral.template_db.display()
            );
            issues += 1;
        }

        match &config.tools.corpus_dir {
            Some(dir) if dir.is_dir() => println!("  ok   Corpus directory present"),
            Some(dir) => {
                println!("  warn Corpus directory missing: {}", dir.display());
                issues += 1;
            }
            None => println!("  ok   No corpus configured (retrieval returns no matches)"),
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
