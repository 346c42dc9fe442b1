//! `toolrun chat` — Interactive session or single-query mode.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use toolrun_agent::{OutputRelay, ToolLoop};
use toolrun_config::AppConfig;
use toolrun_core::{Engine, SessionId, ToolRegistry, Transcript, Turn};
use toolrun_engine::OpenAiCompatEngine;
use toolrun_scheduler::JobScheduler;
use toolrun_session::{ResourceManager, Session, SessionResourceManager};
use toolrun_tools::KeywordIndex;

pub async fn run(
    query: Option<String>,
    session_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TOOLRUN_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY  = 'sk-...'");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let engine: Arc<dyn Engine> = Arc::new(OpenAiCompatEngine::new(
        "openai-compat",
        &config.base_url,
        api_key,
        &config.model,
    )?);

    // ── Session resources ──
    let scheduler = Arc::new(JobScheduler::new());
    let scheduler_handle = scheduler.start();
    let manager = SessionResourceManager::new(
        ResourceManager::new(&config.ephemeral.template_db, &config.ephemeral.data_dir),
        scheduler.clone(),
    )
    .with_retention(Duration::from_secs(config.ephemeral.retention_minutes * 60));

    let id = session_id.map(SessionId::from).unwrap_or_default();

    // A missing template only disables db_query; everything else works.
    // Tell the user rather than burying it in a log line.
    let (session, db_path): (Option<Session>, _) = match manager.activate(&id).await {
        Ok(session) => {
            let db = session.resource.db_path.clone();
            (Some(session), Some(db))
        }
        Err(e) => {
            eprintln!("  Note: could not provision the session database ({e}).");
            eprintln!("  Continuing without the db_query tool.");
            (None, None)
        }
    };
    let mut transcript = Transcript::new();

    let retrieval = Arc::new(KeywordIndex::new(load_corpus(&config)));
    let registry = Arc::new(toolrun_tools::builtin_registry(
        engine.clone(),
        retrieval,
        db_path.clone(),
    ));

    // A config that names a tool we don't have is a setup error, not
    // something to discover mid-run.
    if !config.run.enabled_tools.is_empty() {
        registry
            .enabled_subset(&config.run.enabled_tools)
            .map_err(|e| format!("Invalid enabled_tools in config: {e}"))?;
    }

    if let Some(text) = query {
        run_query(&engine, &registry, &config, &mut transcript, &text).await?;
    } else {
        interactive(&engine, &registry, &config, &id, &mut transcript).await?;
    }

    // The working copy stays on disk for the retention window; resuming
    // with --session before it fires picks it back up.
    if let Some(session) = &session {
        let job = manager.release(session).await;
        tracing::debug!(job_id = %job, "Disposal scheduled");
        println!(
            "  Session {} released. Resume within {} minutes with: toolrun chat --session {}",
            session.id, config.ephemeral.retention_minutes, session.id
        );
    }

    scheduler_handle.abort();
    Ok(())
}

async fn run_query(
    engine: &Arc<dyn Engine>,
    registry: &Arc<ToolRegistry>,
    config: &AppConfig,
    transcript: &mut Transcript,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel(64);

    // Print only what the growing trace added since the last event.
    let mut printed = 0usize;
    let relay = OutputRelay::spawn(rx, move |snapshot| {
        print!("{}", &snapshot[printed..]);
        printed = snapshot.len();
        let _ = std::io::stdout().flush();
    });

    let mut tool_loop = ToolLoop::new(engine.clone(), registry.clone())
        .with_max_iterations(config.run.max_iterations)
        .with_events(tx);
    if !config.run.enabled_tools.is_empty() {
        tool_loop = tool_loop.with_enabled_tools(config.run.enabled_tools.clone());
    }

    let result = tool_loop.run(transcript, query).await;
    // The loop holds the event sender; the relay only finishes once it is
    // dropped and the channel closes.
    drop(tool_loop);
    let _ = relay.await;

    match result {
        Ok(outcome) => {
            transcript.push(Turn::new(query, &outcome.answer));
        }
        Err(e) => {
            eprintln!("  [Engine error] {e}");
        }
    }
    Ok(())
}

async fn interactive(
    engine: &Arc<dyn Engine>,
    registry: &Arc<ToolRegistry>,
    config: &AppConfig,
    id: &SessionId,
    transcript: &mut Transcript,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  toolrun — interactive session {id}");
    println!("  Model: {}   Tools: {}", config.model, registry.names().join(", "));
    println!("  Type your query and press Enter. Type 'exit' to quit.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        run_query(engine, registry, config, transcript, line).await?;
        println!();
    }

    Ok(())
}

/// Read every markdown and text file under the configured corpus
/// directory into (filename, contents) pairs.
fn load_corpus(config: &AppConfig) -> Vec<(String, String)> {
    let Some(dir) = &config.tools.corpus_dir else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!(path = %dir.display(), "Corpus directory unreadable");
        return Vec::new();
    };

    let mut documents = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "md" || e == "txt");
        if !is_text {
            continue;
        }
        if let Ok(contents) = std::fs::read_to_string(&path) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            documents.push((name, contents));
        }
    }
    documents
}
