//! End-to-end integration tests for the toolrun runtime.
//!
//! These exercise the full pipeline offline: session provisioning, the
//! tool-execution loop against a scripted engine, the step event relay,
//! and retention-based disposal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use toolrun_agent::{ITERATION_LIMIT_ANSWER, OutputRelay, ScriptedEngine, ToolLoop};
use toolrun_core::{EngineDecision, SessionId, StepEvent, Turn};
use toolrun_scheduler::JobScheduler;
use toolrun_session::{ResourceManager, SessionResourceManager};
use toolrun_tools::KeywordIndex;

fn tool_call(tool: &str, args: serde_json::Value, thought: &str) -> EngineDecision {
    EngineDecision::ToolCall {
        tool: tool.into(),
        arguments: args,
        thought: Some(thought.into()),
    }
}

fn final_answer(text: &str) -> EngineDecision {
    EngineDecision::Final { text: text.into() }
}

fn corpus_index() -> Arc<KeywordIndex> {
    Arc::new(KeywordIndex::new(vec![(
        "returns.md".into(),
        "Items may be returned within thirty days of delivery.".into(),
    )]))
}

async fn session_fixture() -> (tempfile::TempDir, SessionResourceManager, Arc<JobScheduler>) {
    let root = tempfile::tempdir().unwrap();
    let template = root.path().join("template.db");
    tokio::fs::write(&template, b"seed").await.unwrap();
    let scheduler = Arc::new(JobScheduler::new());
    let manager = SessionResourceManager::new(
        ResourceManager::new(&template, root.path()),
        scheduler.clone(),
    )
    .with_retention(Duration::from_secs(1800));
    (root, manager, scheduler)
}

#[tokio::test]
async fn full_run_with_tools_and_relay() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        tool_call(
            "calculator",
            serde_json::json!({"expression": "6 * 7"}),
            "I need arithmetic",
        ),
        tool_call(
            "retrieval",
            serde_json::json!({"query": "return policy days"}),
            "Now check the policy",
        ),
        final_answer("42, and returns are accepted for thirty days."),
    ]));

    let registry = Arc::new(toolrun_tools::builtin_registry(
        engine.clone(),
        corpus_index(),
        None,
    ));

    let (tx, rx) = mpsc::channel(64);
    let relay = OutputRelay::spawn(rx, |_| {});

    let tool_loop = ToolLoop::new(engine.clone(), registry).with_events(tx);
    let outcome = tool_loop
        .run(
            &toolrun_core::Transcript::new(),
            "What is 6*7, and what is the return policy?",
        )
        .await
        .unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.invocations.len(), 2);
    assert_eq!(outcome.invocations[0].observation, "42");
    assert!(outcome.invocations[1].observation.contains("thirty days"));

    // The loop holds the event sender; drop it so the channel closes and
    // the relay can finish. The relay saw the whole trace in order.
    drop(tool_loop);
    let trace = relay.await.unwrap();
    let thought = trace.find("Thought: I need arithmetic").unwrap();
    let action = trace.find("Action: calculator").unwrap();
    let obs = trace.find("Observation: 42").unwrap();
    let answer = trace.find("Answer: 42, and returns").unwrap();
    assert!(thought < action && action < obs && obs < answer);
}

#[tokio::test]
async fn transcript_carries_across_runs() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        final_answer("blue"),
        final_answer("as I said, blue"),
    ]));
    let registry = Arc::new(toolrun_tools::builtin_registry(
        engine.clone(),
        corpus_index(),
        None,
    ));
    let tool_loop = ToolLoop::new(engine.clone(), registry);

    let mut transcript = toolrun_core::Transcript::new();
    let first = tool_loop
        .run(&transcript, "what color is the sky?")
        .await
        .unwrap();
    transcript.push(Turn::new("what color is the sky?", &first.answer));

    tool_loop.run(&transcript, "what did you say?").await.unwrap();

    // The second run's context contains the first completed turn.
    let messages = engine.recorded_messages(1);
    assert!(messages.iter().any(|m| m.content == "what color is the sky?"));
    assert!(messages.iter().any(|m| m.content == "blue"));
}

#[tokio::test]
async fn budget_exhaustion_is_visible_end_to_end() {
    let decisions: Vec<EngineDecision> = (0..5)
        .map(|_| {
            tool_call(
                "calculator",
                serde_json::json!({"expression": "1+1"}),
                "still thinking",
            )
        })
        .collect();
    let engine = Arc::new(ScriptedEngine::new(decisions));
    let registry = Arc::new(toolrun_tools::builtin_registry(
        engine.clone(),
        corpus_index(),
        None,
    ));

    let (tx, mut rx) = mpsc::channel(64);
    let tool_loop = ToolLoop::new(engine, registry)
        .with_max_iterations(2)
        .with_events(tx);

    let outcome = tool_loop
        .run(&toolrun_core::Transcript::new(), "loop forever")
        .await
        .unwrap();

    assert!(!outcome.complete);
    assert_eq!(outcome.answer, ITERATION_LIMIT_ANSWER);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(StepEvent::Answer { complete: false, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn session_lifecycle_with_db_tool() {
    let (_root, manager, scheduler) = session_fixture().await;
    let id = SessionId::from("e2e");
    let session = manager.activate(&id).await.unwrap();

    // The provisioned copy backs the tool registry for this session.
    let engine = Arc::new(ScriptedEngine::new(vec![final_answer("done")]));
    let registry = toolrun_tools::builtin_registry(
        engine,
        corpus_index(),
        Some(session.resource.db_path.clone()),
    );
    assert!(registry.get("db_query").is_some());

    // Release, wait out retention, and the working copy is gone.
    manager.release(&session).await;
    assert!(session.resource.dir.exists());

    tokio::time::advance(Duration::from_secs(1801)).await;
    scheduler.run_pending().await;
    assert!(!session.resource.dir.exists());
}

#[tokio::test(start_paused = true)]
async fn resumed_session_keeps_its_state() {
    let (_root, manager, scheduler) = session_fixture().await;
    let id = SessionId::from("resume-me");

    let session = manager.activate(&id).await.unwrap();
    tokio::fs::write(&session.resource.db_path, b"progress")
        .await
        .unwrap();
    manager.release(&session).await;

    tokio::time::advance(Duration::from_secs(600)).await;
    scheduler.run_pending().await;

    // Back inside the retention window: state survives and the disposal
    // clock restarts from this activation.
    let resumed = manager.activate(&id).await.unwrap();
    let contents = tokio::fs::read(&resumed.resource.db_path).await.unwrap();
    assert_eq!(contents, b"progress");

    tokio::time::advance(Duration::from_secs(1200)).await;
    scheduler.run_pending().await;
    assert!(resumed.resource.dir.exists());

    // A full retention period after the last activation, it is disposed.
    tokio::time::advance(Duration::from_secs(700)).await;
    scheduler.run_pending().await;
    assert!(!resumed.resource.dir.exists());
}
