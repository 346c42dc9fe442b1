//! A scripted engine for tests and offline smoke runs.
//!
//! Plays back a fixed sequence of decisions, recording every request it
//! receives so tests can assert on what the loop sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use toolrun_core::{Engine, EngineDecision, EngineError, EngineMessage, ToolSpec};

struct RecordedCall {
    messages: Vec<EngineMessage>,
    specs: Vec<ToolSpec>,
}

pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<EngineDecision, EngineError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEngine {
    /// An engine that plays back `decisions` in order.
    pub fn new(decisions: Vec<EngineDecision>) -> Self {
        Self {
            script: Mutex::new(decisions.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An engine whose first decide call fails with `error`.
    pub fn failing(error: EngineError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// How many decide calls have been made.
    pub fn decide_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The messages the nth decide call received.
    pub fn recorded_messages(&self, n: usize) -> Vec<EngineMessage> {
        self.calls.lock().unwrap()[n].messages.clone()
    }

    /// The tool specs the nth decide call received.
    pub fn recorded_specs(&self, n: usize) -> Vec<ToolSpec> {
        self.calls.lock().unwrap()[n].specs.clone()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(
        &self,
        messages: &[EngineMessage],
        tools: &[ToolSpec],
    ) -> Result<EngineDecision, EngineError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            specs: tools.to_vec(),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(EngineError::NotConfigured("script exhausted".into())))
    }
}
