//! The bounded tool-execution loop.
//!
//! Each iteration asks the engine for a decision, runs the chosen tool,
//! and feeds the observation back. Tool failures never abort a run: they
//! become observations the engine can react to. Engine failures do abort
//! it. The iteration budget is a hard ceiling; hitting it yields a marked
//! incomplete answer rather than an error.
//!
//! Every step is published as a [`StepEvent`] so frontends can render the
//! trace live.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use toolrun_core::{
    Engine, EngineDecision, EngineError, EngineMessage, StepEvent, ToolRegistry, Transcript,
};

/// Default iteration budget per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// The hard ceiling no configuration can exceed.
pub const ITERATION_CEILING: u32 = 20;

/// The answer used when the iteration budget runs out.
pub const ITERATION_LIMIT_ANSWER: &str =
    "I reached the step limit before finishing. Here is what I found so far.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when \
     they help answer the question, then give a direct final answer.";

/// One tool invocation made during a run.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: serde_json::Value,
    pub observation: String,
    pub success: bool,
}

/// The result of one run of the loop.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The final answer text (the incomplete marker if `complete` is false).
    pub answer: String,
    /// False when the iteration budget ran out.
    pub complete: bool,
    /// Every tool invocation, in order.
    pub invocations: Vec<ToolInvocation>,
    /// How many engine decisions were made.
    pub iterations: u32,
}

/// The tool-execution loop.
pub struct ToolLoop {
    engine: Arc<dyn Engine>,
    tools: Arc<ToolRegistry>,
    max_iterations: u32,
    enabled_tools: Option<Vec<String>>,
    events: Option<mpsc::Sender<StepEvent>>,
    system_prompt: String,
}

impl ToolLoop {
    pub fn new(engine: Arc<dyn Engine>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            engine,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            enabled_tools: None,
            events: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }

    /// Set the iteration budget. Values above [`ITERATION_CEILING`] are
    /// clamped; zero is raised to one.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.clamp(1, ITERATION_CEILING);
        self
    }

    /// Restrict the run to a subset of registered tools. Unknown names in
    /// the list are ignored.
    pub fn with_enabled_tools(mut self, names: Vec<String>) -> Self {
        self.enabled_tools = Some(names);
        self
    }

    /// Publish step events to this channel as the run progresses.
    pub fn with_events(mut self, tx: mpsc::Sender<StepEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn emit(&self, event: StepEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event).await;
        }
    }

    fn base_messages(&self, transcript: &Transcript, query: &str) -> Vec<EngineMessage> {
        let mut messages = vec![EngineMessage::system(&self.system_prompt)];
        for turn in transcript.turns() {
            messages.push(EngineMessage::user(&turn.query));
            messages.push(EngineMessage::assistant(&turn.answer));
        }
        messages.push(EngineMessage::user(query));
        messages
    }

    /// Run the loop for one query against an existing transcript.
    ///
    /// The transcript is read-only here; recording the completed turn is
    /// the caller's job, since a run can also fail.
    pub async fn run(
        &self,
        transcript: &Transcript,
        query: &str,
    ) -> Result<RunOutcome, EngineError> {
        let specs = match &self.enabled_tools {
            Some(names) => self.tools.specs_for(names),
            None => self.tools.specs(),
        };
        let mut messages = self.base_messages(transcript, query);
        let mut invocations: Vec<ToolInvocation> = Vec::new();

        info!(
            engine = self.engine.name(),
            max_iterations = self.max_iterations,
            tools = specs.len(),
            "Run starting"
        );

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Requesting decision");
            let decision = self.engine.decide(&messages, &specs).await?;

            match decision {
                EngineDecision::Final { text } => {
                    info!(iterations = iteration, "Run completed");
                    self.emit(StepEvent::Answer {
                        text: text.clone(),
                        complete: true,
                    })
                    .await;
                    return Ok(RunOutcome {
                        answer: text,
                        complete: true,
                        invocations,
                        iterations: iteration,
                    });
                }

                EngineDecision::ToolCall {
                    tool,
                    arguments,
                    thought,
                } => {
                    if let Some(text) = &thought {
                        self.emit(StepEvent::Thought {
                            iteration: iteration as usize,
                            text: text.clone(),
                        })
                        .await;
                    }
                    self.emit(StepEvent::Action {
                        iteration: iteration as usize,
                        tool: tool.clone(),
                        arguments: arguments.clone(),
                    })
                    .await;

                    let result = match self.tools.resolve(&tool) {
                        Ok(t) => t.call(arguments.clone()).await,
                        Err(e) => Err(e),
                    };

                    // A failed tool is an observation, not a run failure.
                    let (observation, success) = match result {
                        Ok(output) => (output, true),
                        Err(e) => {
                            warn!(tool = %tool, error = %e, "Tool call failed");
                            (format!("Error: {e}"), false)
                        }
                    };

                    self.emit(StepEvent::Observation {
                        iteration: iteration as usize,
                        tool: tool.clone(),
                        text: observation.clone(),
                        success,
                    })
                    .await;

                    messages.push(EngineMessage::assistant(
                        thought.unwrap_or_else(|| format!("Calling {tool}")),
                    ));
                    messages.push(EngineMessage::observation(format!(
                        "{tool} returned: {observation}"
                    )));

                    invocations.push(ToolInvocation {
                        tool,
                        arguments,
                        observation,
                        success,
                    });
                }
            }
        }

        warn!(max_iterations = self.max_iterations, "Iteration budget exhausted");
        self.emit(StepEvent::Answer {
            text: ITERATION_LIMIT_ANSWER.into(),
            complete: false,
        })
        .await;

        Ok(RunOutcome {
            answer: ITERATION_LIMIT_ANSWER.into(),
            complete: false,
            invocations,
            iterations: self.max_iterations,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
