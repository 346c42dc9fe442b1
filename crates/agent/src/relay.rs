//! Output relay — folds step events into a growing trace.
//!
//! Frontends that render a single text area (a terminal, a web panel)
//! want the whole trace so far, re-rendered on every step. The relay
//! appends each event to a buffer and hands the observer the entire
//! accumulated text, never a delta.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use toolrun_core::StepEvent;

pub struct OutputRelay {
    buffer: String,
    observer: Box<dyn FnMut(&str) + Send>,
}

impl OutputRelay {
    /// `observer` is called after every event with the full trace so far.
    pub fn new(observer: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            buffer: String::new(),
            observer: Box::new(observer),
        }
    }

    /// Fold one event into the trace and notify the observer.
    pub fn publish(&mut self, event: &StepEvent) {
        self.buffer.push_str(&Self::render(event));
        self.buffer.push('\n');
        (self.observer)(&self.buffer);
    }

    /// The accumulated trace.
    pub fn snapshot(&self) -> &str {
        &self.buffer
    }

    fn render(event: &StepEvent) -> String {
        match event {
            StepEvent::Thought { text, .. } => format!("Thought: {text}"),
            StepEvent::Action {
                tool, arguments, ..
            } => format!("Action: {tool}({arguments})"),
            StepEvent::Observation { text, .. } => format!("Observation: {text}"),
            StepEvent::Answer { text, .. } => format!("Answer: {text}"),
        }
    }

    /// Drain a step event channel into a relay on a background task.
    ///
    /// Resolves to the final trace once the sender side closes.
    pub fn spawn(
        mut rx: mpsc::Receiver<StepEvent>,
        observer: impl FnMut(&str) + Send + 'static,
    ) -> JoinHandle<String> {
        let mut relay = OutputRelay::new(observer);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                relay.publish(&event);
            }
            relay.buffer
        })
    }
}
