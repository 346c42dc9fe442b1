//! Translation tool — delegates to the engine with a focused prompt.
//!
//! The engine that drives the loop is also the best translator on hand,
//! so this tool makes a nested one-shot call to it. The nested call
//! carries no tool specs, which forces a Final decision.

use async_trait::async_trait;
use std::sync::Arc;
use toolrun_core::{Engine, EngineDecision, EngineMessage, Tool};
use toolrun_core::error::ToolError;

pub struct TranslateTool {
    engine: Arc<dyn Engine>,
}

impl TranslateTool {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for TranslateTool {
    fn name(&self) -> &str {
        "translate"
    }

    fn description(&self) -> &str {
        "Translate text into a target language. Returns only the translated text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to translate"
                },
                "target_language": {
                    "type": "string",
                    "description": "The language to translate into, e.g. 'French'"
                }
            },
            "required": ["text", "target_language"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
        let target = arguments["target_language"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("Missing 'target_language' argument".into())
        })?;

        let messages = vec![
            EngineMessage::system(format!(
                "You are a translator. Translate the user's text into {target}. \
                 Reply with the translation only, no commentary."
            )),
            EngineMessage::user(text),
        ];

        let decision = self
            .engine
            .decide(&messages, &[])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "translate".into(),
                reason: e.to_string(),
            })?;

        match decision {
            EngineDecision::Final { text } => Ok(text),
            EngineDecision::ToolCall { .. } => Err(ToolError::ExecutionFailed {
                tool_name: "translate".into(),
                reason: "engine attempted a tool call during translation".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolrun_core::{EngineError, ToolSpec};

    struct FixedEngine(EngineDecision);

    #[async_trait]
    impl Engine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn decide(
            &self,
            _messages: &[EngineMessage],
            _tools: &[ToolSpec],
        ) -> Result<EngineDecision, EngineError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn returns_engine_translation() {
        let tool = TranslateTool::new(Arc::new(FixedEngine(EngineDecision::Final {
            text: "Bonjour".into(),
        })));
        let out = tool
            .call(serde_json::json!({"text": "Hello", "target_language": "French"}))
            .await
            .unwrap();
        assert_eq!(out, "Bonjour");
    }

    #[tokio::test]
    async fn nested_tool_call_is_failure() {
        let tool = TranslateTool::new(Arc::new(FixedEngine(EngineDecision::ToolCall {
            tool: "calculator".into(),
            arguments: serde_json::json!({}),
            thought: None,
        })));
        let result = tool
            .call(serde_json::json!({"text": "Hello", "target_language": "French"}))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }

    #[tokio::test]
    async fn missing_arguments_rejected() {
        let tool = TranslateTool::new(Arc::new(FixedEngine(EngineDecision::Final {
            text: "x".into(),
        })));
        let result = tool.call(serde_json::json!({"text": "Hello"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
