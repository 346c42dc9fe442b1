//! OpenAI-compatible engine implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any
//! endpoint exposing an OpenAI-compatible `/v1/chat/completions` API with
//! tool use. A response carrying tool calls becomes a `ToolCall` decision;
//! a plain content response becomes `Final`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use toolrun_core::{Engine, EngineDecision, EngineError, EngineMessage, EngineRole, ToolSpec};

/// An Engine backed by an OpenAI-compatible HTTP endpoint.
pub struct OpenAiCompatEngine {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatEngine {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| EngineError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// OpenAI convenience constructor.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, EngineError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Ollama convenience constructor. Ollama ignores the API key.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Result<Self, EngineError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
            model,
        )
    }

    fn to_api_messages(messages: &[EngineMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    EngineRole::User => "user".into(),
                    EngineRole::Assistant => "assistant".into(),
                    EngineRole::System => "system".into(),
                    EngineRole::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: None,
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolSpec]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn decision_from_choice(choice: ApiChoice) -> Result<EngineDecision, EngineError> {
        let content = choice.message.content.filter(|c| !c.is_empty());

        if let Some(call) = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .next()
        {
            let arguments: serde_json::Value = if call.function.arguments.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    EngineError::MalformedResponse(format!(
                        "tool call arguments are not JSON: {e}"
                    ))
                })?
            };

            return Ok(EngineDecision::ToolCall {
                tool: call.function.name,
                arguments,
                thought: content,
            });
        }

        match content {
            Some(text) => Ok(EngineDecision::Final { text }),
            None => Err(EngineError::MalformedResponse(
                "response had neither content nor tool calls".into(),
            )),
        }
    }
}

#[async_trait]
impl Engine for OpenAiCompatEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &self,
        messages: &[EngineMessage],
        tools: &[ToolSpec],
    ) -> std::result::Result<EngineDecision, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
            "stream": false,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(engine = %self.name, model = %self.model, tools = tools.len(), "Sending decide request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(EngineError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine returned error");
            return Err(EngineError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::MalformedResponse("No choices in response".into()))?;

        Self::decision_from_choice(choice)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_constructor() {
        let engine = OpenAiCompatEngine::ollama(None, "llama3").unwrap();
        assert_eq!(engine.name(), "ollama");
        assert!(engine.base_url.contains("localhost:11434"));
    }

    #[test]
    fn message_conversion() {
        let messages = vec![
            EngineMessage::system("You are helpful"),
            EngineMessage::user("Hello"),
            EngineMessage::observation("42"),
        ];
        let api_messages = OpenAiCompatEngine::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 3);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[2].role, "tool");
    }

    #[test]
    fn tool_spec_conversion() {
        let tools = vec![ToolSpec {
            name: "calculator".into(),
            description: "Evaluate arithmetic".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatEngine::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "calculator");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn tool_call_response_becomes_tool_call_decision() {
        let data = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "I should check the time.",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "current_time", "arguments": "{}"}
                    }]
                }
            }]
        }"#;
        let resp: ApiResponse = serde_json::from_str(data).unwrap();
        let decision =
            OpenAiCompatEngine::decision_from_choice(resp.choices.into_iter().next().unwrap())
                .unwrap();

        match decision {
            EngineDecision::ToolCall {
                tool, thought, ..
            } => {
                assert_eq!(tool, "current_time");
                assert_eq!(thought.as_deref(), Some("I should check the time."));
            }
            _ => panic!("expected tool call"),
        }
    }

    #[test]
    fn content_response_becomes_final_decision() {
        let data = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "The answer is 4."}
            }]
        }"#;
        let resp: ApiResponse = serde_json::from_str(data).unwrap();
        let decision =
            OpenAiCompatEngine::decision_from_choice(resp.choices.into_iter().next().unwrap())
                .unwrap();
        assert!(matches!(
            decision,
            EngineDecision::Final { text } if text == "The answer is 4."
        ));
    }

    #[test]
    fn garbage_arguments_are_malformed() {
        let data = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "calculator", "arguments": "not json"}
                    }]
                }
            }]
        }"#;
        let resp: ApiResponse = serde_json::from_str(data).unwrap();
        let err =
            OpenAiCompatEngine::decision_from_choice(resp.choices.into_iter().next().unwrap())
                .unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn empty_arguments_default_to_empty_object() {
        let data = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "current_time", "arguments": ""}
                    }]
                }
            }]
        }"#;
        let resp: ApiResponse = serde_json::from_str(data).unwrap();
        let decision =
            OpenAiCompatEngine::decision_from_choice(resp.choices.into_iter().next().unwrap())
                .unwrap();
        match decision {
            EngineDecision::ToolCall { arguments, .. } => {
                assert_eq!(arguments, serde_json::json!({}));
            }
            _ => panic!("expected tool call"),
        }
    }
}
