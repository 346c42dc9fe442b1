//! Current time tool.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use toolrun_core::Tool;
use toolrun_core::error::ToolError;

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Optionally pass a UTC offset in hours (e.g. -5 for EST, 9 for JST)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "utc_offset_hours": {
                    "type": "integer",
                    "description": "UTC offset in whole hours, -12 to 14. Defaults to 0 (UTC)."
                }
            }
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let offset_hours = arguments["utc_offset_hours"].as_i64().unwrap_or(0);
        if !(-12..=14).contains(&offset_hours) {
            return Err(ToolError::InvalidArguments(format!(
                "utc_offset_hours must be between -12 and 14, got {offset_hours}"
            )));
        }

        let offset = FixedOffset::east_opt(offset_hours as i32 * 3600)
            .ok_or_else(|| ToolError::InvalidArguments("Invalid UTC offset".into()))?;
        let now = Utc::now().with_timezone(&offset);
        Ok(now.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_is_utc() {
        let tool = CurrentTimeTool;
        let out = tool.call(serde_json::json!({})).await.unwrap();
        assert!(out.ends_with("+00:00"));
    }

    #[tokio::test]
    async fn offset_shifts_timezone() {
        let tool = CurrentTimeTool;
        let out = tool
            .call(serde_json::json!({"utc_offset_hours": 9}))
            .await
            .unwrap();
        assert!(out.ends_with("+09:00"));
    }

    #[tokio::test]
    async fn out_of_range_offset_rejected() {
        let tool = CurrentTimeTool;
        let result = tool.call(serde_json::json!({"utc_offset_hours": 30})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
