/// AI Collaborator Backends
///
/// The AI service accepts a JSON POST and answers with a JSON body whose
/// result sits under `data.<key>`, or with a non-2xx status on failure.
/// Two implementations exist: an HTTP client for a real service and a
/// fixed-delay simulation used when no service is configured.

pub mod http;
pub mod simulated;

pub use http::HttpBackend;
pub use simulated::SimulatedBackend;

use crate::config::BackendConfig;
use crate::error::{HubError, HubResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Tools exposed by the AI service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiTool {
    Accessibility,
    MlRecommendations,
    Analytics,
}

impl AiTool {
    pub const ALL: &'static [AiTool] = &[
        AiTool::Accessibility,
        AiTool::MlRecommendations,
        AiTool::Analytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiTool::Accessibility => "accessibility",
            AiTool::MlRecommendations => "ml-recommendations",
            AiTool::Analytics => "analytics",
        }
    }

    pub fn parse(s: &str) -> HubResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| HubError::NotFound(format!("Unknown AI tool: {}", s)))
    }

    /// Path on the AI service
    pub fn path(&self) -> &'static str {
        match self {
            AiTool::Accessibility => "/api/v1/ai/accessibility",
            AiTool::MlRecommendations => "/api/v1/ai/ml-recommendations",
            AiTool::Analytics => "/api/v1/analytics/advanced",
        }
    }

    /// Key of the result under `data`
    pub fn result_key(&self) -> &'static str {
        match self {
            AiTool::Accessibility => "report",
            AiTool::MlRecommendations => "recommendations",
            AiTool::Analytics => "analytics",
        }
    }
}

/// AI collaborator backend trait
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs ("http", "simulated")
    fn name(&self) -> &'static str;

    /// Run a tool and return the unwrapped `data.<key>` result
    async fn invoke(&self, tool: AiTool, payload: Value) -> HubResult<Value>;
}

/// Pull `data.<key>` out of a response body
pub fn extract_result(tool: AiTool, body: Value) -> HubResult<Value> {
    match body {
        Value::Object(mut root) => match root.remove("data") {
            Some(Value::Object(mut data)) => data.remove(tool.result_key()).ok_or_else(|| {
                HubError::Upstream(format!(
                    "{} response is missing data.{}",
                    tool.as_str(),
                    tool.result_key()
                ))
            }),
            _ => Err(HubError::Upstream(format!(
                "{} response has no data object",
                tool.as_str()
            ))),
        },
        _ => Err(HubError::Upstream(format!(
            "{} response is not a JSON object",
            tool.as_str()
        ))),
    }
}

/// Choose the backend for this configuration
pub fn from_config(config: &BackendConfig) -> HubResult<Arc<dyn Backend>> {
    match &config.ai_base_url {
        Some(base_url) => {
            tracing::info!(base_url = %base_url, "using HTTP AI backend");
            Ok(Arc::new(HttpBackend::new(
                base_url.clone(),
                Duration::from_secs(config.ai_timeout_secs),
            )?))
        }
        None => {
            tracing::info!(
                delay_ms = config.simulated_delay_ms,
                "no AI service configured, using simulated backend"
            );
            Ok(Arc::new(SimulatedBackend::new(Duration::from_millis(
                config.simulated_delay_ms,
            ))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_parse() {
        assert_eq!(
            AiTool::parse("ml-recommendations").unwrap(),
            AiTool::MlRecommendations
        );
        assert!(matches!(
            AiTool::parse("horoscope"),
            Err(HubError::NotFound(_))
        ));
    }

    #[test]
    fn test_extract_result() {
        let body = json!({ "data": { "report": { "score": 92 } } });
        let report = extract_result(AiTool::Accessibility, body).unwrap();
        assert_eq!(report["score"], 92);
    }

    #[test]
    fn test_extract_result_shape_errors() {
        let missing_key = json!({ "data": { "something": 1 } });
        assert!(matches!(
            extract_result(AiTool::Analytics, missing_key),
            Err(HubError::Upstream(_))
        ));
        assert!(extract_result(AiTool::Analytics, json!([1, 2])).is_err());
        assert!(extract_result(AiTool::Analytics, json!({ "data": 3 })).is_err());
    }
}
