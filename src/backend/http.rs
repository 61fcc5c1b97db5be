/// HTTP AI backend
use super::{extract_result, AiTool, Backend};
use crate::error::{HubError, HubResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Calls a real AI service over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> HubResult<Self> {
        // Build HTTP client
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("canvas-hub/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| HubError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    fn url(&self, tool: AiTool) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), tool.path())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn invoke(&self, tool: AiTool, payload: Value) -> HubResult<Value> {
        let url = self.url(tool);
        tracing::debug!(tool = tool.as_str(), url = %url, "calling AI service");

        let response = self.http_client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(HubError::Upstream(format!(
                "AI service returned error for {}: {}",
                tool.as_str(),
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        extract_result(tool, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joining() {
        let backend = HttpBackend::new("https://ai.example.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.url(AiTool::Analytics),
            "https://ai.example.com/api/v1/analytics/advanced"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_upstream_error() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = backend
            .invoke(AiTool::Accessibility, json!({ "url": "https://acme.com" }))
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Upstream(_)));
    }
}
