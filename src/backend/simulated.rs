/// Simulated AI backend
use super::{AiTool, Backend};
use crate::error::{HubError, HubResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Answers every call with canned data after a fixed delay
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn canned(tool: AiTool, payload: &Value) -> Value {
        match tool {
            AiTool::Accessibility => json!({
                "url": payload.get("url").cloned().unwrap_or(Value::Null),
                "score": 87,
                "issues": [
                    { "severity": "serious", "rule": "color-contrast", "count": 4 },
                    { "severity": "moderate", "rule": "image-alt", "count": 2 },
                ],
            }),
            AiTool::MlRecommendations => json!([
                { "kind": "template", "id": "tpl_002", "confidence": 0.91 },
                { "kind": "layout", "id": "hero-split", "confidence": 0.78 },
            ]),
            AiTool::Analytics => json!({
                "period": payload.get("period").cloned().unwrap_or_else(|| json!("30d")),
                "visitors": 12_480,
                "conversion_rate": 3.2,
                "bounce_rate": 41.7,
            }),
        }
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn invoke(&self, tool: AiTool, payload: Value) -> HubResult<Value> {
        if !payload.is_object() {
            return Err(HubError::Validation(
                "AI tool payload must be a JSON object".to_string(),
            ));
        }

        tokio::time::sleep(self.delay).await;
        Ok(Self::canned(tool, &payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_fixed_delay_and_canned_result() {
        let backend = SimulatedBackend::new(Duration::from_millis(20));
        let started = std::time::Instant::now();
        let result = backend
            .invoke(AiTool::Accessibility, json!({ "url": "https://acme.com" }))
            .await;
        assert!(started.elapsed() >= Duration::from_millis(20));

        let report = assert_ok!(result);
        assert_eq!(report["url"], "https://acme.com");
        assert_eq!(report["score"], 87);
    }

    #[tokio::test]
    async fn test_payload_must_be_object() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        assert_err!(backend.invoke(AiTool::Analytics, json!("30d")).await);
    }
}
