/// AI tool endpoints
///
/// `POST /api/v1/ai/:tool` forwards the JSON body to the configured backend
/// (`accessibility`, `ml-recommendations` or `analytics`).
use crate::{
    api::extract::JsonBody, auth::AdminAuthContext, backend::AiTool, context::AppContext,
    error::HubResult, metrics,
};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/v1/ai/:tool", post(invoke_tool))
}

#[derive(Debug, Serialize)]
pub struct AiResponse {
    pub tool: &'static str,
    pub backend: &'static str,
    pub result: Value,
}

async fn invoke_tool(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(tool): Path<String>,
    JsonBody(payload): JsonBody<Value>,
) -> HubResult<Json<AiResponse>> {
    let tool = AiTool::parse(&tool)?;
    let start = Instant::now();

    let result = ctx.backend.invoke(tool, payload).await;
    metrics::record_ai_call(tool.as_str(), result.is_ok());

    match &result {
        Ok(_) => tracing::info!(
            tenant = %auth.tenant,
            tool = tool.as_str(),
            backend = ctx.backend.name(),
            duration_ms = start.elapsed().as_millis(),
            "AI tool completed"
        ),
        Err(e) => tracing::warn!(
            tenant = %auth.tenant,
            tool = tool.as_str(),
            backend = ctx.backend.name(),
            "AI tool failed: {}",
            e
        ),
    }

    Ok(Json(AiResponse {
        tool: tool.as_str(),
        backend: ctx.backend.name(),
        result: result?,
    }))
}
