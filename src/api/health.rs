/// Health check endpoints for liveness and readiness checks
///
/// Supports two types of checks:
/// - Liveness: Is the application alive? (restart if not)
/// - Readiness: Can the application serve traffic? (remove from load balancer if not)

use crate::{context::AppContext, jobs::HealthState};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    pub version: String,

    pub uptime_seconds: u64,

    /// Individual component checks
    pub checks: Vec<ComponentHealth>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,

    /// Status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn new(name: &str, status: &str, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status: status.to_string(),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/detailed", get(health_detailed))
}

pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness check
///
/// If we can respond, we're alive.
pub async fn liveness_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check
///
/// Ready once the entity stores answer; the status job and AI backend
/// only degrade the detailed report.
pub async fn readiness_check(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let stores = check_entity_stores(&ctx).await;
    if stores.status == "unhealthy" {
        tracing::warn!("readiness_check_failed: entity stores unavailable");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Detailed health check with all component statuses
pub async fn health_detailed(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let start = Instant::now();

    let checks = vec![
        check_entity_stores(&ctx).await,
        check_background_jobs(&ctx).await,
        check_ai_backend(&ctx),
    ];

    let overall_status = determine_overall_status(&checks);

    let health = HealthStatus {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: ctx.uptime_seconds(),
        checks,
        message: if overall_status == "healthy" {
            None
        } else {
            Some("One or more components are unhealthy".to_string())
        },
    };

    let status_code = match overall_status.as_str() {
        "healthy" => StatusCode::OK,
        "degraded" => StatusCode::OK, // Still serving traffic
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    tracing::info!(
        status = %overall_status,
        duration_ms = start.elapsed().as_millis(),
        "health_check_completed"
    );

    (status_code, Json(health))
}

async fn check_entity_stores(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();

    let counts = ctx.record_counts().await;
    let details: serde_json::Map<String, serde_json::Value> = counts
        .into_iter()
        .map(|(collection, count)| (collection.to_string(), count.into()))
        .collect();

    ComponentHealth::new("entity_stores", "healthy", start)
        .with_details(serde_json::json!({ "records": details }))
}

/// The status job is stale after three missed refreshes
async fn check_background_jobs(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();

    let status = ctx.system_status.read().await.clone();
    let interval = ctx.config.jobs.system_status_interval();
    let age = (Utc::now() - status.updated_at).num_seconds().max(0) as u64;
    let stale = age > interval.as_secs() * 3;

    let health = if stale {
        ComponentHealth::new("background_jobs", "degraded", start)
            .with_error(format!("System status last refreshed {}s ago", age))
    } else if status.state == HealthState::Degraded {
        ComponentHealth::new("background_jobs", "degraded", start)
            .with_error("System resources above threshold")
    } else {
        ComponentHealth::new("background_jobs", "healthy", start)
    };

    health.with_details(serde_json::json!({
        "system_status_age_seconds": age,
        "cpu_usage": status.cpu_usage,
        "memory_usage": status.memory_usage,
    }))
}

fn check_ai_backend(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();

    ComponentHealth::new("ai_backend", "healthy", start).with_details(serde_json::json!({
        "type": ctx.backend.name(),
    }))
}

/// Determine overall health status from individual checks
fn determine_overall_status(checks: &[ComponentHealth]) -> String {
    let unhealthy_count = checks.iter().filter(|c| c.status == "unhealthy").count();
    let degraded_count = checks.iter().filter(|c| c.status == "degraded").count();

    if unhealthy_count > 0 {
        "unhealthy".to_string()
    } else if degraded_count > 0 {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}
