/// HTTP server setup and routing
use crate::{
    api::middleware::track_metrics,
    context::AppContext,
    error::{HubError, HubResult},
    metrics,
    rate_limit::rate_limit_middleware,
};
use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(crate::api::routes())
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx.clone())
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn_with_state(ctx, rate_limit_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Prometheus text exposition
async fn metrics_handler() -> HubResult<String> {
    metrics::render_metrics()
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> HubResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Canvas Hub admin API listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    info!("   AI backend: {}", ctx.backend.name());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HubError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| HubError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
