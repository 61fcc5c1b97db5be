/// System status card and admin audit trail
use crate::{
    admin::{AuditLogEntry, Role},
    auth::AdminAuthContext,
    context::AppContext,
    error::HubResult,
    jobs::SystemStatus,
    require_admin_role,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/v1/system/status", get(system_status))
        .route("/api/v1/audit", get(audit_log))
}

/// Latest figures from the system status job
async fn system_status(
    State(ctx): State<AppContext>,
    _auth: AdminAuthContext,
) -> Json<SystemStatus> {
    Json(ctx.system_status.read().await.clone())
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
    /// Only entries touching this record
    pub record_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditLogEntry>,
}

async fn audit_log(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Query(query): Query<AuditQuery>,
) -> HubResult<Json<AuditResponse>> {
    require_admin_role!(auth, Role::Admin);

    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let entries = match query.record_id {
        Some(record_id) => {
            let mut entries = ctx.audit_log.for_record(&auth.tenant, &record_id).await;
            entries.reverse();
            entries.truncate(limit);
            entries
        }
        None => ctx.audit_log.recent(&auth.tenant, limit).await,
    };

    Ok(Json(AuditResponse { entries }))
}
