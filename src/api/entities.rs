/// Admin entity endpoints
///
/// Every admin collection is served by the same generic handlers:
///
/// - `GET    /api/v1/<collection>?search=&status=&<facet>=` filtered list and stats
/// - `POST   /api/v1/<collection>` create a record
/// - `GET    /api/v1/<collection>/statuses` status catalogue
/// - `GET    /api/v1/<collection>/:id` one record and its available actions
/// - `DELETE /api/v1/<collection>/:id` remove a record
/// - `POST   /api/v1/<collection>/:id/actions/:action` apply a transition;
///   the `{ "reason" }` body may be omitted
use crate::{
    admin::{
        content::NewContentItem, invoices::NewInvoice, kyc::NewKycCase,
        notifications::NewNotification, payments::NewPayment, subscriptions::NewSubscription,
        templates::NewTemplate, AuditLogEntry, ContentItem, Invoice, KycCase, Notification,
        Payment, Role, Subscription, Template,
    },
    api::extract::{JsonBody, OptionalJsonBody},
    auth::AdminAuthContext,
    context::AppContext,
    entity::{
        filter::ALL, transition, FilterState, Notice, Record, Snapshot, StatusCatalogue,
        StatusTag, TenantStores, TransitionInput, TransitionOutcome,
    },
    error::{HubError, HubResult},
    metrics, require_admin_role,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Query keys that carry the free-text search
const SEARCH_KEYS: &[&str] = &["search", "q"];

/// An admin record type served over HTTP
pub trait AdminEntity: Record {
    /// Validated create payload
    type Create: DeserializeOwned + Validate + Send + 'static;

    fn stores(ctx: &AppContext) -> &TenantStores<Self>;

    fn create(payload: Self::Create, now: DateTime<Utc>) -> HubResult<Self>;
}

macro_rules! admin_entity {
    ($record:ty, $create:ty, $field:ident) => {
        impl AdminEntity for $record {
            type Create = $create;

            fn stores(ctx: &AppContext) -> &TenantStores<Self> {
                &ctx.$field
            }

            fn create(payload: $create, now: DateTime<Utc>) -> HubResult<Self> {
                payload.into_record(now)
            }
        }
    };
}

admin_entity!(Subscription, NewSubscription, subscriptions);
admin_entity!(Payment, NewPayment, payments);
admin_entity!(ContentItem, NewContentItem, content);
admin_entity!(Template, NewTemplate, templates);
admin_entity!(KycCase, NewKycCase, kyc);
admin_entity!(Notification, NewNotification, notifications);
admin_entity!(Invoice, NewInvoice, invoices);

/// Build routes for every admin collection
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(entity_routes::<Subscription>())
        .merge(entity_routes::<Payment>())
        .merge(entity_routes::<ContentItem>())
        .merge(entity_routes::<Template>())
        .merge(entity_routes::<KycCase>())
        .merge(entity_routes::<Notification>())
        .merge(entity_routes::<Invoice>())
}

/// Build routes for one collection
pub fn entity_routes<E: AdminEntity>() -> Router<AppContext> {
    let base = format!("/api/v1/{}", E::COLLECTION);

    Router::new()
        .route(&base, get(list::<E>).post(create::<E>))
        .route(&format!("{}/statuses", base), get(statuses::<E>))
        .route(&format!("{}/:id", base), get(fetch::<E>).delete(remove::<E>))
        .route(&format!("{}/:id/actions/:action", base), post(apply_action::<E>))
}

/// Translate list query parameters into a filter
///
/// `status` must name a known status (or `all`, in any case). Any other key is treated as
/// a facet; a facet the entity does not have matches nothing.
pub fn filter_from_query<E: Record>(params: &HashMap<String, String>) -> HubResult<FilterState> {
    let mut filter = FilterState::new();

    for (key, value) in params {
        let key = key.as_str();
        if SEARCH_KEYS.contains(&key) {
            filter = filter.search(value.trim());
        } else if key == "status" {
            if !value.eq_ignore_ascii_case(ALL) {
                filter = filter.status(E::Status::parse(value)?);
            }
        } else {
            if !E::FACETS.contains(&key) {
                tracing::debug!(entity = E::ENTITY, facet = key, "filter on unknown facet");
            }
            filter = filter.facet(key, value.as_str());
        }
    }

    Ok(filter)
}

#[derive(Debug, Serialize)]
pub struct ListResponse<E: Record> {
    pub items: Vec<E>,
    /// Records in the store before filtering
    pub total: usize,
    /// Records kept by the filter
    pub matched: usize,
    /// Computed over the whole store, not the filtered list
    pub stats: Snapshot<E::Summary>,
    pub statuses: StatusCatalogue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse<E: Record> {
    pub record: E,
    pub available_actions: Vec<&'static str>,
    /// Audit entries for this record, oldest first
    pub history: Vec<AuditLogEntry>,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub id: String,
    pub notice: Notice,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

fn empty_message(collection: &str, filtered: bool) -> String {
    if filtered {
        format!("No {} match the current filters", collection)
    } else {
        format!("No {} yet", collection)
    }
}

/// Filtered list plus dashboard stats and the status catalogue
async fn list<E: AdminEntity>(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Query(params): Query<HashMap<String, String>>,
) -> HubResult<Json<ListResponse<E>>> {
    let filter = filter_from_query::<E>(&params)?;

    let response = E::stores(&ctx)
        .read(&auth.tenant, |store| {
            let items: Vec<E> = store.list(&filter).into_iter().cloned().collect();
            let matched = items.len();
            ListResponse {
                items,
                total: store.len(),
                matched,
                stats: store.snapshot(),
                statuses: StatusCatalogue::of::<E>(),
                empty_message: (matched == 0)
                    .then(|| empty_message(E::COLLECTION, !filter.is_empty())),
            }
        })
        .await;

    tracing::debug!(
        tenant = %auth.tenant,
        entity = E::ENTITY,
        total = response.total,
        matched = response.matched,
        "listed records"
    );

    Ok(Json(response))
}

/// Create a record at the top of the list
async fn create<E: AdminEntity>(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    JsonBody(payload): JsonBody<E::Create>,
) -> HubResult<(StatusCode, Json<E>)> {
    require_admin_role!(auth, Role::Admin);

    let now = Utc::now();
    let record = E::create(payload, now)?;

    let created = E::stores(&ctx)
        .write(&auth.tenant, |store| store.insert(record).map(|r| r.clone()))
        .await?;

    metrics::record_record_change(E::COLLECTION, "created");
    ctx.audit_log
        .record(
            &auth.tenant,
            AuditLogEntry::lifecycle(&auth.subject, &created, "create", now),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// One record with the actions its status allows and its audit history
async fn fetch<E: AdminEntity>(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> HubResult<Json<RecordResponse<E>>> {
    let record = E::stores(&ctx)
        .read(&auth.tenant, |store| store.require(&id).map(|r| r.clone()))
        .await?;
    let history = ctx.audit_log.for_record(&auth.tenant, &id).await;

    Ok(Json(RecordResponse {
        available_actions: transition::available_actions::<E>(record.status()),
        record,
        history,
    }))
}

async fn remove<E: AdminEntity>(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path(id): Path<String>,
) -> HubResult<Json<RemoveResponse>> {
    require_admin_role!(auth, Role::Admin);

    let removed = E::stores(&ctx)
        .write(&auth.tenant, |store| store.remove(&id))
        .await?;

    metrics::record_record_change(E::COLLECTION, "removed");
    ctx.audit_log
        .record(
            &auth.tenant,
            AuditLogEntry::lifecycle(&auth.subject, &removed, "delete", Utc::now()),
        )
        .await;

    Ok(Json(RemoveResponse {
        notice: Notice::info(
            format!("{} deleted", capitalize(E::ENTITY)),
            format!("{} was removed", removed.id()),
        ),
        id,
    }))
}

/// Apply a named status transition
async fn apply_action<E: AdminEntity>(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    Path((id, action)): Path<(String, String)>,
    OptionalJsonBody(request): OptionalJsonBody<TransitionRequest>,
) -> HubResult<Json<TransitionOutcome<E>>> {
    require_admin_role!(auth, Role::Admin);

    let input = TransitionInput::new(auth.subject.clone(), request.reason, Utc::now());

    let result = E::stores(&ctx)
        .write(&auth.tenant, |store| store.transition(&id, &action, &input))
        .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if matches!(
                e,
                HubError::InvalidTransition { .. } | HubError::Validation(_)
            ) {
                metrics::record_transition(E::COLLECTION, &action, false);
            }
            tracing::info!(
                tenant = %auth.tenant,
                entity = E::ENTITY,
                id = %id,
                action = %action,
                "transition blocked: {}",
                e
            );
            return Err(e);
        }
    };

    metrics::record_transition(E::COLLECTION, outcome.action, true);
    ctx.audit_log
        .record(
            &auth.tenant,
            AuditLogEntry::transition(&input.actor, &outcome, input.reason.clone(), input.at),
        )
        .await;

    tracing::info!(
        tenant = %auth.tenant,
        entity = E::ENTITY,
        id = %id,
        from = outcome.from.as_str(),
        to = outcome.to.as_str(),
        "transition applied"
    );

    Ok(Json(outcome))
}

async fn statuses<E: AdminEntity>(_auth: AdminAuthContext) -> Json<StatusCatalogue> {
    Json(StatusCatalogue::of::<E>())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_from_query() {
        let subs = Subscription::mock_data(Utc::now());

        let filter = filter_from_query::<Subscription>(&params(&[
            ("status", "active"),
            ("plan", "all"),
            ("search", "  initech "),
        ]))
        .unwrap();
        let found = filter.apply(&subs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "sub_003");
    }

    #[test]
    fn test_all_sentinel_ignores_case() {
        let subs = Subscription::mock_data(Utc::now());
        let filter =
            filter_from_query::<Subscription>(&params(&[("status", "ALL"), ("plan", "All")]))
                .unwrap();
        assert_eq!(filter.apply(&subs).len(), subs.len());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = filter_from_query::<Subscription>(&params(&[("status", "frozen")]))
            .unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
    }

    #[test]
    fn test_unknown_facet_matches_nothing() {
        let subs = Subscription::mock_data(Utc::now());
        let filter = filter_from_query::<Subscription>(&params(&[("colour", "red")])).unwrap();
        assert!(filter.apply(&subs).is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("subscription"), "Subscription");
        assert_eq!(capitalize("KYC case"), "KYC case");
        assert_eq!(capitalize(""), "");
    }
}
