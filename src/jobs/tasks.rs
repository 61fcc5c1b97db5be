/// Background task implementations
use crate::{
    admin::{
        subscriptions::{Subscription, SubscriptionStatus},
        AuditLogEntry,
    },
    context::AppContext,
    entity::{Record, TransitionInput, TransitionOutcome},
    error::HubResult,
    jobs::status::SystemStatus,
    metrics,
};
use chrono::Utc;

/// Actor recorded for automatic transitions
pub const SYSTEM_ACTOR: &str = "system";

/// Expire subscriptions whose final billing period has ended
///
/// Every tenant store created so far is swept. Each candidate goes through
/// the guarded `expire` transition, so records in other statuses are left
/// alone.
pub async fn expire_lapsed_subscriptions(ctx: &AppContext) -> HubResult<u64> {
    let now = Utc::now();
    let input = TransitionInput::new(SYSTEM_ACTOR, None, now);
    let mut expired: Vec<(String, TransitionOutcome<Subscription>)> = Vec::new();

    ctx.subscriptions
        .for_each_tenant(|tenant, store| {
            let lapsed = store.ids_where(|sub| {
                sub.is_lapsed(now)
                    && matches!(
                        sub.status,
                        SubscriptionStatus::Active | SubscriptionStatus::PastDue
                    )
            });

            for id in lapsed {
                match store.transition(&id, "expire", &input) {
                    Ok(outcome) => expired.push((tenant.to_string(), outcome)),
                    Err(e) => tracing::warn!(tenant, id = %id, "failed to expire subscription: {}", e),
                }
            }
        })
        .await;

    for (tenant, outcome) in &expired {
        tracing::info!(tenant = %tenant, id = %outcome.record.id, "subscription expired");
        metrics::record_transition(Subscription::COLLECTION, outcome.action, true);
        ctx.audit_log
            .record(
                tenant,
                AuditLogEntry::transition(SYSTEM_ACTOR, outcome, None, now),
            )
            .await;
    }

    Ok(expired.len() as u64)
}

/// Draw new system status figures
pub async fn refresh_system_status(ctx: &AppContext) -> HubResult<()> {
    // The rng is not Send; keep it out of any await
    let status = {
        let mut rng = rand::thread_rng();
        SystemStatus::sample(&mut rng, ctx.uptime_seconds(), Utc::now())
    };

    metrics::UPTIME_SECONDS.set(status.uptime_seconds as f64);
    *ctx.system_status.write().await = status;
    Ok(())
}

/// Publish per-entity record counts to the metrics registry
pub async fn update_record_gauges(ctx: &AppContext) -> HubResult<()> {
    for (collection, count) in ctx.record_counts().await {
        metrics::set_record_count(collection, count);
    }
    Ok(())
}
