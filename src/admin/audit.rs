/// Admin Audit Log
///
/// Every applied transition, creation and deletion is recorded per tenant.
/// The log is bounded; the oldest entries are dropped first.
use crate::entity::{Record, StatusTag, TransitionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Entries kept per tenant
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Admin action audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor: String,
    pub entity: String,
    pub record_id: String,
    pub action: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn transition<R: Record>(
        actor: &str,
        outcome: &TransitionOutcome<R>,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            actor: actor.to_string(),
            entity: R::ENTITY.to_string(),
            record_id: outcome.record.id().to_string(),
            action: outcome.action.to_string(),
            from: Some(outcome.from.as_str().to_string()),
            to: Some(outcome.to.as_str().to_string()),
            reason,
            timestamp: at,
        }
    }

    /// Creation or deletion, which carry no status change
    pub fn lifecycle<R: Record>(actor: &str, record: &R, action: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            actor: actor.to_string(),
            entity: R::ENTITY.to_string(),
            record_id: record.id().to_string(),
            action: action.to_string(),
            from: None,
            to: None,
            reason: None,
            timestamp: at,
        }
    }
}

/// Per-tenant audit trail
pub struct AuditLog {
    entries: RwLock<HashMap<String, VecDeque<AuditLogEntry>>>,
    next_id: AtomicI64,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry, assigning its id
    pub async fn record(&self, tenant: &str, mut entry: AuditLogEntry) -> i64 {
        entry.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = entry.id;

        tracing::info!(
            tenant = tenant,
            actor = %entry.actor,
            entity = %entry.entity,
            record_id = %entry.record_id,
            action = %entry.action,
            "admin action recorded"
        );

        let mut entries = self.entries.write().await;
        let log = entries.entry(tenant.to_string()).or_default();
        if log.len() == self.capacity {
            log.pop_front();
        }
        log.push_back(entry);
        id
    }

    /// Most recent entries first
    pub async fn recent(&self, tenant: &str, limit: usize) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().await;
        entries
            .get(tenant)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Entries touching one record, oldest first
    pub async fn for_record(&self, tenant: &str, record_id: &str) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().await;
        entries
            .get(tenant)
            .map(|log| {
                log.iter()
                    .filter(|e| e.record_id == record_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::subscriptions::Subscription;
    use crate::entity::{transition::apply, TransitionInput};

    fn entry(record_id: &str) -> AuditLogEntry {
        let sub = Subscription::mock_data(Utc::now()).remove(0);
        let mut entry = AuditLogEntry::lifecycle("admin", &sub, "create", Utc::now());
        entry.record_id = record_id.to_string();
        entry
    }

    #[tokio::test]
    async fn test_transition_entry() {
        let log = AuditLog::default();
        let mut sub = Subscription::mock_data(Utc::now()).remove(0);
        let input = TransitionInput::new("ops@acme", Some("Customer vacation".into()), Utc::now());
        let outcome = apply(&mut sub, "pause", &input).unwrap();

        let id = log
            .record(
                "acme",
                AuditLogEntry::transition(&input.actor, &outcome, input.reason.clone(), input.at),
            )
            .await;
        assert_eq!(id, 1);

        let recent = log.recent("acme", 10).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].from.as_deref(), Some("active"));
        assert_eq!(recent[0].to.as_deref(), Some("paused"));
        assert_eq!(recent[0].reason.as_deref(), Some("Customer vacation"));
        assert!(log.recent("globex", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let log = AuditLog::new(2);
        for id in ["a", "b", "c"] {
            log.record("acme", entry(id)).await;
        }
        let recent: Vec<String> = log
            .recent("acme", 10)
            .await
            .into_iter()
            .map(|e| e.record_id)
            .collect();
        assert_eq!(recent, vec!["c", "b"]);
        assert_eq!(log.for_record("acme", "a").await.len(), 0);
    }
}
