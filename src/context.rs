/// Application context and dependency injection
use crate::{
    admin::{
        AuditLog, ContentItem, Invoice, KycCase, Notification, Payment, Subscription, Template,
    },
    backend::{self, Backend},
    config::ServerConfig,
    entity::{Record, TenantStores},
    error::HubResult,
    jobs::SystemStatus,
    rate_limit::{LimiterSettings, RateLimiter},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    // Entity stores, one per tenant
    pub subscriptions: Arc<TenantStores<Subscription>>,
    pub payments: Arc<TenantStores<Payment>>,
    pub content: Arc<TenantStores<ContentItem>>,
    pub templates: Arc<TenantStores<Template>>,
    pub kyc: Arc<TenantStores<KycCase>>,
    pub notifications: Arc<TenantStores<Notification>>,
    pub invoices: Arc<TenantStores<Invoice>>,
    // Admin audit trail
    pub audit_log: Arc<AuditLog>,
    // Refreshed by the system status job
    pub system_status: Arc<RwLock<SystemStatus>>,
    // AI collaborator
    pub backend: Arc<dyn Backend>,
    // Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
    started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> HubResult<Self> {
        // Validate configuration
        config.validate()?;

        let backend = backend::from_config(&config.backend)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Create a context around an explicit AI backend
    pub fn with_backend(config: ServerConfig, backend: Arc<dyn Backend>) -> Self {
        let seed = config.stores.seed_mock_data;
        if seed {
            tracing::info!("New tenants will be seeded with demo records");
        }

        let rate_limiter = Arc::new(RateLimiter::new(LimiterSettings::from(&config.rate_limit)));
        let audit_log = Arc::new(AuditLog::new(config.stores.audit_capacity));

        Self {
            config: Arc::new(config),
            subscriptions: Arc::new(TenantStores::new(seed)),
            payments: Arc::new(TenantStores::new(seed)),
            content: Arc::new(TenantStores::new(seed)),
            templates: Arc::new(TenantStores::new(seed)),
            kyc: Arc::new(TenantStores::new(seed)),
            notifications: Arc::new(TenantStores::new(seed)),
            invoices: Arc::new(TenantStores::new(seed)),
            audit_log,
            system_status: Arc::new(RwLock::new(SystemStatus::default())),
            backend,
            rate_limiter,
            started_at: Instant::now(),
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Records held per collection, summed across tenants
    pub async fn record_counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            (
                Subscription::COLLECTION,
                self.subscriptions.total_records().await,
            ),
            (Payment::COLLECTION, self.payments.total_records().await),
            (ContentItem::COLLECTION, self.content.total_records().await),
            (Template::COLLECTION, self.templates.total_records().await),
            (KycCase::COLLECTION, self.kyc.total_records().await),
            (
                Notification::COLLECTION,
                self.notifications.total_records().await,
            ),
            (Invoice::COLLECTION, self.invoices.total_records().await),
        ]
    }
}
