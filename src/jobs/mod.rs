use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

pub mod status;
pub mod tasks;

pub use status::{HealthState, SystemStatus};

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

/// Running background jobs; dropping this stops them
pub struct JobHandles {
    handles: Vec<JoinHandle<()>>,
}

impl JobHandles {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for JobHandles {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) -> JobHandles {
        info!("Starting background job scheduler");

        let handles = vec![
            // Spawn monitoring tasks
            tokio::spawn(Self::system_status_job(Arc::clone(&self))),
            tokio::spawn(Self::record_gauge_job(Arc::clone(&self))),
            // Spawn lifecycle tasks
            tokio::spawn(Self::subscription_sweep_job(Arc::clone(&self))),
        ];

        info!("Background jobs started");
        JobHandles { handles }
    }

    /// Refresh the system status card (every 5 seconds by default)
    async fn system_status_job(scheduler: Arc<Self>) {
        let mut interval = interval(scheduler.context.config.jobs.system_status_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let started = Instant::now();

            match tasks::refresh_system_status(&scheduler.context).await {
                Ok(()) => {
                    debug!("System status refreshed");
                    crate::metrics::record_background_job(
                        "system_status",
                        "success",
                        started.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    error!("Failed to refresh system status: {}", e);
                    crate::metrics::record_background_job(
                        "system_status",
                        "failure",
                        started.elapsed().as_secs_f64(),
                    );
                }
            }
        }
    }

    /// Expire lapsed subscriptions (hourly by default)
    async fn subscription_sweep_job(scheduler: Arc<Self>) {
        let mut interval = interval(scheduler.context.config.jobs.subscription_sweep_interval());

        loop {
            interval.tick().await;
            info!("Running lapsed subscription sweep");
            let started = Instant::now();

            match tasks::expire_lapsed_subscriptions(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Expired {} lapsed subscriptions", count);
                    } else {
                        info!("Subscription sweep: no lapsed subscriptions found");
                    }
                    crate::metrics::record_background_job(
                        "subscription_sweep",
                        "success",
                        started.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    error!("Failed to sweep subscriptions: {}", e);
                    crate::metrics::record_background_job(
                        "subscription_sweep",
                        "failure",
                        started.elapsed().as_secs_f64(),
                    );
                }
            }
        }
    }

    /// Publish record counts (every minute)
    async fn record_gauge_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            if let Err(e) = tasks::update_record_gauges(&scheduler.context).await {
                error!("Failed to update record gauges: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::context::AppContext;

    #[tokio::test]
    async fn test_dropping_handles_stops_jobs() {
        let config = ServerConfig::from_lookup(|key| match key {
            "HUB_JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "HUB_SYSTEM_STATUS_INTERVAL_SECS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        let ctx = Arc::new(AppContext::new(config).unwrap());
        let scheduler = Arc::new(JobScheduler::new(Arc::clone(&ctx)));

        let handles = scheduler.start();
        assert_eq!(handles.len(), 3);

        // The first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        let refreshed = ctx.system_status.read().await.updated_at;

        drop(handles);
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(ctx.system_status.read().await.updated_at, refreshed);
    }
}
