/// Rate Limiting System
use crate::{
    config::RateLimitConfig,
    error::{HubError, HubResult},
};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Limiter quota derived from the `rate_limit` config section
#[derive(Debug, Clone)]
pub struct LimiterSettings {
    pub enabled: bool,
    /// Requests per second across the service
    pub requests_per_second: u32,
    /// Burst size
    pub burst_size: u32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 50,
            burst_size: 100,
        }
    }
}

impl From<&RateLimitConfig> for LimiterSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            requests_per_second: config.requests_per_second,
            burst_size: config.requests_per_second.saturating_mul(2),
        }
    }
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(config: LimiterSettings) -> Self {
        let rps = NonZeroU32::new(config.requests_per_second);
        let limiter = match (config.enabled, rps) {
            (true, Some(rps)) => {
                let burst = NonZeroU32::new(config.burst_size).unwrap_or(rps);
                Some(Arc::new(GovernorLimiter::direct(
                    Quota::per_second(rps).allow_burst(burst),
                )))
            }
            _ => None,
        };

        Self {
            limiter,
            limit: config.requests_per_second,
        }
    }

    pub fn check(&self) -> HubResult<()> {
        match &self.limiter {
            Some(limiter) => limiter.check().map_err(|_| HubError::RateLimitExceeded {
                retry_after: Duration::from_secs(1),
            }),
            None => Ok(()),
        }
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Response {
    match ctx.rate_limiter.check() {
        Ok(()) => {
            let mut response = next.run(request).await;
            if let Ok(limit) = HeaderValue::from_str(&ctx.rate_limiter.limit.to_string()) {
                response.headers_mut().insert("X-RateLimit-Limit", limit);
            }
            response
        }
        Err(err) => {
            tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
            let mut response = err.into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from_static("1"));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(LimiterSettings::default());

        // Should allow first request
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(LimiterSettings {
            enabled: true,
            requests_per_second: 1,
            burst_size: 5,
        });

        // Should allow burst requests
        for _ in 0..5 {
            assert!(limiter.check().is_ok());
        }

        // Should hit rate limit after burst
        assert!(matches!(
            limiter.check(),
            Err(HubError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_settings_from_config_section() {
        let settings = LimiterSettings::from(&RateLimitConfig {
            enabled: true,
            requests_per_second: 20,
        });
        assert!(settings.enabled);
        assert_eq!(settings.requests_per_second, 20);
        assert_eq!(settings.burst_size, 40);
    }

    #[test]
    fn test_disabled_limiter_never_blocks() {
        let limiter = RateLimiter::new(LimiterSettings {
            enabled: false,
            requests_per_second: 1,
            burst_size: 1,
        });
        for _ in 0..100 {
            assert!(limiter.check().is_ok());
        }
    }
}
