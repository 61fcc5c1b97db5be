/// Configuration management for Canvas Hub
use crate::error::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub authentication: AuthConfig,
    pub stores: StoreConfig,
    pub jobs: JobConfig,
    pub backend: BackendConfig,
    pub rate_limit: RateLimitConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for admin bearer tokens
    pub jwt_secret: String,
    /// Subjects granted superadmin regardless of their token role (comma-separated)
    pub admin_ids: Vec<String>,
}

/// Entity store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed each new tenant with demo records
    pub seed_mock_data: bool,
    pub audit_capacity: usize,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub system_status_interval_secs: u64,
    pub subscription_sweep_secs: u64,
}

/// AI collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the AI service; the simulated backend is used when unset
    pub ai_base_url: Option<String>,
    pub ai_timeout_secs: u64,
    pub simulated_delay_ms: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: u32,
}

impl JobConfig {
    pub fn system_status_interval(&self) -> Duration {
        Duration::from_secs(self.system_status_interval_secs)
    }

    pub fn subscription_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.subscription_sweep_secs)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> HubResult<T> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| HubError::Validation(format!("Invalid value for {}: {}", key, raw))),
        _ => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> HubResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> HubResult<Self> {
        let hostname = lookup("HUB_HOSTNAME").unwrap_or_else(|| "localhost".to_string());
        let port = parse_or(&lookup, "HUB_PORT", 8080u16)?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let jwt_secret = lookup("HUB_JWT_SECRET")
            .ok_or_else(|| HubError::Validation("JWT secret required".to_string()))?;

        // Parse admin ids from comma-separated list
        let admin_ids = lookup("HUB_ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        let seed_mock_data = parse_or(&lookup, "HUB_SEED_MOCK_DATA", true)?;
        let audit_capacity = parse_or(&lookup, "HUB_AUDIT_CAPACITY", 1000usize)?;

        let system_status_interval_secs =
            parse_or(&lookup, "HUB_SYSTEM_STATUS_INTERVAL_SECS", 5u64)?;
        let subscription_sweep_secs = parse_or(&lookup, "HUB_SUBSCRIPTION_SWEEP_SECS", 3600u64)?;

        let ai_base_url = lookup("HUB_AI_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let ai_timeout_secs = parse_or(&lookup, "HUB_AI_TIMEOUT_SECS", 30u64)?;
        let simulated_delay_ms = parse_or(&lookup, "HUB_SIMULATED_DELAY_MS", 1000u64)?;

        let requests_per_second = parse_or(&lookup, "HUB_RATE_LIMIT_RPS", 50u32)?;

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            authentication: AuthConfig {
                jwt_secret,
                admin_ids,
            },
            stores: StoreConfig {
                seed_mock_data,
                audit_capacity,
            },
            jobs: JobConfig {
                system_status_interval_secs,
                subscription_sweep_secs,
            },
            backend: BackendConfig {
                ai_base_url,
                ai_timeout_secs,
                simulated_delay_ms,
            },
            rate_limit: RateLimitConfig {
                // 0 disables limiting
                enabled: requests_per_second > 0,
                requests_per_second,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> HubResult<()> {
        if self.service.hostname.is_empty() {
            return Err(HubError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(HubError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.jobs.system_status_interval_secs == 0 || self.jobs.subscription_sweep_secs == 0 {
            return Err(HubError::Validation(
                "Job intervals must be at least one second".to_string(),
            ));
        }

        if let Some(url) = &self.backend.ai_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(HubError::Validation(format!(
                    "AI base URL must be http(s): {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config(pairs: &[(&str, &str)]) -> HubResult<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("HUB_JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.service.port, 8080);
        assert!(config.stores.seed_mock_data);
        assert_eq!(config.jobs.system_status_interval(), Duration::from_secs(5));
        assert!(config.backend.ai_base_url.is_none());
        assert!(config.rate_limit.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_secret() {
        assert!(matches!(config(&[]), Err(HubError::Validation(_))));
    }

    #[test]
    fn test_short_secret_fails_validation() {
        let config = config(&[("HUB_JWT_SECRET", "short")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HUB_JWT_SECRET", SECRET),
            ("HUB_PORT", "9000"),
            ("HUB_ADMIN_IDS", "alice, bob,,"),
            ("HUB_SEED_MOCK_DATA", "false"),
            ("HUB_AI_BASE_URL", "https://ai.canvashub.io/"),
            ("HUB_RATE_LIMIT_RPS", "0"),
        ])
        .unwrap();
        assert_eq!(config.service.port, 9000);
        assert_eq!(config.authentication.admin_ids, vec!["alice", "bob"]);
        assert!(!config.stores.seed_mock_data);
        assert_eq!(
            config.backend.ai_base_url.as_deref(),
            Some("https://ai.canvashub.io")
        );
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn test_invalid_port() {
        let result = config(&[("HUB_JWT_SECRET", SECRET), ("HUB_PORT", "http")]);
        assert!(matches!(result, Err(HubError::Validation(_))));
    }
}
