/// System status monitor figures
use crate::entity::aggregate::round1;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
}

/// Live figures shown on the system status card
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub state: HealthState,
    /// Percent
    pub cpu_usage: f64,
    /// Percent
    pub memory_usage: f64,
    pub active_users: u32,
    pub requests_per_minute: u32,
    /// Percent of requests failing
    pub error_rate: f64,
    pub uptime_seconds: u64,
    pub updated_at: DateTime<Utc>,
}

/// CPU or memory above this marks the system degraded
const DEGRADED_THRESHOLD: f64 = 90.0;

impl SystemStatus {
    /// Draw a fresh set of figures
    pub fn sample(rng: &mut impl Rng, uptime_seconds: u64, now: DateTime<Utc>) -> Self {
        let cpu_usage = round1(rng.gen_range(5.0..95.0));
        let memory_usage = round1(rng.gen_range(30.0..92.0));
        let error_rate = round2(rng.gen_range(0.0..2.5));

        let state = if cpu_usage > DEGRADED_THRESHOLD || memory_usage > DEGRADED_THRESHOLD {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        };

        Self {
            state,
            cpu_usage,
            memory_usage,
            active_users: rng.gen_range(50..1500),
            requests_per_minute: rng.gen_range(200..5000),
            error_rate,
            uptime_seconds,
            updated_at: now,
        }
    }
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            state: HealthState::Healthy,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            active_users: 0,
            requests_per_minute: 0,
            error_rate: 0.0,
            uptime_seconds: 0,
            updated_at: Utc::now(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sample_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let status = SystemStatus::sample(&mut rng, 42, Utc::now());
            assert!((5.0..=95.0).contains(&status.cpu_usage));
            assert!((30.0..=92.0).contains(&status.memory_usage));
            assert!((0.0..=2.5).contains(&status.error_rate));
            assert!((50..1500).contains(&status.active_users));
            assert_eq!(status.uptime_seconds, 42);

            let hot = status.cpu_usage > 90.0 || status.memory_usage > 90.0;
            assert_eq!(status.state == HealthState::Degraded, hot);
        }
    }

    #[test]
    fn test_sample_rounding() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let status = SystemStatus::sample(&mut rng, 0, Utc::now());
            assert_eq!(status.cpu_usage, round1(status.cpu_usage));
            assert_eq!(status.memory_usage, round1(status.memory_usage));
            assert_eq!(status.error_rate, round2(status.error_rate));
        }
    }
}
