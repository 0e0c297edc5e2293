//! Exponential backoff for transient transport failures.

use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the retry policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts, not counting the first try.
    pub max_retries: u32,
    #[serde(with = "millis")]
    pub initial_backoff: Duration,
    /// Caps exponential growth.
    #[serde(with = "millis")]
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Spreads each delay uniformly over `backoff * (1 ± jitter_fraction)`.
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

impl RetryConfig {
    /// A single attempt, never retried.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Stateless retry policy: computes the next delay given the attempt number.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before the `attempt`-th retry (1-based), or `None` once
    /// `max_retries` is exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let base_ms = self.config.initial_backoff.as_millis() as f64
            * self.config.multiplier.powi((attempt - 1) as i32);
        let cap_ms = self.config.max_backoff.as_millis() as f64;
        let capped = base_ms.min(cap_ms);

        let span = capped * self.config.jitter_fraction;
        let jitter_ms = if span > 0.0 {
            rand::thread_rng().gen_range(-span..=span)
        } else {
            0.0
        };
        Some(Duration::from_millis((capped + jitter_ms).max(0.0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(max_retries: u32, max_backoff: Duration, multiplier: f64) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(100),
            max_backoff,
            multiplier,
            jitter_fraction: 0.0,
        })
    }

    #[test]
    fn delays_double() {
        let policy = no_jitter(3, Duration::from_secs(30), 2.0);
        assert_eq!(policy.next_delay(1).unwrap().as_millis(), 100);
        assert_eq!(policy.next_delay(2).unwrap().as_millis(), 200);
        assert_eq!(policy.next_delay(3).unwrap().as_millis(), 400);
        assert!(policy.next_delay(4).is_none());
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = no_jitter(10, Duration::from_millis(500), 10.0);
        let d5 = policy.next_delay(5).unwrap();
        assert_eq!(d5, Duration::from_millis(500));
    }

    #[test]
    fn jitter_spreads_delays() {
        let policy = RetryPolicy::new(RetryConfig {
            jitter_fraction: 0.2,
            ..RetryConfig::default()
        });
        let delays: Vec<u128> = (0..64).map(|_| policy.next_delay(1).unwrap().as_millis()).collect();
        assert!(delays.iter().all(|ms| (80..=120).contains(ms)));
        assert!(delays.iter().any(|ms| *ms != delays[0]));
    }

    #[test]
    fn none_never_retries() {
        assert!(RetryPolicy::new(RetryConfig::none()).next_delay(1).is_none());
    }

    #[test]
    fn config_from_json_with_defaults() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_retries":5,"initial_backoff":250}"#).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_backoff, Duration::from_millis(250));
        assert_eq!(config.max_backoff, Duration::from_secs(10));
    }
}
