//! Credential health tracking
//!
//! Keeps per-credential usage counts, rate-limit flags and consecutive
//! failure counters, and classifies remote failures as transient (quota /
//! rate limit) or not.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Consecutive failures after which a credential is treated as unhealthy
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Interval between full health resets
pub const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Error message fragments that identify a quota or rate-limit failure
///
/// Matched case-insensitively as substrings.
pub const TRANSIENT_ERROR_PATTERNS: &[&str] = &[
    "quota exceeded",
    "rate limit",
    "daily limit",
    "too many requests",
    "resource exhausted",
    "quota_exceeded",
    "rate_limit_exceeded",
    "daily_limit_exceeded",
    "maximum call stack size exceeded",
    "429",
    "resource_exhausted",
    "api_quota_exceeded",
];

/// Whether an error message carries a known quota/rate-limit signature
pub fn is_transient_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_ERROR_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

// ============================================================================
// Credential Health
// ============================================================================

/// Health and usage bookkeeping for one credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHealth {
    name: Arc<str>,
    usage_count: u64,
    rate_limited: bool,
    consecutive_failures: u32,
}

impl CredentialHealth {
    fn new(name: Arc<str>) -> Self {
        Self {
            name,
            usage_count: 0,
            rate_limited: false,
            consecutive_failures: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn clear(&mut self) -> bool {
        let changed = self.rate_limited || self.consecutive_failures > 0;
        self.rate_limited = false;
        self.consecutive_failures = 0;
        changed
    }
}

// ============================================================================
// Health Tracker
// ============================================================================

/// Health state for every credential in the pool, in pool order
#[derive(Debug)]
pub struct HealthTracker {
    records: Vec<CredentialHealth>,
    failure_threshold: u32,
    reset_interval: Duration,
    last_reset: Instant,
}

impl HealthTracker {
    pub fn new<I>(names: I, failure_threshold: u32, reset_interval: Duration) -> Self
    where
        I: IntoIterator<Item = Arc<str>>,
    {
        Self {
            records: names.into_iter().map(CredentialHealth::new).collect(),
            failure_threshold,
            reset_interval,
            last_reset: Instant::now(),
        }
    }

    pub fn records(&self) -> &[CredentialHealth] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&CredentialHealth> {
        self.records.iter().find(|r| r.name() == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut CredentialHealth> {
        self.records.iter_mut().find(|r| r.name() == name)
    }

    /// Healthy iff not rate-limited and below the failure threshold
    ///
    /// Unknown credentials are never healthy.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.get(name)
            .map(|r| self.record_is_healthy(r))
            .unwrap_or(false)
    }

    pub(crate) fn record_is_healthy(&self, record: &CredentialHealth) -> bool {
        !record.rate_limited && record.consecutive_failures < self.failure_threshold
    }

    /// Flag a credential as rate-limited and count the failure
    pub fn mark_unhealthy(&mut self, name: &str) {
        let threshold = self.failure_threshold;
        match self.get_mut(name) {
            Some(record) => {
                record.rate_limited = true;
                record.consecutive_failures = record.consecutive_failures.saturating_add(1);
                tracing::warn!(
                    credential = name,
                    failures = record.consecutive_failures,
                    circuit_open = record.consecutive_failures >= threshold,
                    "Credential rate limited and marked unavailable"
                );
            }
            None => {
                tracing::debug!(credential = name, "Ignoring health update for unknown credential");
            }
        }
    }

    /// Count one selection of `name`
    pub fn record_selection(&mut self, name: &str) {
        if let Some(record) = self.get_mut(name) {
            record.usage_count = record.usage_count.saturating_add(1);
        }
    }

    /// Periodic sweep: clear all flags and counters if the interval elapsed
    ///
    /// Returns `true` if a reset happened.
    pub fn reset_all(&mut self) -> bool {
        self.reset_all_at(Instant::now())
    }

    pub fn reset_all_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_reset) < self.reset_interval {
            return false;
        }
        for record in &mut self.records {
            record.clear();
        }
        self.last_reset = now;
        tracing::info!("Rate limits and circuit breakers reset for all credentials");
        true
    }

    /// Manual override for one credential
    ///
    /// Clears both the rate-limit flag and the failure counter. Returns
    /// `false` if the credential was already healthy or is unknown.
    pub fn reset_one(&mut self, name: &str) -> bool {
        let cleared = self.get_mut(name).map(CredentialHealth::clear).unwrap_or(false);
        if cleared {
            tracing::info!(credential = name, "Manually reset rate limit and circuit breaker");
        }
        cleared
    }
}

// ============================================================================
// Tests
// ============================================================================
