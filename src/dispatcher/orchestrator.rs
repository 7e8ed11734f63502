//! Credential dispatcher
//!
//! Runs provider operations with automatic failover across the credential
//! pool. A call is tagged with a [`Feature`]; the first attempt goes to the
//! feature's preferred credential, later attempts to the least-used healthy
//! one, and quota/rate-limit failures trigger a backoff and a retry on a
//! different credential.

use super::credential::{Credential, CredentialPool};
use super::feature::Feature;
use super::health::{
    is_transient_failure, HealthTracker, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_INTERVAL,
};
use super::selector::{choose, Selection, SelectionTier};
use crate::config::DispatchSettings;
use crate::utils::retry::{presets, RetryConfig};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a dispatched call
///
/// Every variant carries the originating feature and the number of attempts
/// that were started.
#[derive(Error, Debug)]
pub enum DispatchError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed with an error that a different credential would
    /// not fix
    #[error("{feature} request failed after {attempts} attempt(s): {source}")]
    NonRetryable {
        feature: Feature,
        attempts: u32,
        #[source]
        source: E,
    },

    /// Every attempt hit a quota or rate-limit failure
    #[error("All {attempts} attempt(s) for {feature} were rate limited: {source}")]
    RetriesExhausted {
        feature: Feature,
        attempts: u32,
        #[source]
        source: E,
    },

    /// No credential was left to try
    #[error("No credentials available for {feature} after {attempts} attempt(s)")]
    NoCredentialsAvailable {
        feature: Feature,
        attempts: u32,
        last_error: Option<E>,
    },
}

impl<E> DispatchError<E>
where
    E: std::error::Error + 'static,
{
    pub fn feature(&self) -> Feature {
        match self {
            Self::NonRetryable { feature, .. }
            | Self::RetriesExhausted { feature, .. }
            | Self::NoCredentialsAvailable { feature, .. } => *feature,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::NonRetryable { attempts, .. }
            | Self::RetriesExhausted { attempts, .. }
            | Self::NoCredentialsAvailable { attempts, .. } => *attempts,
        }
    }

    /// The last error returned by the operation, if any attempt ran
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::NonRetryable { source, .. } | Self::RetriesExhausted { source, .. } => {
                Some(source)
            }
            Self::NoCredentialsAvailable { last_error, .. } => last_error.as_ref(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        !matches!(self, Self::NonRetryable { .. })
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Tunables of the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Attempts per call when the caller does not specify one
    pub max_attempts: u32,

    /// Delay schedule between attempts
    pub backoff: RetryConfig,

    /// Consecutive failures that open a credential's circuit breaker
    pub failure_threshold: u32,

    /// Minimum time between two full health resets
    pub reset_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        let backoff = presets::provider_failover();
        Self {
            max_attempts: backoff.max_attempts,
            backoff,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_interval: DEFAULT_RESET_INTERVAL,
        }
    }
}

impl DispatcherConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self.backoff.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = self.backoff.with_initial_delay(initial).with_max_delay(max);
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_interval(mut self, interval: Duration) -> Self {
        self.reset_interval = interval;
        self
    }
}

impl From<&DispatchSettings> for DispatcherConfig {
    fn from(settings: &DispatchSettings) -> Self {
        Self::default()
            .with_max_attempts(settings.max_attempts)
            .with_backoff(
                Duration::from_millis(settings.backoff_base_ms),
                Duration::from_millis(settings.backoff_max_ms),
            )
            .with_failure_threshold(settings.failure_threshold)
            .with_reset_interval(Duration::from_secs(settings.reset_interval_secs))
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// Usage of a single credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUsage {
    #[serde(rename = "keyName")]
    pub name: String,
    pub usage_count: u64,
    pub is_rate_limited: bool,
    /// Feature that prefers this credential, or `unassigned`
    pub feature: String,
}

/// Pool-wide summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    #[serde(rename = "totalKeys")]
    pub total_credentials: usize,
    /// Credentials not currently flagged as rate limited
    #[serde(rename = "availableKeys")]
    pub healthy_credentials: usize,
    #[serde(rename = "rateLimitedKeys")]
    pub rate_limited_credentials: usize,
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Shared dispatcher for every outbound provider call
///
/// Construct one per process and share it behind an `Arc`.
pub struct CredentialDispatcher {
    pool: CredentialPool,
    state: Mutex<HealthTracker>,
    config: DispatcherConfig,
}

impl fmt::Debug for CredentialDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDispatcher")
            .field("credentials", &self.pool.len())
            .field("config", &self.config)
            .finish()
    }
}

impl CredentialDispatcher {
    pub fn new(pool: CredentialPool, config: DispatcherConfig) -> Self {
        let tracker = HealthTracker::new(
            pool.iter().map(Credential::shared_name),
            config.failure_threshold,
            config.reset_interval,
        );

        tracing::info!(
            credentials = pool.len(),
            max_attempts = config.max_attempts,
            failure_threshold = config.failure_threshold,
            reset_interval_secs = config.reset_interval.as_secs(),
            "Credential dispatcher initialized"
        );

        Self {
            pool,
            state: Mutex::new(tracker),
            config,
        }
    }

    pub fn from_settings(pool: CredentialPool, settings: &DispatchSettings) -> Self {
        Self::new(pool, DispatcherConfig::from(settings))
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Lock the health state
    ///
    /// The guard must never be held across an `.await`. A poisoned lock is
    /// recovered: the state is plain counters and flags.
    fn state(&self) -> MutexGuard<'_, HealthTracker> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Health and selection
    // ------------------------------------------------------------------------

    /// Name of the credential `feature` prefers
    pub fn preferred_for(&self, feature: Feature) -> &'static str {
        feature.preferred_credential()
    }

    /// Select a credential for `attempt` and count the selection
    ///
    /// The decision and the usage increment happen under the same lock.
    pub fn select_for_attempt(
        &self,
        feature: Feature,
        attempt: u32,
        excluded: &HashSet<Arc<str>>,
    ) -> Option<Selection> {
        let mut state = self.state();
        let selection = choose(&state, feature, attempt, excluded)?;
        state.record_selection(&selection.name);
        drop(state);

        match selection.tier {
            SelectionTier::Emergency => tracing::warn!(
                feature = %feature,
                credential = %selection.name,
                attempt,
                "All credentials unhealthy, using emergency fallback"
            ),
            tier => tracing::debug!(
                feature = %feature,
                credential = %selection.name,
                attempt,
                tier = %tier,
                "Selected credential"
            ),
        }

        Some(selection)
    }

    pub fn is_healthy(&self, name: &str) -> bool {
        self.state().is_healthy(name)
    }

    pub fn mark_unhealthy(&self, name: &str) {
        self.state().mark_unhealthy(name);
    }

    /// Clear all health flags if the reset interval has elapsed
    pub fn reset_all(&self) -> bool {
        self.state().reset_all()
    }

    /// Same as [`reset_all`](Self::reset_all), measured from `at`
    pub fn reset_all_at(&self, at: Instant) -> bool {
        self.state().reset_all_at(at)
    }

    /// Clear the health flags of one credential
    pub fn reset_one(&self, name: &str) -> bool {
        self.state().reset_one(name)
    }

    /// Whether at least one credential is currently healthy
    pub fn has_healthy_credential(&self) -> bool {
        let state = self.state();
        state.records().iter().any(|r| state.record_is_healthy(r))
    }

    // ------------------------------------------------------------------------
    // Retry orchestration
    // ------------------------------------------------------------------------

    /// Run `operation` with the configured number of attempts
    pub async fn execute<T, E, F, Fut>(
        &self,
        feature: Feature,
        operation: F,
    ) -> Result<T, DispatchError<E>>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        self.execute_with_retry(feature, self.config.max_attempts, operation)
            .await
    }

    /// Run `operation` with failover across the pool
    ///
    /// Each attempt selects a credential and hands it to `operation`.
    /// Success returns immediately. A failure whose message matches a
    /// quota/rate-limit signature marks the credential unhealthy, waits for
    /// the backoff delay and retries on another credential. Any other
    /// failure aborts the call.
    ///
    /// The credential chosen as preferred on the first attempt is flagged
    /// but stays eligible for the emergency tier, so a single-credential
    /// pool still gets a second try.
    pub async fn execute_with_retry<T, E, F, Fut>(
        &self,
        feature: Feature,
        max_attempts: u32,
        mut operation: F,
    ) -> Result<T, DispatchError<E>>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        let max_attempts = max_attempts.max(1);
        let mut excluded: HashSet<Arc<str>> = HashSet::new();
        let mut last_error: Option<E> = None;

        for attempt in 0..max_attempts {
            let credential = self
                .select_for_attempt(feature, attempt, &excluded)
                .and_then(|selection| {
                    self.pool
                        .get(&selection.name)
                        .cloned()
                        .map(|credential| (credential, selection.tier))
                });

            let Some((credential, tier)) = credential else {
                tracing::error!(
                    feature = %feature,
                    attempt = attempt + 1,
                    "No credentials available"
                );
                return Err(DispatchError::NoCredentialsAvailable {
                    feature,
                    attempts: attempt + 1,
                    last_error,
                });
            };

            let name = credential.shared_name();
            tracing::info!(
                feature = %feature,
                credential = %name,
                attempt = attempt + 1,
                max_attempts,
                "Dispatching request"
            );

            let err = match operation(credential).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let message = err.to_string();
            if !is_transient_failure(&message) {
                tracing::error!(
                    feature = %feature,
                    credential = %name,
                    attempt = attempt + 1,
                    error = %message,
                    "Request failed with non-retryable error"
                );
                return Err(DispatchError::NonRetryable {
                    feature,
                    attempts: attempt + 1,
                    source: err,
                });
            }

            self.mark_unhealthy(&name);
            if tier != SelectionTier::Preferred {
                excluded.insert(name.clone());
            }

            if attempt + 1 >= max_attempts {
                tracing::error!(
                    feature = %feature,
                    credential = %name,
                    attempts = attempt + 1,
                    error = %message,
                    "All attempts rate limited"
                );
                return Err(DispatchError::RetriesExhausted {
                    feature,
                    attempts: attempt + 1,
                    source: err,
                });
            }

            let delay = self.config.backoff.calculate_delay(attempt);
            tracing::warn!(
                feature = %feature,
                credential = %name,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "Rate limited, retrying with another credential"
            );
            last_error = Some(err);
            tokio::time::sleep(delay).await;
        }

        Err(DispatchError::NoCredentialsAvailable {
            feature,
            attempts: max_attempts,
            last_error,
        })
    }

    // ------------------------------------------------------------------------
    // Observability
    // ------------------------------------------------------------------------

    /// Per-credential usage, most used first
    pub fn usage_snapshot(&self) -> Vec<CredentialUsage> {
        let mut usage: Vec<CredentialUsage> = self
            .state()
            .records()
            .iter()
            .map(|record| CredentialUsage {
                name: record.name().to_string(),
                usage_count: record.usage_count(),
                is_rate_limited: record.is_rate_limited(),
                feature: Feature::preferring(record.name())
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| "unassigned".to_string()),
            })
            .collect();

        usage.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        usage
    }

    pub fn system_snapshot(&self) -> SystemStatus {
        let state = self.state();
        let records = state.records();
        let rate_limited = records.iter().filter(|r| r.is_rate_limited()).count();

        SystemStatus {
            total_credentials: records.len(),
            healthy_credentials: records.len() - rate_limited,
            rate_limited_credentials: rate_limited,
            total_requests: records.iter().map(|r| r.usage_count()).sum(),
        }
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Spawn the periodic health sweep
    ///
    /// The task holds a weak reference and stops once the dispatcher is
    /// dropped.
    pub fn spawn_reset_task(self: &Arc<Self>) -> JoinHandle<()> {
        let dispatcher: Weak<Self> = Arc::downgrade(self);
        let period = self.config.reset_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                // Gate on the scheduled tick so a late wakeup does not push
                // the next reset a full period back
                let scheduled = ticker.tick().await;
                let Some(dispatcher) = dispatcher.upgrade() else {
                    tracing::debug!("Dispatcher dropped, stopping health reset task");
                    break;
                };
                dispatcher.reset_all_at(scheduled);
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
