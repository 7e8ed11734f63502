//! Credential Dispatcher Module
//!
//! Every outbound provider call goes through a single [`CredentialDispatcher`]
//! that rotates across a pool of API keys.
//!
//! # Features
//! - Static feature -> preferred credential table
//! - Least-used selection for retries, with an emergency fallback
//! - Rate-limit flags and a consecutive-failure circuit breaker per credential
//! - Exponential backoff between attempts
//! - Usage and health snapshots for operators
//!
//! # Example
//! ```ignore
//! use image_studio::dispatcher::{CredentialDispatcher, CredentialPool, DispatcherConfig, Feature};
//!
//! let pool = CredentialPool::from_pairs([("GEMINI_API_KEY", "...")])?;
//! let dispatcher = CredentialDispatcher::new(pool, DispatcherConfig::default());
//!
//! let text = dispatcher
//!     .execute(Feature::EnhancePrompt, |credential| async move {
//!         call_provider(credential.secret()).await
//!     })
//!     .await?;
//! ```

mod credential;
mod feature;
mod health;
mod orchestrator;
mod selector;

pub use credential::{Credential, CredentialPool, PoolError, CREDENTIAL_SLOTS};
pub use feature::{Feature, PREFERRED_CREDENTIALS};
pub use health::{
    is_transient_failure, CredentialHealth, HealthTracker, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_RESET_INTERVAL, TRANSIENT_ERROR_PATTERNS,
};
pub use orchestrator::{
    CredentialDispatcher, CredentialUsage, DispatchError, DispatcherConfig, SystemStatus,
};
pub use selector::{choose, Selection, SelectionTier};
