//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::dispatcher::CredentialDispatcher;
use crate::services::{ContentGenerator, GeminiClient, ImageStudio};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheaply cloneable; every field is shared.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Credential rotation and failover
    pub dispatcher: Arc<CredentialDispatcher>,

    /// Feature operations
    pub studio: ImageStudio,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails when no credential slot holds a secret.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let pool = settings
            .credential_pool()
            .context("Failed to build credential pool")?;

        tracing::debug!(base_url = %settings.gemini.base_url, "Creating Gemini client");
        let client = GeminiClient::new(&settings.gemini).context("Failed to create Gemini client")?;

        let dispatcher = Arc::new(CredentialDispatcher::from_settings(pool, &settings.dispatch));
        let state = Self::with_generator(settings, dispatcher, Arc::new(client));

        tracing::info!(
            credentials = state.dispatcher.pool().len(),
            "Application state initialized successfully"
        );

        Ok(state)
    }

    /// Assemble a state around an existing dispatcher and generator
    pub fn with_generator(
        settings: Settings,
        dispatcher: Arc<CredentialDispatcher>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            studio: ImageStudio::new(dispatcher.clone(), generator),
            dispatcher,
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
