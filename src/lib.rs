//! Image Studio
//!
//! An image generation and editing service on top of Google Gemini. Every
//! provider call goes through a [`dispatcher::CredentialDispatcher`] that
//! routes each feature to its own API key, tracks key health, and fails over
//! across the pool with exponential backoff when a key hits its quota.

// Public modules
pub mod api;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use dispatcher::{CredentialDispatcher, Feature};
pub use error::ApiError;
pub use server::App;
