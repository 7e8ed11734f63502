//! Utility modules
//!
//! Contains backoff scheduling, data URL handling and string helpers.

pub mod data_url;
pub mod retry;
pub mod string;

pub use data_url::{DataUrl, DataUrlError, DEFAULT_IMAGE_MIME};
pub use retry::RetryConfig;
pub use string::{prompt_preview, truncate_str};
