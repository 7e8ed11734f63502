//! Logging utilities
//!
//! Tracing subscriber setup and helpers for keeping secrets out of logs.

use crate::config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Number of characters kept at each end of a masked secret
const MASK_VISIBLE_CHARS: usize = 4;

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = match format {
        LogFormat::Json => fmt::layer().json().with_filter(filter).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry().with(console_layer).init();
}

/// Masked form of a secret, safe for logs and `Debug` output
///
/// Short secrets are hidden entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= MASK_VISIBLE_CHARS * 2 {
        return "***".to_string();
    }

    let head: String = chars[..MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
    format!("{}...{}", head, tail)
}
