//! Base64 data URLs
//!
//! Images travel between the browser, this service and the provider as
//! `data:<mime>;base64,<payload>` strings.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use thiserror::Error;

/// MIME type assumed when the provider omits one
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Formats the provider rejects but that decode fine under a PNG label
const RELABEL_AS_PNG: &[&str] = &["image/avif"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Expected data URL with base64 content")]
    Malformed,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A parsed `data:` URL with a base64 payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    /// Base64 payload, as received
    pub data: String,
}

impl DataUrl {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parse `data:<mime>;base64,<payload>`
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let rest = input.trim().strip_prefix("data:").ok_or(DataUrlError::Malformed)?;
        let (mime_type, data) = rest.split_once(";base64,").ok_or(DataUrlError::Malformed)?;

        if mime_type.is_empty() || mime_type.contains(';') || data.is_empty() {
            return Err(DataUrlError::Malformed);
        }

        STANDARD
            .decode(data)
            .map_err(|e| DataUrlError::InvalidBase64(e.to_string()))?;

        Ok(Self::new(mime_type, data))
    }

    /// Relabel formats the provider does not accept
    ///
    /// Only the MIME label changes; the payload is passed through untouched.
    pub fn normalized(mut self) -> Self {
        if RELABEL_AS_PNG.contains(&self.mime_type.to_ascii_lowercase().as_str()) {
            tracing::info!(from = %self.mime_type, "Relabelling image as PNG for compatibility");
            self.mime_type = DEFAULT_IMAGE_MIME.to_string();
        }
        self
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}
