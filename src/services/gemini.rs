//! Gemini service for Google Gemini API interactions
//!
//! Talks to `streamGenerateContent` over REST and server-sent events. The
//! client itself holds no credentials: every call is made through a
//! [`ProviderSession`] bound to the credential the dispatcher selected.

use crate::config::GeminiSettings;
use crate::dispatcher::Credential;
use crate::schemas::gemini::{models, GeminiError, GeminiRequest, Part, StreamChunk};
use crate::utils::{DataUrl, DEFAULT_IMAGE_MIME};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the Gemini API
///
/// The `Display` output of [`ProviderError::Api`] carries the numeric code
/// and canonical status so quota failures are recognizable from the message.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {code} {status} - {message}")]
    Api {
        code: i32,
        status: String,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No image data received from Gemini")]
    NoImage,

    #[error("No text received from Gemini")]
    NoText,
}

// ============================================================================
// Content Generator
// ============================================================================

/// A backend able to run one `streamGenerateContent` call
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Every content part of the first candidate, across all stream chunks
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<Vec<Part>, ProviderError>;
}

/// An image returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> DataUrl {
        DataUrl::new(self.mime_type.clone(), self.data.clone())
    }

    /// First inline image among `parts`
    pub fn first_in(parts: Vec<Part>) -> Option<Self> {
        parts
            .into_iter()
            .filter_map(|p| p.inline_data)
            .find(|d| !d.data.is_empty())
            .map(|d| Self {
                mime_type: if d.mime_type.is_empty() {
                    DEFAULT_IMAGE_MIME.to_string()
                } else {
                    d.mime_type
                },
                data: d.data,
            })
    }
}

/// Concatenated text of `parts`
pub fn collect_text(parts: &[Part]) -> String {
    parts.iter().filter_map(|p| p.text.as_deref()).collect()
}

// ============================================================================
// Provider Session
// ============================================================================

/// A generator bound to one credential for the duration of one attempt
pub struct ProviderSession<'a> {
    generator: &'a dyn ContentGenerator,
    credential: Credential,
}

impl<'a> ProviderSession<'a> {
    pub fn new(generator: &'a dyn ContentGenerator, credential: Credential) -> Self {
        Self {
            generator,
            credential,
        }
    }

    pub async fn generate(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<Vec<Part>, ProviderError> {
        self.generator.generate(&self.credential, model, request).await
    }

    /// Run an image request and return the first image in the response
    pub async fn generate_image(
        &self,
        request: &GeminiRequest,
    ) -> Result<GeneratedImage, ProviderError> {
        let parts = self.generate(models::IMAGE, request).await?;
        let text = collect_text(&parts);
        match GeneratedImage::first_in(parts) {
            Some(image) => {
                tracing::debug!(
                    credential = %self.credential.name(),
                    mime_type = %image.mime_type,
                    "Found image data in response"
                );
                Ok(image)
            }
            None => {
                if !text.is_empty() {
                    tracing::debug!(text = %crate::utils::prompt_preview(&text), "Response held only text");
                }
                Err(ProviderError::NoImage)
            }
        }
    }

    /// Run a text request and return the trimmed, concatenated answer
    pub async fn generate_text(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<String, ProviderError> {
        let parts = self.generate(model, request).await?;
        let text = collect_text(&parts);
        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::NoText);
        }
        Ok(text.to_string())
    }
}

// ============================================================================
// Gemini Client
// ============================================================================

/// REST client for the Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        tracing::info!(
            base_url = %settings.base_url,
            timeout_seconds = settings.timeout_seconds,
            "Initialized Gemini client"
        );

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<Vec<Part>, ProviderError> {
        let url = self.stream_url(model);

        tracing::debug!(
            model = %model,
            credential = %credential.name(),
            "Calling Gemini streamGenerateContent API"
        );

        let mut response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.secret())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(gemini_error) = serde_json::from_str::<GeminiError>(&error_text) {
                return Err(ProviderError::Api {
                    code: gemini_error.error.code,
                    status: gemini_error.error.status,
                    message: gemini_error.error.message,
                });
            }

            return Err(ProviderError::Api {
                code: i32::from(status.as_u16()),
                status: status.canonical_reason().unwrap_or_default().to_string(),
                message: error_text,
            });
        }

        let mut decoder = SseDecoder::default();
        let mut parts = Vec::new();

        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| ProviderError::Stream(e.to_string()))?;
            let (events, done) = match chunk {
                Some(bytes) => (decoder.push(&bytes), false),
                None => (decoder.finish(), true),
            };

            for data in events {
                let chunk: StreamChunk = serde_json::from_str(&data).map_err(|e| {
                    tracing::warn!(error = %e, "Failed to parse stream chunk");
                    ProviderError::Parse(e.to_string())
                })?;
                parts.extend(chunk.into_parts());
            }

            if done {
                break;
            }
        }

        Ok(parts)
    }
}

// ============================================================================
// Server-Sent Events
// ============================================================================

/// Incremental decoder for `data:` lines of an SSE stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw bytes, returning the data payload of every completed event
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some((end, sep_len)) = find_event_boundary(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + sep_len).take(end).collect();
            if let Some(data) = event_data(&event) {
                events.push(data);
            }
        }

        events
    }

    /// Flush a trailing event without a terminating blank line
    pub fn finish(&mut self) -> Vec<String> {
        let event = std::mem::take(&mut self.buffer);
        event_data(&event).into_iter().collect()
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn event_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();

    let data = data.join("\n");
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::gemini::InlineData;

    #[test]
    fn test_sse_decoder_splits_events() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b"data: {\"a\":1}\n\ndata: {\"b\"");
        assert_eq!(events, vec!["{\"a\":1}"]);

        let events = decoder.push(b":2}\r\n\r\n");
        assert_eq!(events, vec!["{\"b\":2}"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_sse_decoder_handles_split_utf8_and_trailer() {
        let payload = "data: {\"text\":\"héllo\"}".as_bytes();
        // Split inside the two-byte 'é'
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let (head, tail) = payload.split_at(split);

        let mut decoder = SseDecoder::default();
        assert!(decoder.push(head).is_empty());
        assert!(decoder.push(tail).is_empty());
        assert_eq!(decoder.finish(), vec!["{\"text\":\"héllo\"}"]);
    }

    #[test]
    fn test_sse_decoder_skips_done_and_comments() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\n\ndata: [DONE]\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_first_image_defaults_mime() {
        let parts = vec![
            Part::text("here you go"),
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: String::new(),
                    data: "aGVsbG8=".to_string(),
                }),
            },
            Part::inline_data("image/jpeg", "b3RoZXI="),
        ];

        let image = GeneratedImage::first_in(parts).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.to_data_url().to_string(), "data:image/png;base64,aGVsbG8=");
        assert!(GeneratedImage::first_in(vec![Part::text("no")]).is_none());
    }

    #[test]
    fn test_api_error_is_classified_as_transient() {
        let err = ProviderError::Api {
            code: 429,
            status: "RESOURCE_EXHAUSTED".to_string(),
            message: "Quota exceeded for metric".to_string(),
        };
        assert!(crate::dispatcher::is_transient_failure(&err.to_string()));

        let err = ProviderError::Api {
            code: 400,
            status: "INVALID_ARGUMENT".to_string(),
            message: "Unsupported MIME type: image/avif".to_string(),
        };
        assert!(!crate::dispatcher::is_transient_failure(&err.to_string()));
    }

    #[test]
    fn test_client_trims_base_url() {
        let settings = GeminiSettings {
            base_url: "http://localhost:9999/v1beta/".to_string(),
            timeout_seconds: 5,
        };
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(
            client.stream_url("m"),
            "http://localhost:9999/v1beta/models/m:streamGenerateContent?alt=sse"
        );
    }
}
