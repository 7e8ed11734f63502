//! Google Gemini API schema definitions
//!
//! Request and streaming response formats for `streamGenerateContent`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Gemini API request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// The content of the conversation
    pub contents: Vec<GeminiContent>,

    /// Generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    /// Single user turn made of `parts`
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: None,
        }
    }

    /// Ask for image output
    pub fn with_image_output(mut self) -> Self {
        self.generation_config = Some(GenerationConfig::image_and_text());
        self
    }

    /// Text of every part, in order
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content block containing role and parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role: "user" or "model"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A part of the content: text or inline data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Inline data (images)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Inline data for images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type (e.g., "image/jpeg", "image/png"); the API may omit it
    #[serde(default)]
    pub mime_type: String,

    /// Base64-encoded data
    pub data: String,
}

/// Generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Output modalities, e.g. `["IMAGE", "TEXT"]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    pub fn image_and_text() -> Self {
        Self {
            response_modalities: Some(vec![
                modality::IMAGE.to_string(),
                modality::TEXT.to_string(),
            ]),
            temperature: None,
        }
    }
}

// ============================================================================
// Streaming Response Types
// ============================================================================

/// Streaming response chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    /// Candidates (partial)
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl StreamChunk {
    /// Parts of the first candidate
    pub fn into_parts(self) -> Vec<Part> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
    }
}

/// A candidate response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content; absent on safety blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<GeminiContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Gemini API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiError {
    pub error: GeminiErrorDetail,
}

/// Gemini error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorDetail {
    /// HTTP-like error code (429 for quota errors)
    pub code: i32,

    pub message: String,

    /// Canonical status, e.g. `RESOURCE_EXHAUSTED`
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Model Constants
// ============================================================================

/// Models used by the studio
pub mod models {
    /// Prompt rewriting
    pub const TEXT: &str = "gemini-2.5-flash";
    /// Image generation and editing
    pub const IMAGE: &str = "gemini-2.5-flash-image-preview";
    /// Image analysis
    pub const VISION: &str = "gemini-2.0-flash-exp";
}

pub mod modality {
    pub const IMAGE: &str = "IMAGE";
    pub const TEXT: &str = "TEXT";
}
