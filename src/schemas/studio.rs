//! HTTP request and response bodies of the studio API
//!
//! Field names are camelCase on the wire. Required text fields default to
//! empty so that a missing field and an empty one fail validation alike.

use crate::dispatcher::{CredentialUsage, Feature, SystemStatus};
use crate::services::prompts::RestorationKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default style strength on a 0-100 scale
pub const DEFAULT_STYLE_STRENGTH: f64 = 80.0;

fn default_generate_feature() -> Feature {
    Feature::TextToImage
}

fn default_style_strength() -> f64 {
    DEFAULT_STYLE_STRENGTH
}

// ============================================================================
// Prompt enhancement
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnhancePromptRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Prompt is required and must be a string"))]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePromptResponse {
    pub original_prompt: String,
    pub enhanced_prompt: String,
}

// ============================================================================
// Image generation
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Prompt is required and must be a string"))]
    pub prompt: String,

    #[serde(default)]
    pub enhance_prompt: bool,

    #[serde(default = "default_generate_feature")]
    pub feature: Feature,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String,
    /// Prompt actually sent, after optional enhancement
    pub prompt: String,
    pub original_prompt: String,
    pub feature: Feature,
}

// ============================================================================
// Image editing
// ============================================================================

/// Edit request; which fields are required depends on the images supplied
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditImageRequest {
    pub original_prompt: Option<String>,
    pub edit_instructions: Option<String>,
    pub original_image_data: Option<String>,
    pub edited_image_data: Option<String>,
    pub mask_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditImageResponse {
    pub image_url: String,
    pub edited_prompt: String,
    pub original_prompt: String,
    pub edit_instructions: String,
}

// ============================================================================
// Style transfer
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StyleTransferRequest {
    pub prompt: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Style prompt is required and must be a string"))]
    pub style_prompt: String,

    #[serde(default = "default_style_strength")]
    #[validate(range(min = 0.0, max = 100.0, message = "Strength must be between 0 and 100"))]
    pub strength: f64,

    pub image_data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleTransferResponse {
    pub image_url: String,
    pub applied_style: String,
    pub original_prompt: String,
}

// ============================================================================
// Photo restoration
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRestoreRequest {
    pub prompt: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Image data is required for photo restoration"))]
    pub image_data: String,

    #[serde(default)]
    pub restoration_type: RestorationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRestoreResponse {
    pub image_url: String,
    pub applied_restoration: RestorationKind,
    pub original_prompt: String,
}

// ============================================================================
// Credential monitoring
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCommand {
    pub action: Option<String>,
    pub key_name: Option<String>,
}

/// Usage and system snapshots together
#[derive(Debug, Clone, Serialize)]
pub struct MonitorOverview {
    pub system: SystemStatus,
    pub keys: Vec<CredentialUsage>,
}

/// Envelope of every monitoring response
#[derive(Debug, Clone, Serialize)]
pub struct MonitorResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

/// Error envelope of the monitoring endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorError {
    pub success: bool,
    pub error: String,
}
