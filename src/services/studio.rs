//! Image studio operations
//!
//! Each operation builds a Gemini request and runs it through the
//! [`CredentialDispatcher`] under its own feature tag, so that every feature
//! draws on its own credential first and fails over across the pool.

use crate::dispatcher::{CredentialDispatcher, DispatchError, Feature};
use crate::schemas::gemini::{models, GeminiRequest, Part};
use crate::services::gemini::{ContentGenerator, GeneratedImage, ProviderError, ProviderSession};
use crate::services::prompts::{self, RestorationKind};
use crate::utils::{prompt_preview, DataUrl, DataUrlError};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Invalid {field} image data format: {source}")]
    InvalidImageData {
        field: &'static str,
        #[source]
        source: DataUrlError,
    },

    #[error("Failed to {operation}: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: DispatchError<ProviderError>,
    },
}

impl StudioError {
    fn operation(operation: &'static str) -> impl FnOnce(DispatchError<ProviderError>) -> Self {
        move |source| Self::Operation { operation, source }
    }

    /// Whether the failure stems from the submitted image's encoding or format
    pub fn is_image_format_error(&self) -> bool {
        match self {
            Self::InvalidImageData { .. } => true,
            Self::Operation { source, .. } => {
                let message = source.to_string();
                ["MIME type", "image/avif", "image/webp", "format"]
                    .iter()
                    .any(|needle| message.contains(needle))
            }
        }
    }
}

fn parse_image(field: &'static str, data: &str) -> Result<DataUrl, StudioError> {
    DataUrl::parse(data)
        .map(DataUrl::normalized)
        .map_err(|source| StudioError::InvalidImageData { field, source })
}

fn image_part(image: &DataUrl) -> Part {
    Part::inline_data(image.mime_type.clone(), image.data.clone())
}

// ============================================================================
// Inputs
// ============================================================================

/// Inputs of a canvas edit
///
/// With both images the provider sees the original and the edited canvas;
/// with only `original_image` it edits that image; with neither it
/// regenerates from text.
#[derive(Debug, Clone, Default)]
pub struct EditImageInput {
    pub original_prompt: String,
    pub instructions: String,
    pub original_image: Option<String>,
    pub edited_image: Option<String>,
    pub mask: Option<String>,
}

// ============================================================================
// Image Studio
// ============================================================================

/// Feature operations on top of the dispatcher
#[derive(Clone)]
pub struct ImageStudio {
    dispatcher: Arc<CredentialDispatcher>,
    generator: Arc<dyn ContentGenerator>,
}

impl ImageStudio {
    pub fn new(dispatcher: Arc<CredentialDispatcher>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            dispatcher,
            generator,
        }
    }

    pub fn dispatcher(&self) -> &Arc<CredentialDispatcher> {
        &self.dispatcher
    }

    /// Run an image request for `feature`
    async fn run_image(
        &self,
        feature: Feature,
        request: &GeminiRequest,
    ) -> Result<GeneratedImage, DispatchError<ProviderError>> {
        let generator: &dyn ContentGenerator = &*self.generator;
        self.dispatcher
            .execute(feature, move |credential| async move {
                ProviderSession::new(generator, credential)
                    .generate_image(request)
                    .await
            })
            .await
    }

    /// Rewrite a prompt for better image generation
    ///
    /// Never fails: any error yields a locally enhanced prompt.
    pub async fn enhance_prompt(&self, prompt: &str) -> String {
        let request = GeminiRequest::user(vec![Part::text(prompts::enhancement(prompt))]);
        let request = &request;
        let generator: &dyn ContentGenerator = &*self.generator;

        let result = self
            .dispatcher
            .execute(Feature::EnhancePrompt, move |credential| async move {
                ProviderSession::new(generator, credential)
                    .generate_text(models::TEXT, request)
                    .await
            })
            .await;

        match result {
            Ok(enhanced) => {
                tracing::info!(
                    original = %prompt_preview(prompt),
                    enhanced = %prompt_preview(&enhanced),
                    "Prompt enhanced"
                );
                enhanced
            }
            Err(e) => {
                tracing::warn!(error = %e, "Prompt enhancement failed, using local fallback");
                prompts::fallback_enhancement(prompt)
            }
        }
    }

    /// Generate an image from text
    pub async fn generate_image(
        &self,
        prompt: &str,
        feature: Feature,
    ) -> Result<GeneratedImage, StudioError> {
        tracing::info!(feature = %feature, prompt = %prompt_preview(prompt), "Generating image");

        let request = GeminiRequest::user(vec![Part::text(prompt)]).with_image_output();
        self.run_image(feature, &request)
            .await
            .map_err(StudioError::operation("generate image"))
    }

    /// Generate an image from a prompt combined with a style description
    pub async fn generate_image_with_style(
        &self,
        prompt: &str,
        style: &str,
    ) -> Result<GeneratedImage, StudioError> {
        self.generate_image(&prompts::with_style(prompt, style), Feature::StyleTransfer)
            .await
    }

    /// Edit an image from instructions, in dual-image, single-image or text mode
    pub async fn edit_image(&self, input: EditImageInput) -> Result<GeneratedImage, StudioError> {
        let EditImageInput {
            original_prompt,
            instructions,
            original_image,
            edited_image,
            mask,
        } = input;

        let request = match (original_image.as_deref(), edited_image.as_deref()) {
            (Some(original), Some(edited)) => {
                tracing::info!(has_mask = mask.is_some(), "Editing image from original and canvas");
                let mut parts = vec![
                    image_part(&parse_image("original", original)?),
                    image_part(&parse_image("edited", edited)?),
                ];
                if let Some(mask) = mask.as_deref() {
                    match parse_image("mask", mask) {
                        Ok(mask) => parts.push(image_part(&mask)),
                        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable mask"),
                    }
                }
                parts.push(Part::text(prompts::dual_image_edit(&original_prompt, &instructions)));
                GeminiRequest::user(parts).with_image_output()
            }
            (Some(original), None) => {
                tracing::info!("Editing single image");
                GeminiRequest::user(vec![
                    image_part(&parse_image("original", original)?),
                    Part::text(prompts::single_image_edit(&original_prompt, &instructions)),
                ])
                .with_image_output()
            }
            _ => {
                tracing::info!("Editing from text only");
                let prompt = prompts::text_edit(&original_prompt, &instructions);
                let request = GeminiRequest::user(vec![Part::text(prompt)]).with_image_output();
                return self
                    .run_image(Feature::Default, &request)
                    .await
                    .map_err(StudioError::operation("edit image"));
            }
        };

        self.run_image(Feature::CanvasEditor, &request)
            .await
            .map_err(StudioError::operation("edit image"))
    }

    /// Generate an image in the style of an optional reference image
    pub async fn style_transfer(
        &self,
        prompt: &str,
        reference: Option<&str>,
    ) -> Result<GeneratedImage, StudioError> {
        let parts = match reference {
            Some(reference) => {
                let reference = parse_image("reference", reference)?;
                vec![Part::text(prompts::reference_style(prompt)), image_part(&reference)]
            }
            None => vec![Part::text(prompt)],
        };

        tracing::info!(
            has_reference = reference.is_some(),
            prompt = %prompt_preview(prompt),
            "Performing style transfer"
        );

        let request = GeminiRequest::user(parts).with_image_output();
        self.run_image(Feature::StyleTransfer, &request)
            .await
            .map_err(StudioError::operation("perform style transfer"))
    }

    /// Restore, colorize or enhance a photo
    ///
    /// The vision model first describes the photo; the description then
    /// drives image generation. Both steps run on the same credential.
    pub async fn restore_photo(
        &self,
        prompt: &str,
        image: &str,
        kind: RestorationKind,
    ) -> Result<GeneratedImage, StudioError> {
        let image = parse_image("photo", image)?;
        tracing::info!(kind = %kind, mime_type = %image.mime_type, "Starting photo restoration");

        let analysis_request = GeminiRequest::user(vec![
            image_part(&image),
            Part::text(kind.analysis_prompt(prompt)),
        ]);
        let analysis_request = &analysis_request;
        let generator: &dyn ContentGenerator = &*self.generator;

        self.dispatcher
            .execute(Feature::PhotoRestore, move |credential| async move {
                let session = ProviderSession::new(generator, credential);

                let analysis = session
                    .generate_text(models::VISION, analysis_request)
                    .await?;
                tracing::debug!(analysis = %prompt_preview(&analysis), "Photo analysis completed");

                let generation_request =
                    GeminiRequest::user(vec![Part::text(kind.generation_prompt(&analysis))])
                        .with_image_output();
                session.generate_image(&generation_request).await
            })
            .await
            .map_err(StudioError::operation("perform photo restoration"))
    }
}

// ============================================================================
// Tests
// ============================================================================
