//! Image endpoints
//!
//! Generation, canvas editing, style transfer and photo restoration. Images
//! travel as `data:` URLs in both directions.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use crate::dispatcher::Feature;
use crate::error::ApiError;
use crate::schemas::studio::{
    EditImageRequest, EditImageResponse, GenerateImageRequest, GenerateImageResponse,
    PhotoRestoreRequest, PhotoRestoreResponse, StyleTransferRequest, StyleTransferResponse,
};
use crate::server::state::AppState;
use crate::services::{prompts, EditImageInput, GeneratedImage};
use crate::utils::prompt_preview;

const DUAL_EDIT_CONCEPT: &str = "Dual image editing with original and edited versions";
const CANVAS_EDIT_CONCEPT: &str = "Canvas image edit";
const PHOTO_FORMAT_UNSUPPORTED: &str =
    "Image format not supported. Please try with a different image format (PNG, JPEG, or WebP).";

/// Treat empty strings like absent fields
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn image_url(image: &GeneratedImage) -> String {
    image.to_data_url().to_string()
}

/// POST /api/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    tracing::info!(
        feature = %request.feature,
        enhance = request.enhance_prompt,
        prompt = %prompt_preview(&request.prompt),
        "Generate image requested"
    );

    let prompt = if request.enhance_prompt {
        state.studio.enhance_prompt(&request.prompt).await
    } else {
        request.prompt.clone()
    };

    let image = state
        .studio
        .generate_image(&prompt, request.feature)
        .await
        .map_err(|e| ApiError::operation("Failed to generate image", e))?;

    Ok(Json(GenerateImageResponse {
        image_url: image_url(&image),
        prompt,
        original_prompt: request.prompt,
        feature: request.feature,
    }))
}

/// POST /api/edit-image
///
/// With both images the canvas is edited against the original; with only the
/// edited canvas that image is edited on its own; otherwise the image is
/// regenerated from the original prompt and the instructions.
pub async fn edit_image(
    State(state): State<AppState>,
    payload: Result<Json<EditImageRequest>, JsonRejection>,
) -> Result<Json<EditImageResponse>, ApiError> {
    let Json(request) = payload?;
    let instructions = non_empty(request.edit_instructions);
    let original_image = non_empty(request.original_image_data);
    let edited_image = non_empty(request.edited_image_data);
    let mask = non_empty(request.mask_data);

    tracing::info!(
        has_original_prompt = request.original_prompt.is_some(),
        has_instructions = instructions.is_some(),
        has_original_image = original_image.is_some(),
        has_edited_image = edited_image.is_some(),
        has_mask = mask.is_some(),
        "Edit image requested"
    );

    let (input, original_prompt, edited_prompt) = match (original_image, edited_image) {
        (Some(original), Some(edited)) => {
            let instructions = instructions.ok_or_else(|| {
                ApiError::bad_request("Edit instructions are required for image editing")
            })?;
            let input = EditImageInput {
                original_prompt: DUAL_EDIT_CONCEPT.to_string(),
                instructions: instructions.clone(),
                original_image: Some(original),
                edited_image: Some(edited),
                mask,
            };
            (input, "Dual image editing".to_string(), instructions)
        }
        (None, Some(edited)) => {
            let instructions = instructions.ok_or_else(|| {
                ApiError::bad_request("Edit instructions are required for image editing")
            })?;
            let input = EditImageInput {
                original_prompt: CANVAS_EDIT_CONCEPT.to_string(),
                instructions: instructions.clone(),
                original_image: Some(edited),
                edited_image: None,
                mask,
            };
            (input, "Canvas image".to_string(), instructions)
        }
        _ => {
            let original_prompt = non_empty(request.original_prompt).ok_or_else(|| {
                ApiError::bad_request("Original prompt is required and must be a string")
            })?;
            let instructions = instructions.ok_or_else(|| {
                ApiError::bad_request("Edit instructions are required and must be a string")
            })?;
            let edited_prompt = prompts::text_edit(&original_prompt, &instructions);
            let input = EditImageInput {
                original_prompt: original_prompt.clone(),
                instructions,
                ..Default::default()
            };
            (input, original_prompt, edited_prompt)
        }
    };

    let edit_instructions = input.instructions.clone();
    let image = state
        .studio
        .edit_image(input)
        .await
        .map_err(|e| ApiError::from_studio_error(e, "Failed to edit image"))?;

    Ok(Json(EditImageResponse {
        image_url: image_url(&image),
        edited_prompt,
        original_prompt,
        edit_instructions,
    }))
}

/// POST /api/style-transfer
///
/// An uploaded image is restyled directly. If the provider cannot read its
/// format the style is rendered from text instead.
pub async fn style_transfer(
    State(state): State<AppState>,
    payload: Result<Json<StyleTransferRequest>, JsonRejection>,
) -> Result<Json<StyleTransferResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let style = request.style_prompt.as_str();
    let strength = request.strength;

    tracing::info!(
        style = %prompt_preview(style),
        strength = strength,
        has_image = request.image_data.is_some(),
        "Style transfer requested"
    );

    let Some(image) = non_empty(request.image_data.clone()) else {
        let prompt = non_empty(request.prompt.clone()).ok_or_else(|| {
            ApiError::bad_request("Prompt is required for text-based style generation")
        })?;
        let applied_style = prompts::text_style_influence(style, strength);
        let generated = state
            .studio
            .generate_image_with_style(&prompt, &applied_style)
            .await
            .map_err(|e| ApiError::operation("Failed to apply style transfer", e))?;

        return Ok(Json(StyleTransferResponse {
            image_url: image_url(&generated),
            applied_style,
            original_prompt: prompt,
        }));
    };

    let applied_style = prompts::image_style_transfer(style, strength);
    match state.studio.style_transfer(&applied_style, Some(image.as_str())).await {
        Ok(generated) => Ok(Json(StyleTransferResponse {
            image_url: image_url(&generated),
            applied_style,
            original_prompt: "Image style transfer".to_string(),
        })),
        Err(e) if e.is_image_format_error() => {
            tracing::warn!(error = %e, "Image rejected, falling back to text-based style transfer");
            let fallback_prompt = prompts::text_style_fallback(style, strength);
            let generated = state
                .studio
                .generate_image(&fallback_prompt, Feature::TextToImage)
                .await
                .map_err(|e| ApiError::operation("Failed to apply style transfer", e))?;

            Ok(Json(StyleTransferResponse {
                image_url: image_url(&generated),
                applied_style: request.style_prompt.clone(),
                original_prompt: fallback_prompt,
            }))
        }
        Err(e) => Err(ApiError::operation("Failed to apply style transfer", e)),
    }
}

/// POST /api/photo-restore
pub async fn photo_restore(
    State(state): State<AppState>,
    payload: Result<Json<PhotoRestoreRequest>, JsonRejection>,
) -> Result<Json<PhotoRestoreResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let kind = request.restoration_type;
    let prompt = non_empty(request.prompt)
        .unwrap_or_else(|| kind.default_prompt().to_string());

    tracing::info!(
        kind = %kind,
        prompt = %prompt_preview(&prompt),
        image_len = request.image_data.len(),
        "Photo restoration requested"
    );

    match state
        .studio
        .restore_photo(&prompt, &request.image_data, kind)
        .await
    {
        Ok(image) => Ok(Json(PhotoRestoreResponse {
            image_url: image_url(&image),
            applied_restoration: kind,
            original_prompt: prompt,
        })),
        Err(e) if e.is_image_format_error() => Err(ApiError::unsupported_image(
            PHOTO_FORMAT_UNSUPPORTED,
            Some(e.to_string()),
        )),
        Err(e) => Err(ApiError::operation("Photo restoration failed", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{post_json, test_app, ALL_KEYS};
    use crate::schemas::gemini::{models, Part};
    use crate::services::studio::tests::{image_parts, quota_error};
    use crate::services::ProviderError;
    use axum::http::StatusCode;
    use serde_json::json;

    const PNG: &str = "data:image/png;base64,aW1n";
    const RESULT_URL: &str = "data:image/png;base64,aW1n";

    fn unsupported_mime() -> ProviderError {
        ProviderError::Api {
            code: 400,
            status: "INVALID_ARGUMENT".to_string(),
            message: "Unsupported MIME type: image/avif".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_image_default_feature() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) =
            post_json(app, "/api/generate-image", json!({"prompt": "a red fox"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "imageUrl": RESULT_URL,
                "prompt": "a red fox",
                "originalPrompt": "a red fox",
                "feature": "text-to-image"
            })
        );

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].credential, "GEMINI_API_KEY_1");
        assert_eq!(calls[0].model, models::IMAGE);
    }

    #[tokio::test]
    async fn test_generate_image_with_enhancement() {
        let (app, _, generator) = test_app(&ALL_KEYS);
        generator.push(Ok(vec![Part::text("a majestic red fox")]));

        let (status, body) = post_json(
            app,
            "/api/generate-image",
            json!({"prompt": "a fox", "enhancePrompt": true, "feature": "templates"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompt"], "a majestic red fox");
        assert_eq!(body["originalPrompt"], "a fox");
        assert_eq!(body["feature"], "templates");

        let calls = generator.calls();
        assert_eq!(calls[0].credential, "GEMINI_API_KEY_5");
        assert_eq!(calls[1].credential, "GEMINI_API_KEY_4");
        assert_eq!(calls[1].request.text(), "a majestic red fox");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_image_failure_is_500_with_details() {
        let (app, _, generator) = test_app(&["GEMINI_API_KEY_1"]);
        for _ in 0..3 {
            generator.push(Err(quota_error()));
        }

        let (status, body) = post_json(app, "/api/generate-image", json!({"prompt": "x"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate image");
        assert!(body["details"].as_str().unwrap().contains("generate image"));
    }

    #[tokio::test]
    async fn test_generate_image_requires_prompt() {
        let (app, _, _) = test_app(&ALL_KEYS);
        let (status, body) = post_json(app, "/api/generate-image", json!({"prompt": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is required and must be a string");
    }

    #[tokio::test]
    async fn test_edit_image_dual_mode() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app,
            "/api/edit-image",
            json!({
                "editInstructions": "add a hat",
                "originalImageData": PNG,
                "editedImageData": "data:image/jpeg;base64,ZWRpdA==",
                "maskData": "data:image/png;base64,bWFzaw=="
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["originalPrompt"], "Dual image editing");
        assert_eq!(body["editedPrompt"], "add a hat");
        assert_eq!(body["editInstructions"], "add a hat");

        let calls = generator.calls();
        assert_eq!(calls[0].credential, "GEMINI_API_KEY_2");
        let parts = &calls[0].request.contents[0].parts;
        assert_eq!(parts.len(), 4);
        assert!(calls[0].request.text().contains(DUAL_EDIT_CONCEPT));
    }

    #[tokio::test]
    async fn test_edit_image_canvas_only() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app,
            "/api/edit-image",
            json!({"editInstructions": "make it blue", "editedImageData": PNG}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["originalPrompt"], "Canvas image");

        let request = &generator.calls()[0].request;
        assert_eq!(request.contents[0].parts.len(), 2);
        assert!(request.text().contains(CANVAS_EDIT_CONCEPT));
    }

    #[tokio::test]
    async fn test_edit_image_text_mode() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app,
            "/api/edit-image",
            json!({"originalPrompt": "a dog", "editInstructions": "make it red"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["editedPrompt"], "a dog, modified: make it red");
        assert_eq!(body["originalPrompt"], "a dog");
        assert_eq!(generator.calls()[0].credential, "GEMINI_API_KEY");
    }

    #[tokio::test]
    async fn test_edit_image_validation() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app.clone(),
            "/api/edit-image",
            json!({"originalImageData": PNG, "editedImageData": PNG}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Edit instructions are required for image editing");

        let (status, body) =
            post_json(app.clone(), "/api/edit-image", json!({"editInstructions": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Original prompt is required and must be a string");

        let (status, body) =
            post_json(app, "/api/edit-image", json!({"originalPrompt": "a dog"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Edit instructions are required and must be a string");

        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edit_image_rejects_invalid_image_data() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app,
            "/api/edit-image",
            json!({"editInstructions": "x", "editedImageData": "not-a-data-url"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Unsupported image format"));
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_style_transfer_with_image() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app,
            "/api/style-transfer",
            json!({"stylePrompt": "watercolor", "strength": 50, "imageData": PNG}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appliedStyle"], prompts::image_style_transfer("watercolor", 50.0));
        assert_eq!(body["originalPrompt"], "Image style transfer");

        let calls = generator.calls();
        assert_eq!(calls[0].credential, "GEMINI_API_KEY_3");
        assert!(calls[0].request.text().contains("Apply moderate watercolor style"));
    }

    #[tokio::test]
    async fn test_style_transfer_format_fallback() {
        let (app, _, generator) = test_app(&ALL_KEYS);
        generator.push(Err(unsupported_mime()));

        let (status, body) = post_json(
            app,
            "/api/style-transfer",
            json!({"stylePrompt": "ukiyo-e", "imageData": PNG}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appliedStyle"], "ukiyo-e");
        assert_eq!(body["originalPrompt"], prompts::text_style_fallback("ukiyo-e", 80.0));

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].credential, "GEMINI_API_KEY_1");
        assert_eq!(calls[1].request.contents[0].parts.len(), 1);
    }

    #[tokio::test]
    async fn test_style_transfer_text_mode() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(
            app.clone(),
            "/api/style-transfer",
            json!({"stylePrompt": "noir", "strength": 20, "prompt": "a city"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appliedStyle"], "noir, subtle style influence");
        assert_eq!(body["originalPrompt"], "a city");
        assert_eq!(
            generator.calls()[0].request.text(),
            "a city, noir, subtle style influence"
        );

        let (status, body) =
            post_json(app, "/api/style-transfer", json!({"stylePrompt": "noir"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is required for text-based style generation");
    }

    #[tokio::test]
    async fn test_style_transfer_requires_style() {
        let (app, _, _) = test_app(&ALL_KEYS);
        let (status, body) = post_json(app, "/api/style-transfer", json!({"prompt": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Style prompt is required and must be a string");
    }

    #[tokio::test]
    async fn test_photo_restore_default_prompt() {
        let (app, _, generator) = test_app(&ALL_KEYS);
        generator.push(Ok(vec![Part::text("A faded portrait of a woman")]));
        generator.push(Ok(image_parts()));

        let (status, body) = post_json(
            app,
            "/api/photo-restore",
            json!({"imageData": "data:image/avif;base64,aW1n", "restorationType": "colorize"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appliedRestoration"], "colorize");
        assert_eq!(
            body["originalPrompt"],
            "Add realistic colors to this black and white photo"
        );

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, models::VISION);
        assert!(calls.iter().all(|c| c.credential == "GEMINI_API_KEY_7"));
        let image = calls[0].request.contents[0].parts[0].inline_data.as_ref().unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_photo_restore_errors() {
        let (app, _, generator) = test_app(&ALL_KEYS);

        let (status, body) = post_json(app.clone(), "/api/photo-restore", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Image data is required for photo restoration");

        generator.push(Err(unsupported_mime()));
        let (status, body) =
            post_json(app.clone(), "/api/photo-restore", json!({"imageData": PNG})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], PHOTO_FORMAT_UNSUPPORTED);
        assert!(body["details"].is_string());

        generator.push(Err(ProviderError::NoText));
        let (status, body) = post_json(app, "/api/photo-restore", json!({"imageData": PNG})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Photo restoration failed");
    }
}
