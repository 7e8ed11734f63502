//! Prompt enhancement endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use crate::error::ApiError;
use crate::schemas::studio::{EnhancePromptRequest, EnhancePromptResponse};
use crate::server::state::AppState;

/// POST /api/enhance-prompt
///
/// Always succeeds for a valid prompt: provider failures yield a locally
/// enhanced prompt.
pub async fn enhance_prompt(
    State(state): State<AppState>,
    payload: Result<Json<EnhancePromptRequest>, JsonRejection>,
) -> Result<Json<EnhancePromptResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let enhanced_prompt = state.studio.enhance_prompt(&request.prompt).await;

    Ok(Json(EnhancePromptResponse {
        original_prompt: request.prompt,
        enhanced_prompt,
    }))
}
