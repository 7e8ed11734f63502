//! Prompt templates sent to the provider

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix appended locally when prompt enhancement is unavailable
pub const FALLBACK_ENHANCEMENT: &str =
    "high quality, detailed, professional photography, 8K resolution, cinematic lighting, sharp focus";

pub fn fallback_enhancement(prompt: &str) -> String {
    format!("{}, {}", prompt, FALLBACK_ENHANCEMENT)
}

pub fn enhancement(prompt: &str) -> String {
    format!(
        r#"You are a professional AI image generation prompt engineer. Your task is to enhance the following user prompt to create better, more detailed, and higher quality images.

Rules:
1. Keep the core intent and subject of the original prompt
2. Add technical photography/art terms for better quality
3. Include lighting, composition, and style details
4. Make it more specific and descriptive
5. Add quality modifiers like "high resolution", "detailed", "professional"
6. Keep it under 200 words
7. Don't change the main subject or concept

Original prompt: "{prompt}"

Enhanced prompt:"#
    )
}

pub fn dual_image_edit(original_prompt: &str, instructions: &str) -> String {
    format!(
        "Based on these images, create a new image that follows these instructions:\n\n\
         Original concept: {original_prompt}\n\
         Edit instructions: {instructions}\n\n\
         Please generate a refined version that incorporates the edits shown in the canvas image \
         while maintaining the quality and style of the original image."
    )
}

pub fn single_image_edit(original_prompt: &str, instructions: &str) -> String {
    format!(
        "Edit this image based on the following instructions:\n\n\
         Original concept: {original_prompt}\n\
         Edit instructions: {instructions}\n\n\
         Please generate an edited version of this image."
    )
}

pub fn text_edit(original_prompt: &str, instructions: &str) -> String {
    format!("{original_prompt}, modified: {instructions}")
}

pub fn with_style(prompt: &str, style: &str) -> String {
    format!("{prompt}, {style}")
}

pub fn reference_style(prompt: &str) -> String {
    format!("Apply the artistic style from this reference image to create: {prompt}")
}

// ============================================================================
// Style strength
// ============================================================================

/// Qualitative label for a 0-100 style strength
pub fn style_strength_label(strength: f64) -> &'static str {
    if strength > 70.0 {
        "strong"
    } else if strength > 40.0 {
        "moderate"
    } else {
        "subtle"
    }
}

pub fn image_style_transfer(style: &str, strength: f64) -> String {
    format!(
        "Apply {} {} style to this image. Transform the image to match the artistic style while \
         preserving the main subject and composition.",
        style_strength_label(strength),
        style
    )
}

pub fn text_style_fallback(style: &str, strength: f64) -> String {
    format!(
        "Create an image with {} {} artistic style. Use vibrant colors and artistic techniques \
         typical of this style.",
        style_strength_label(strength),
        style
    )
}

pub fn text_style_influence(style: &str, strength: f64) -> String {
    format!("{}, {} style influence", style, style_strength_label(strength))
}

// ============================================================================
// Photo restoration
// ============================================================================

/// What a photo restoration should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestorationKind {
    #[default]
    Restore,
    Colorize,
    Enhance,
}

impl RestorationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Colorize => "colorize",
            Self::Enhance => "enhance",
        }
    }

    /// User prompt used when the request carries none
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Restore => "Restore this damaged photo to its original quality",
            Self::Colorize => "Add realistic colors to this black and white photo",
            Self::Enhance => "Enhance this photo's quality and clarity",
        }
    }

    /// First step: ask the vision model to describe the photo
    pub fn analysis_prompt(&self, requirements: &str) -> String {
        let base = match self {
            Self::Restore => {
                "Analyze this old or damaged photograph in detail. Describe:\n\
                 1. The main subject(s) and composition\n\
                 2. Any visible damage (scratches, stains, tears, fading)\n\
                 3. The time period/era it appears to be from\n\
                 4. Clothing, objects, and setting\n\
                 5. Lighting and mood\n\
                 6. What needs to be restored\n\n\
                 Based on your analysis, provide a detailed description for creating a perfectly \
                 restored version of this photograph."
            }
            Self::Colorize => {
                "Analyze this black and white photograph in detail. Describe:\n\
                 1. The main subject(s) and composition\n\
                 2. The time period/era it appears to be from\n\
                 3. Clothing, hairstyles, and objects visible\n\
                 4. The setting and environment\n\
                 5. Lighting and mood\n\
                 6. What realistic colors should be applied\n\n\
                 Based on your analysis, provide a detailed description for creating a beautifully \
                 colorized version with historically accurate colors."
            }
            Self::Enhance => {
                "Analyze this photograph in detail. Describe:\n\
                 1. The main subject(s) and composition\n\
                 2. Current quality issues (blur, noise, poor lighting)\n\
                 3. The setting and context\n\
                 4. What enhancements would improve it\n\n\
                 Based on your analysis, provide a detailed description for creating an enhanced, \
                 professional-quality version."
            }
        };

        let requirements = requirements.trim();
        if requirements.is_empty() {
            base.to_string()
        } else {
            format!("{base}\n\nUser requirements: {requirements}")
        }
    }

    /// Second step: generate the image from the analysis
    pub fn generation_prompt(&self, analysis: &str) -> String {
        match self {
            Self::Restore => format!(
                "Based on this detailed analysis of a damaged photograph, create a fully restored, \
                 high-quality version:\n\n{analysis}\n\n\
                 Generate a photograph that:\n\
                 - Completely removes all damage, scratches, tears, and stains\n\
                 - Has perfect clarity and sharpness\n\
                 - Uses natural, historically accurate colors and lighting\n\
                 - Preserves the exact composition and subjects described\n\
                 - Looks like a professional photograph from that era in perfect condition\n\
                 - Maintains authentic period details and styling"
            ),
            Self::Colorize => format!(
                "Based on this detailed analysis of a black and white photograph, create a \
                 beautifully colorized version:\n\n{analysis}\n\n\
                 Generate a colorized photograph that:\n\
                 - Adds realistic, historically accurate colors\n\
                 - Uses natural skin tones appropriate for the time period\n\
                 - Applies period-correct clothing and object colors\n\
                 - Maintains the original composition and mood exactly\n\
                 - Looks natural and authentic, not over-saturated\n\
                 - Preserves all the details and atmosphere described"
            ),
            Self::Enhance => format!(
                "Based on this detailed analysis, create an enhanced, professional-quality version \
                 of this photograph:\n\n{analysis}\n\n\
                 Generate an enhanced photograph that:\n\
                 - Has significantly improved clarity and sharpness\n\
                 - Optimized lighting and contrast\n\
                 - Reduced noise and improved quality\n\
                 - Maintains the original composition and subjects exactly\n\
                 - Looks professional and polished\n\
                 - Preserves the natural character and mood"
            ),
        }
    }
}

impl fmt::Display for RestorationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
