//! Feature tags and their preferred credentials
//!
//! Every call into the dispatcher is tagged with the feature that originated
//! it. Each feature has a "home" credential that absorbs its traffic while
//! healthy; when it is not, the dispatcher falls back across the whole pool.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Feature
// ============================================================================

/// Logical capability requesting a remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum Feature {
    TextToImage,
    CanvasEditor,
    StyleTransfer,
    Templates,
    EnhancePrompt,
    GuidedPrompt,
    PhotoRestore,
    #[default]
    Default,
}

/// Static feature -> preferred credential table
///
/// Total over [`Feature`]. `GEMINI_API_KEY_8` and `GEMINI_API_KEY_9` are not
/// listed and only ever serve as fallback capacity.
pub const PREFERRED_CREDENTIALS: [(Feature, &str); 8] = [
    (Feature::TextToImage, "GEMINI_API_KEY_1"),
    (Feature::CanvasEditor, "GEMINI_API_KEY_2"),
    (Feature::StyleTransfer, "GEMINI_API_KEY_3"),
    (Feature::Templates, "GEMINI_API_KEY_4"),
    (Feature::EnhancePrompt, "GEMINI_API_KEY_5"),
    (Feature::GuidedPrompt, "GEMINI_API_KEY_6"),
    (Feature::PhotoRestore, "GEMINI_API_KEY_7"),
    (Feature::Default, "GEMINI_API_KEY"),
];

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::TextToImage,
        Feature::CanvasEditor,
        Feature::StyleTransfer,
        Feature::Templates,
        Feature::EnhancePrompt,
        Feature::GuidedPrompt,
        Feature::PhotoRestore,
        Feature::Default,
    ];

    /// Parse a feature tag; unrecognized tags map to [`Feature::Default`]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "text-to-image" => Self::TextToImage,
            "canvas-editor" => Self::CanvasEditor,
            "style-transfer" => Self::StyleTransfer,
            "templates" => Self::Templates,
            "enhance-prompt" => Self::EnhancePrompt,
            "guided-prompt" => Self::GuidedPrompt,
            "photo-restore" => Self::PhotoRestore,
            _ => Self::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextToImage => "text-to-image",
            Self::CanvasEditor => "canvas-editor",
            Self::StyleTransfer => "style-transfer",
            Self::Templates => "templates",
            Self::EnhancePrompt => "enhance-prompt",
            Self::GuidedPrompt => "guided-prompt",
            Self::PhotoRestore => "photo-restore",
            Self::Default => "default",
        }
    }

    /// Name of the credential this feature prefers
    pub fn preferred_credential(&self) -> &'static str {
        PREFERRED_CREDENTIALS
            .iter()
            .find(|(feature, _)| feature == self)
            .or_else(|| {
                PREFERRED_CREDENTIALS
                    .iter()
                    .find(|(feature, _)| *feature == Feature::Default)
            })
            .map(|(_, name)| *name)
            .unwrap_or("GEMINI_API_KEY")
    }

    /// Inverse lookup: the feature that prefers `credential`, if any
    pub fn preferring(credential: &str) -> Option<Feature> {
        PREFERRED_CREDENTIALS
            .iter()
            .find(|(_, name)| *name == credential)
            .map(|(feature, _)| *feature)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Feature {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_parse_round_trips_display() {
        for feature in Feature::ALL {
            assert_eq!(Feature::parse(feature.as_str()), feature);
        }
    }

    #[test]
    fn test_unknown_feature_maps_to_default() {
        assert_eq!(Feature::parse("nonexistent"), Feature::Default);
        assert_eq!(Feature::parse(""), Feature::Default);
        assert_eq!(
            Feature::Default.preferred_credential(),
            Feature::parse("whatever").preferred_credential()
        );
    }

    #[test]
    fn test_preferred_map_is_total_and_one_to_one() {
        let mut names: Vec<&str> = Feature::ALL
            .iter()
            .map(|f| f.preferred_credential())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Feature::ALL.len());
    }

    #[test]
    fn test_inverse_lookup() {
        assert_eq!(
            Feature::preferring("GEMINI_API_KEY_7"),
            Some(Feature::PhotoRestore)
        );
        assert_eq!(Feature::preferring("GEMINI_API_KEY_9"), None);
    }

    #[test]
    fn test_feature_serde() {
        let feature: Feature = serde_json::from_str("\"canvas-editor\"").unwrap();
        assert_eq!(feature, Feature::CanvasEditor);

        let unknown: Feature = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(unknown, Feature::Default);

        assert_eq!(
            serde_json::to_string(&Feature::TextToImage).unwrap(),
            "\"text-to-image\""
        );
    }
}
