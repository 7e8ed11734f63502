//! Services module
//!
//! Contains the Gemini integration and the image studio operations built
//! on top of the credential dispatcher.

pub mod gemini;
pub mod prompts;
pub mod studio;

pub use gemini::{
    ContentGenerator, GeminiClient, GeneratedImage, ProviderError, ProviderSession,
    GEMINI_API_BASE,
};
pub use prompts::RestorationKind;
pub use studio::{EditImageInput, ImageStudio, StudioError};
