//! Schema module
//!
//! Wire formats: the Gemini REST API and the studio's own HTTP API.

pub mod gemini;
pub mod studio;
