//! Error types for the HTTP layer

mod types;

pub use types::{ApiError, ErrorResponse};
