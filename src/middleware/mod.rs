//! Middleware module
//!
//! Contains HTTP middleware for request correlation and logging.

pub mod logging;

pub use logging::{log_request, RequestId, REQUEST_ID_HEADER};
