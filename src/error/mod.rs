// Error types for the auscult service
//
// This module defines custom error types for audio decoding, feature
// extraction, and classifier operations, providing structured error handling
// with the numeric codes clients key on in API responses.

mod extraction;
mod model;

pub use extraction::{log_extraction_error, ExtractionError};
pub use model::{log_model_error, ModelError};

/// Wire-level error code constants
///
/// These constants are the single source of truth for the `err.data.code`
/// field of error responses. Clients key on the `(status, code)` pair, so
/// the set is deliberately small and stable.
pub struct ApiErrorCodes {}

impl ApiErrorCodes {
    /// Request carried neither an upload nor a usable audio path
    pub const NO_AUDIO: i32 = -1;

    /// Feature extraction or model inference failed for the supplied audio
    pub const PIPELINE_FAILED: i32 = -2;
}

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get the wire error code and a
/// human-readable message from custom error types, enabling consistent
/// error handling between the HTTP layer and the logs.
pub trait ErrorCode {
    /// Get the numeric error code reported to clients
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
