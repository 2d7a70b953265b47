// Classifier error types

use crate::error::{ApiErrorCodes, ErrorCode};
use std::fmt;
use std::path::PathBuf;
use tracing::error;

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or invoking the classifier
///
/// Load-time variants (`ArtifactRead`, `MissingTensor`, `ShapeMismatch`) are
/// fatal at startup; `Inference` occurs per request and is terminal for that
/// request only.
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Reading or parsing the artifact file failed
    ArtifactRead { path: PathBuf, reason: String },

    /// The artifact is missing a tensor the classifier requires
    MissingTensor { name: String },

    /// A tensor dimension does not match the serving contract
    ShapeMismatch {
        tensor: String,
        expected: String,
        actual: String,
    },

    /// The forward pass failed
    Inference { reason: String },
}

impl ErrorCode for ModelError {
    /// Every model failure maps to the pipeline wire code; the detail
    /// stays in `message()`.
    fn code(&self) -> i32 {
        ApiErrorCodes::PIPELINE_FAILED
    }

    fn message(&self) -> String {
        match self {
            ModelError::ArtifactRead { path, reason } => {
                format!("Failed to read model artifact {:?}: {}", path, reason)
            }
            ModelError::MissingTensor { name } => {
                format!("Model artifact is missing tensor '{}'", name)
            }
            ModelError::ShapeMismatch {
                tensor,
                expected,
                actual,
            } => {
                format!(
                    "Tensor '{}' has shape {} but the serving contract expects {}",
                    tensor, actual, expected
                )
            }
            ModelError::Inference { reason } => {
                format!("Inference failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for ModelError {}

impl From<candle_core::Error> for ModelError {
    fn from(err: candle_core::Error) -> Self {
        ModelError::Inference {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_share_wire_code() {
        let err = ModelError::MissingTensor {
            name: "dense1.weight".to_string(),
        };
        assert_eq!(err.code(), ApiErrorCodes::PIPELINE_FAILED);

        let err = ModelError::Inference {
            reason: "shape mismatch in matmul".to_string(),
        };
        assert_eq!(err.code(), ApiErrorCodes::PIPELINE_FAILED);
    }

    #[test]
    fn test_model_error_messages() {
        let err = ModelError::ShapeMismatch {
            tensor: "dense1.weight".to_string(),
            expected: "[_, 162]".to_string(),
            actual: "[64, 150]".to_string(),
        };
        let msg = err.message();
        assert!(msg.contains("dense1.weight"));
        assert!(msg.contains("[_, 162]"));
        assert!(msg.contains("[64, 150]"));
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::ArtifactRead {
            path: PathBuf::from("model/classifier.safetensors"),
            reason: "no such file".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("ModelError"));
        assert!(display.contains("classifier.safetensors"));
    }
}
