// Feature extraction error types

use crate::error::{ApiErrorCodes, ErrorCode};
use std::fmt;
use std::path::PathBuf;
use tracing::error;

/// Log an extraction error with structured context
///
/// Logged fields include the wire error code, the pipeline stage given by
/// the caller, and the detailed failure message. The API reports only the
/// stable coarse code; the detail lives here.
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    error!(
        "Extraction error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while turning an audio file into a feature vector
///
/// These cover every failure mode between "a path arrived" and "a 162-long
/// vector exists": unreadable files, unsupported encodings, decode failures
/// midway through a file, resampler faults, and windows that contain no
/// audio. All of them are terminal for the request that triggered them.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Opening or parsing the WAV container failed
    Open { path: PathBuf, reason: String },

    /// The encoding is not one the decoder supports
    UnsupportedFormat { details: String },

    /// Reading samples out of an opened file failed
    Decode { reason: String },

    /// Conversion to the analysis sample rate failed
    Resample { reason: String },

    /// The requested load window contains no samples
    EmptyWindow,
}

impl ErrorCode for ExtractionError {
    /// Every extraction failure maps to the same wire code; the variant
    /// detail is carried in the message and the logs.
    fn code(&self) -> i32 {
        ApiErrorCodes::PIPELINE_FAILED
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::Open { path, reason } => {
                format!("Failed to open audio file {:?}: {}", path, reason)
            }
            ExtractionError::UnsupportedFormat { details } => {
                format!("Unsupported audio encoding: {}", details)
            }
            ExtractionError::Decode { reason } => {
                format!("Failed to decode audio samples: {}", reason)
            }
            ExtractionError::Resample { reason } => {
                format!("Failed to resample audio: {}", reason)
            }
            ExtractionError::EmptyWindow => {
                "Load window contains no samples (file shorter than offset?)".to_string()
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtractionError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for ExtractionError {}

impl From<hound::Error> for ExtractionError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => ExtractionError::UnsupportedFormat {
                details: "WAV feature not supported by decoder".to_string(),
            },
            other => ExtractionError::Decode {
                reason: other.to_string(),
            },
        }
    }
}

impl From<rubato::ResamplerConstructionError> for ExtractionError {
    fn from(err: rubato::ResamplerConstructionError) -> Self {
        ExtractionError::Resample {
            reason: err.to_string(),
        }
    }
}

impl From<rubato::ResampleError> for ExtractionError {
    fn from(err: rubato::ResampleError) -> Self {
        ExtractionError::Resample {
            reason: err.to_string(),
        }
    }
}
