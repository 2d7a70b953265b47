// Auscult - Respiratory Sound Classification Service
// Fixed-length acoustic feature extraction feeding a dense classifier
//
// Module organization:
// - config: serde-backed configuration with CLI-friendly defaults
// - error: wire error codes and per-stage error enums
// - audio: WAV decoding, resampling, and the offset/duration window
// - analysis: feature extraction (ZCR, MFCC, chroma, RMS, mel) and augmentation
// - model: safetensors classifier and per-class probabilities
// - context: immutable dependency container shared across handlers
// - http: the prediction endpoint and server loop

pub mod analysis;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod model;

pub use analysis::{FeatureExtractor, FeatureVector, FEATURE_VECTOR_LEN};
pub use config::AppConfig;
pub use context::AppContext;
pub use model::{Classifier, Prediction, LABELS};
