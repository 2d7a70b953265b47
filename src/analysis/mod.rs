// Analysis module - feature extraction and augmentation
//
// This module turns decoded audio windows into the fixed-length feature
// vectors the classifier consumes, and provides the augmentation variants
// used when preparing training data.
//
// Architecture:
// - features: STFT, mel, chroma, and temporal features -> FeatureVector
// - augment: noise and time-stretch variants of a clip, features per variant

pub mod augment;
pub mod features;

pub use features::{FeatureExtractor, FeatureVector, FEATURE_VECTOR_LEN};
