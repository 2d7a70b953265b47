// Model module - pre-trained respiratory sound classifier
//
// Loads the trained dense-network weights once at startup and exposes a
// single predict call over fixed-length feature vectors. Inference runs on
// CPU; the artifact is a safetensors file produced by offline training.

pub mod classifier;

pub use classifier::{save_random_artifact, Classifier, Prediction, LABELS};
