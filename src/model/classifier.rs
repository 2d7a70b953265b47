// Classifier - dense network over the acoustic feature vector
//
// The classifier is a two-layer dense network applied to the fixed-length
// feature vector:
//
//   dense1: [hidden, 162] weights, [hidden] bias, ReLU
//   dense2: [5, hidden] weights, [5] bias, softmax
//
// Weights are trained offline and loaded from a safetensors artifact. The
// hidden width is discovered from the artifact; the input width and class
// count are part of the serving contract and validated at load time, so a
// constructed Classifier can always run a forward pass.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::ops::softmax_last_dim;
use candle_nn::{Linear, Module};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::features::{FeatureVector, FEATURE_VECTOR_LEN};
use crate::error::ModelError;

/// Class labels, in the classifier's output order
pub const LABELS: [&str; 5] = ["Bronchial", "asthma", "copd", "healthy", "pneumonia"];

const NUM_CLASSES: usize = LABELS.len();

/// Per-class probabilities from a single forward pass
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    probabilities: [f32; NUM_CLASSES],
}

impl Prediction {
    /// Probabilities in `LABELS` order
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Probabilities keyed by lowercased label
    pub fn to_map(&self) -> std::collections::BTreeMap<String, f32> {
        LABELS
            .iter()
            .zip(self.probabilities.iter())
            .map(|(label, &p)| (label.to_lowercase(), p))
            .collect()
    }

    /// Label with the highest probability
    pub fn top_label(&self) -> &'static str {
        let mut best = 0;
        for (i, &p) in self.probabilities.iter().enumerate() {
            if p > self.probabilities[best] {
                best = i;
            }
        }
        LABELS[best]
    }
}

/// Classifier holds the loaded network and runs forward passes
///
/// Construction validates every tensor against the serving contract, so a
/// `Classifier` value is always ready to predict. The struct is immutable
/// after load and safe to share behind an `Arc`.
pub struct Classifier {
    dense1: Linear,
    dense2: Linear,
    hidden: usize,
    device: Device,
}

impl Classifier {
    /// Load the classifier from a safetensors artifact
    ///
    /// # Arguments
    /// * `path` - Artifact file with dense1/dense2 weights and biases
    ///
    /// # Errors
    /// `ArtifactRead` if the file cannot be read or parsed, `MissingTensor`
    /// or `ShapeMismatch` if its contents do not match the contract
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let tensors = candle_core::safetensors::load(path, &Device::Cpu).map_err(|err| {
            ModelError::ArtifactRead {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        Self::from_tensors(tensors)
    }

    /// Build the classifier from already-loaded tensors
    ///
    /// # Errors
    /// `MissingTensor` for absent entries, `ShapeMismatch` when a dimension
    /// disagrees with the input width or class count
    pub fn from_tensors(tensors: HashMap<String, Tensor>) -> Result<Self, ModelError> {
        let take = |name: &str| -> Result<Tensor, ModelError> {
            tensors
                .get(name)
                .cloned()
                .ok_or_else(|| ModelError::MissingTensor {
                    name: name.to_string(),
                })
        };

        let w1 = take("dense1.weight")?.to_dtype(DType::F32)?;
        let b1 = take("dense1.bias")?.to_dtype(DType::F32)?;
        let w2 = take("dense2.weight")?.to_dtype(DType::F32)?;
        let b2 = take("dense2.bias")?.to_dtype(DType::F32)?;

        let expected_w1 = format!("[_, {}]", FEATURE_VECTOR_LEN);
        let (hidden, in_features) = w1
            .dims2()
            .map_err(|_| shape_mismatch("dense1.weight", &expected_w1, w1.dims()))?;
        if in_features != FEATURE_VECTOR_LEN {
            return Err(shape_mismatch("dense1.weight", &expected_w1, w1.dims()));
        }

        let expected_b1 = format!("[{}]", hidden);
        let b1_len = b1
            .dims1()
            .map_err(|_| shape_mismatch("dense1.bias", &expected_b1, b1.dims()))?;
        if b1_len != hidden {
            return Err(shape_mismatch("dense1.bias", &expected_b1, b1.dims()));
        }

        let expected_w2 = format!("[{}, {}]", NUM_CLASSES, hidden);
        let w2_dims = w2
            .dims2()
            .map_err(|_| shape_mismatch("dense2.weight", &expected_w2, w2.dims()))?;
        if w2_dims != (NUM_CLASSES, hidden) {
            return Err(shape_mismatch("dense2.weight", &expected_w2, w2.dims()));
        }

        let expected_b2 = format!("[{}]", NUM_CLASSES);
        let b2_len = b2
            .dims1()
            .map_err(|_| shape_mismatch("dense2.bias", &expected_b2, b2.dims()))?;
        if b2_len != NUM_CLASSES {
            return Err(shape_mismatch("dense2.bias", &expected_b2, b2.dims()));
        }

        Ok(Self {
            dense1: Linear::new(w1, Some(b1)),
            dense2: Linear::new(w2, Some(b2)),
            hidden,
            device: Device::Cpu,
        })
    }

    /// Width of the hidden layer discovered from the artifact
    pub fn hidden_width(&self) -> usize {
        self.hidden
    }

    /// Run a forward pass over one feature vector
    ///
    /// The input is shaped `(1, 162, 1)` on the way in, matching the layout
    /// the network was trained with, and flattened before the dense stack.
    ///
    /// # Returns
    /// Softmax probabilities over the five classes
    ///
    /// # Errors
    /// `Inference` if any tensor operation fails
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let input = Tensor::from_slice(
            features.as_slice(),
            (1, FEATURE_VECTOR_LEN, 1),
            &self.device,
        )?;
        let flat = input.flatten_from(1)?;

        let activations = self.dense1.forward(&flat)?.relu()?;
        let logits = self.dense2.forward(&activations)?;
        let probs = softmax_last_dim(&logits)?;
        let values = probs.squeeze(0)?.to_vec1::<f32>()?;

        if values.len() != NUM_CLASSES {
            return Err(ModelError::Inference {
                reason: format!(
                    "expected {} class probabilities, got {}",
                    NUM_CLASSES,
                    values.len()
                ),
            });
        }

        let mut probabilities = [0.0_f32; NUM_CLASSES];
        probabilities.copy_from_slice(&values);
        Ok(Prediction { probabilities })
    }
}

fn shape_mismatch(tensor: &str, expected: &str, dims: &[usize]) -> ModelError {
    ModelError::ShapeMismatch {
        tensor: tensor.to_string(),
        expected: expected.to_string(),
        actual: format!("{:?}", dims),
    }
}

/// Write a freshly initialized artifact with uniform random weights
///
/// Produces a valid but untrained network, used to stand in for the real
/// artifact during development and in tests.
///
/// # Arguments
/// * `path` - Destination safetensors file
/// * `hidden` - Hidden layer width
/// * `seed` - RNG seed, so repeated runs write identical weights
pub fn save_random_artifact(path: &Path, hidden: usize, seed: u64) -> Result<(), ModelError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let device = Device::Cpu;
    let mut uniform = |count: usize| -> Vec<f32> {
        (0..count).map(|_| rng.gen_range(-0.5..0.5)).collect()
    };

    let w1 = Tensor::from_vec(
        uniform(hidden * FEATURE_VECTOR_LEN),
        (hidden, FEATURE_VECTOR_LEN),
        &device,
    )?;
    let b1 = Tensor::from_vec(uniform(hidden), hidden, &device)?;
    let w2 = Tensor::from_vec(uniform(NUM_CLASSES * hidden), (NUM_CLASSES, hidden), &device)?;
    let b2 = Tensor::from_vec(uniform(NUM_CLASSES), NUM_CLASSES, &device)?;

    let mut tensors = HashMap::new();
    tensors.insert("dense1.weight".to_string(), w1);
    tensors.insert("dense1.bias".to_string(), b1);
    tensors.insert("dense2.weight".to_string(), w2);
    tensors.insert("dense2.bias".to_string(), b2);

    candle_core::safetensors::save(&tensors, path).map_err(|err| ModelError::ArtifactRead {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
