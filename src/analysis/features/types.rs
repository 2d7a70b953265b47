// Types module - Data structures for audio features
//
// This module defines the fixed-length feature vector that forms the input
// contract of the trained classifier.

/// Length of every feature vector handed to the classifier
///
/// The trained model reads exactly this many inputs. The pipeline enforces
/// the length by construction: natural concatenations shorter than this are
/// right-padded with zeros, longer ones are right-truncated.
pub const FEATURE_VECTOR_LEN: usize = 162;

/// Fixed-length acoustic feature vector
///
/// Concatenation, in fixed order, of the time-averaged feature blocks:
/// zero-crossing rate (1), MFCC coefficients, chroma bins, RMS energy (1),
/// mel band energies. Always exactly `FEATURE_VECTOR_LEN` values.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    /// Force a natural concatenation to the contract length
    ///
    /// Shorter inputs gain a zero tail, longer inputs lose their tail. The
    /// default pipeline layout concatenates to exactly the contract length
    /// and passes through unchanged.
    pub fn from_concatenation(mut values: Vec<f32>) -> Self {
        values.resize(FEATURE_VECTOR_LEN, 0.0);
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}
