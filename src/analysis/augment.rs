// Augmentation module - perturbed variants of an audio clip
//
// Training data is enriched by extracting features not just from the
// recorded clip but also from a noise-injected copy and a slowed,
// pitch-shifted copy. None of this runs on the serving path; the HTTP
// handler always extracts features from the clip as recorded.

use rand::Rng;
use rand_distr::StandardNormal;
use signalsmith_stretch::Stretch;

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::audio::AudioClip;
use crate::error::ExtractionError;

/// Scale applied to the random noise amplitude
pub const NOISE_SCALE: f32 = 0.035;

/// Playback rate of the stretched variant (below 1.0 slows the clip down)
pub const STRETCH_RATE: f32 = 0.8;

/// Transposition of the stretched variant, in semitones
pub const PITCH_SHIFT_SEMITONES: f32 = -0.7;

/// Feature vectors for a clip and its perturbed variants
#[derive(Debug, Clone)]
pub struct AugmentedFeatures {
    /// Features of the clip as recorded
    pub original: FeatureVector,
    /// Features after Gaussian noise injection
    pub with_noise: FeatureVector,
    /// Features after slowing to `STRETCH_RATE` and transposing down
    pub stretched_and_pitched: FeatureVector,
}

impl AugmentedFeatures {
    /// Vectors in fixed order: original, noise, stretch
    pub fn into_vec(self) -> Vec<FeatureVector> {
        vec![self.original, self.with_noise, self.stretched_and_pitched]
    }
}

/// Add Gaussian noise scaled to the signal peak
///
/// The noise amplitude is `NOISE_SCALE * u * peak` where `u` is drawn
/// uniformly from [0, 1), so repeated calls perturb the clip by varying
/// amounts. A silent clip stays silent.
pub fn add_noise<R: Rng>(samples: &[f32], rng: &mut R) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let peak = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let amplitude = NOISE_SCALE * rng.gen_range(0.0..1.0) * peak;

    samples
        .iter()
        .map(|&sample| {
            let noise: f32 = rng.sample(StandardNormal);
            sample + amplitude * noise
        })
        .collect()
}

/// Slow the clip to `STRETCH_RATE` and transpose it down
///
/// Runs the whole clip through the stretcher in one pass; the stretch
/// ratio is implied by the output buffer being `1 / STRETCH_RATE` times
/// the input length.
///
/// # Arguments
/// * `samples` - Mono audio
/// * `sample_rate` - Sample rate of `samples` in Hz
pub fn stretch_and_pitch(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let output_len = (samples.len() as f64 / STRETCH_RATE as f64).round() as usize;
    let mut output = vec![0.0_f32; output_len];

    let mut stretch = Stretch::preset_default(1, sample_rate);
    stretch.set_transpose_factor_semitones(PITCH_SHIFT_SEMITONES, None);
    stretch.process(samples, &mut output);

    output
}

/// Extract features for a clip and both perturbed variants
///
/// # Arguments
/// * `extractor` - Shared feature extractor
/// * `clip` - Decoded mono audio at the extractor's sample rate
/// * `rng` - Source of randomness for the noise variant
///
/// # Errors
/// `ExtractionError::EmptyWindow` if the clip contains no samples
pub fn extract_augmented<R: Rng>(
    extractor: &FeatureExtractor,
    clip: &AudioClip,
    rng: &mut R,
) -> Result<AugmentedFeatures, ExtractionError> {
    let original = extractor.extract(clip)?;

    let noisy = AudioClip::from_samples(add_noise(&clip.samples, rng), clip.sample_rate);
    let with_noise = extractor.extract(&noisy)?;

    let stretched = AudioClip::from_samples(
        stretch_and_pitch(&clip.samples, clip.sample_rate),
        clip.sample_rate,
    );
    let stretched_and_pitched = extractor.extract(&stretched)?;

    Ok(AugmentedFeatures {
        original,
        with_noise,
        stretched_and_pitched,
    })
}
