// FeatureExtractor - acoustic feature extraction for respiratory sound classification
//
// This module derives the fixed-length feature vector the classifier consumes
// from a decoded audio window. Features are computed from time-domain and
// frequency-domain representations of the signal, each summarized by its mean
// over analysis frames.
//
// Module organization:
// - types: Data structures (FeatureVector)
// - stft: Short-time Fourier transform with Hann windowing
// - mel: Mel filterbank, decibel conversion, and the DCT basis for MFCCs
// - chroma: Pitch-class energy folding
// - temporal: Time-domain features (zero-crossing rate, RMS energy)
// - mod.rs: Coordinator (FeatureExtractor)
//
// Vector layout, in order:
// 1. Zero-Crossing Rate (1 value): rate of sign changes (noise/tonality)
// 2. MFCC (n_mfcc values): mel-frequency cepstral coefficients (timbre)
// 3. Chroma (n_chroma values): energy folded onto pitch classes
// 4. RMS (1 value): root-mean-square energy
// 5. Mel spectrogram (n_mels values): per-band mel power
//
// The concatenation is padded with trailing zeros or truncated to exactly
// FEATURE_VECTOR_LEN entries so the classifier input shape never varies.

mod chroma;
mod mel;
mod stft;
mod temporal;
mod types;

pub use types::{FeatureVector, FEATURE_VECTOR_LEN};

use std::path::Path;

use crate::audio::AudioClip;
use crate::config::PipelineConfig;
use crate::error::ExtractionError;
use chroma::ChromaFilterbank;
use mel::{dct_basis, power_to_db, MelFilterbank};
use stft::StftProcessor;
use temporal::TemporalFeatures;

/// FeatureExtractor coordinates the feature extraction pipeline
///
/// Combines STFT processing, mel and chroma filterbanks, and temporal
/// feature extraction into a single unified interface. All filterbanks and
/// the DCT basis are precomputed at construction, so a single extractor can
/// be shared across requests.
pub struct FeatureExtractor {
    config: PipelineConfig,
    stft: StftProcessor,
    mel_bank: MelFilterbank,
    chroma_bank: ChromaFilterbank,
    temporal: TemporalFeatures,
    dct: Vec<Vec<f32>>,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor for the given pipeline parameters
    ///
    /// # Arguments
    /// * `config` - Analysis parameters (sample rate, FFT size, band counts)
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            config: config.clone(),
            stft: StftProcessor::new(config.n_fft, config.hop_length),
            mel_bank: MelFilterbank::new(config.sample_rate, config.n_fft, config.n_mels),
            chroma_bank: ChromaFilterbank::new(config.sample_rate, config.n_fft, config.n_chroma),
            temporal: TemporalFeatures::new(config.n_fft, config.hop_length),
            dct: dct_basis(config.n_mfcc, config.n_mels),
        }
    }

    /// Length of the concatenation before padding or truncation
    pub fn natural_len(&self) -> usize {
        2 + self.config.n_mfcc + self.config.n_chroma + self.config.n_mels
    }

    /// Extract the feature vector from a decoded audio clip
    ///
    /// This method coordinates the entire feature extraction pipeline:
    /// 1. Compute the power spectrogram via STFT
    /// 2. Fold each frame through the mel and chroma filterbanks
    /// 3. Compute MFCCs from the log-mel energies
    /// 4. Compute time-domain features from the raw samples
    /// 5. Average each feature over frames and concatenate in fixed order
    ///
    /// The clip must already be at the extractor's analysis sample rate;
    /// `AudioClip::load` guarantees this.
    ///
    /// # Arguments
    /// * `clip` - Decoded mono audio at the configured sample rate
    ///
    /// # Returns
    /// Feature vector of exactly `FEATURE_VECTOR_LEN` entries
    ///
    /// # Errors
    /// `ExtractionError::EmptyWindow` if the clip contains no samples
    pub fn extract(&self, clip: &AudioClip) -> Result<FeatureVector, ExtractionError> {
        if clip.is_empty() {
            return Err(ExtractionError::EmptyWindow);
        }

        let samples = clip.samples.as_slice();
        let spectrogram = self.stft.power_spectrogram(samples);
        let n_frames = spectrogram.len() as f32;

        let mel_frames: Vec<Vec<f32>> = spectrogram
            .iter()
            .map(|frame| self.mel_bank.apply(frame))
            .collect();

        // MFCCs: DCT of the log-mel energies, averaged over frames
        let mut mfcc_means = vec![0.0_f32; self.config.n_mfcc];
        for mel_frame in &mel_frames {
            let log_mel: Vec<f32> = mel_frame.iter().map(|&e| power_to_db(e)).collect();
            for (mean, row) in mfcc_means.iter_mut().zip(&self.dct) {
                let coeff: f32 = row.iter().zip(&log_mel).map(|(w, v)| w * v).sum();
                *mean += coeff;
            }
        }
        for mean in &mut mfcc_means {
            *mean /= n_frames;
        }

        // Chroma: peak-normalized per frame, then averaged
        let mut chroma_means = vec![0.0_f32; self.config.n_chroma];
        for frame in &spectrogram {
            let chroma = self.chroma_bank.apply_normalized(frame);
            for (mean, value) in chroma_means.iter_mut().zip(&chroma) {
                *mean += value;
            }
        }
        for mean in &mut chroma_means {
            *mean /= n_frames;
        }

        // Mel spectrogram: raw per-band power, averaged over frames
        let mut mel_means = vec![0.0_f32; self.config.n_mels];
        for mel_frame in &mel_frames {
            for (mean, value) in mel_means.iter_mut().zip(mel_frame) {
                *mean += value;
            }
        }
        for mean in &mut mel_means {
            *mean /= n_frames;
        }

        let zcr = self.temporal.mean_zcr(samples);
        let rms = self.temporal.mean_rms(samples);

        let mut values = Vec::with_capacity(self.natural_len());
        values.push(zcr);
        values.extend_from_slice(&mfcc_means);
        values.extend_from_slice(&chroma_means);
        values.push(rms);
        values.extend_from_slice(&mel_means);

        Ok(FeatureVector::from_concatenation(values))
    }

    /// Load an audio file and extract its feature vector
    ///
    /// # Arguments
    /// * `path` - Path to a WAV file
    ///
    /// # Errors
    /// Any failure to open, decode, resample, or window the file
    pub fn extract_file(&self, path: &Path) -> Result<FeatureVector, ExtractionError> {
        let clip = AudioClip::load(path, &self.config)?;
        self.extract(&clip)
    }
}
