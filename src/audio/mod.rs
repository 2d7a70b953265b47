// Audio module - WAV decoding, channel mixdown, load windowing, resampling
//
// Turns a recording on disk into the mono waveform the feature pipeline
// consumes: decode with hound, average channels to mono, keep only the
// configured [offset, offset+duration) window, resample to the analysis rate.

pub mod resampler;

use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::config::PipelineConfig;
use crate::error::ExtractionError;

/// A mono waveform at a known sample rate
///
/// Samples are f32 in [-1, 1]. Clips exist only between decoding and feature
/// extraction; nothing retains them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode the configured window of a WAV file into a mono clip at the
    /// analysis rate
    ///
    /// The offset and duration are applied in the file's native rate before
    /// resampling. A file shorter than the offset yields an empty clip; the
    /// pipeline rejects it downstream rather than special-casing it here.
    ///
    /// # Errors
    /// * `Open` - the file cannot be opened or is not a WAV container
    /// * `UnsupportedFormat` - the encoding is not PCM 16/24/32 or float 32
    /// * `Decode` - samples could not be read
    /// * `Resample` - conversion to the analysis rate failed
    pub fn load(path: &Path, config: &PipelineConfig) -> Result<Self, ExtractionError> {
        let mut reader = WavReader::open(path).map_err(|err| ExtractionError::Open {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(ExtractionError::UnsupportedFormat {
                details: "zero channels".to_string(),
            });
        }
        let native_rate = spec.sample_rate;

        let offset_frames = (config.offset_secs * native_rate as f64).round() as usize;
        let window_frames = (config.duration_secs * native_rate as f64).round() as usize;
        let skip = offset_frames * channels;
        let take = window_frames * channels;

        let interleaved = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => collect_window(reader.samples::<f32>(), skip, take)?,
            (SampleFormat::Int, 16) => collect_window(
                reader.samples::<i16>().map(|s| s.map(|v| v as f32 / 32_768.0)),
                skip,
                take,
            )?,
            (SampleFormat::Int, 24) => collect_window(
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / 8_388_608.0)),
                skip,
                take,
            )?,
            (SampleFormat::Int, 32) => collect_window(
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / 2_147_483_648.0)),
                skip,
                take,
            )?,
            (format, bits) => {
                return Err(ExtractionError::UnsupportedFormat {
                    details: format!("{:?} at {} bits per sample", format, bits),
                })
            }
        };

        let mono = mix_to_mono(&interleaved, channels);
        let samples = resampler::resample(&mono, native_rate, config.sample_rate)?;

        Ok(Self {
            samples,
            sample_rate: config.sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn collect_window<I>(iter: I, skip: usize, take: usize) -> Result<Vec<f32>, hound::Error>
where
    I: Iterator<Item = Result<f32, hound::Error>>,
{
    iter.skip(skip).take(take).collect()
}

/// Average interleaved channels into one mono stream
///
/// A trailing incomplete frame (malformed file) is dropped.
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
