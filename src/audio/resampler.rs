// Windowed-sinc resampling to the fixed analysis rate
//
// The feature definitions (mel filterbank edges, chroma bin mapping, frame
// timing) all assume one sample rate, so every decoded clip is converted to
// it before extraction. Offline one-shot conversion: chunked sinc resampling
// with the filter delay trimmed and the output normalized to the rate-scaled
// length.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::ExtractionError;

/// Frames fed to the sinc resampler per process call
const CHUNK_SIZE: usize = 512;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 64,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 128,
        window: WindowFunction::Blackman2,
    }
}

/// Resample a mono buffer from `from_rate` to `to_rate`
///
/// Input at the target rate is passed through untouched. Otherwise the buffer
/// is processed in fixed chunks, the final partial chunk included, and the
/// resampler is drained until the filter delay plus the expected output
/// length `round(n * to_rate / from_rate)` is available; the delay is then
/// trimmed so the result aligns with the input.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, ExtractionError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, sinc_params(), CHUNK_SIZE, 1)?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay);

    let mut pos = 0;
    while pos + CHUNK_SIZE <= samples.len() {
        let produced = resampler.process(&[&samples[pos..pos + CHUNK_SIZE]], None)?;
        output.extend_from_slice(&produced[0]);
        pos += CHUNK_SIZE;
    }
    if pos < samples.len() {
        let produced = resampler.process_partial(Some(&[&samples[pos..]]), None)?;
        output.extend_from_slice(&produced[0]);
    }

    // Drain until the delayed tail of the signal has come through
    while output.len() < delay + expected {
        let produced = resampler.process_partial::<&[f32]>(None, None)?;
        if produced[0].is_empty() {
            break;
        }
        output.extend_from_slice(&produced[0]);
    }

    let start = delay.min(output.len());
    let end = (delay + expected).min(output.len());
    Ok(output[start..end].to_vec())
}
