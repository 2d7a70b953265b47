// STFT module - framing and short-time power spectrum computation
//
// This module handles the windowed FFT underneath every spectral feature.
// Frames advance by the hop length and the final frames are zero-padded past
// the end of the waveform, so the frame count depends only on the input
// length, never on its content.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

/// Short-time power spectrum processor
///
/// Precomputes the Hann window once; the FFT plan is cached inside the
/// shared planner.
pub struct StftProcessor {
    fft_planner: Arc<Mutex<FftPlanner<f32>>>,
    n_fft: usize,
    hop_length: usize,
    /// Hann window (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size in samples
    /// * `hop_length` - Samples between consecutive frame starts
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        // Pre-compute Hann window to reduce spectral leakage
        let window = (0..n_fft)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / (n_fft as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
            n_fft,
            hop_length,
            window,
        }
    }

    /// Number of frames the processor produces for an input length
    ///
    /// Zero for empty input; otherwise one frame per hop with the last
    /// frames zero-padded, matching a centered framing's count.
    pub fn num_frames(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            1 + (len - 1) / self.hop_length
        }
    }

    /// Number of frequency bins per frame (positive frequencies only)
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Compute the power spectrogram of a waveform
    ///
    /// Each frame is Hann-windowed, zero-padded to `n_fft` where it overruns
    /// the waveform, transformed, and reduced to squared magnitudes of the
    /// positive-frequency bins.
    ///
    /// # Returns
    /// One `num_bins()`-long power spectrum per frame; empty for empty input.
    pub fn power_spectrogram(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let n_frames = self.num_frames(samples.len());
        let mut frames = Vec::with_capacity(n_frames);

        let mut planner = self.fft_planner.lock().unwrap();
        let fft = planner.plan_fft_forward(self.n_fft);

        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.n_fft];
        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_length;
            let end = (start + self.n_fft).min(samples.len());
            let slice = &samples[start..end];

            for (i, value) in buffer.iter_mut().enumerate() {
                let sample = if i < slice.len() { slice[i] } else { 0.0 };
                *value = Complex::new(sample * self.window[i], 0.0);
            }

            fft.process(&mut buffer);

            frames.push(
                buffer[..self.num_bins()]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .collect(),
            );
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(sample_rate: u32, freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_frame_count() {
        let stft = StftProcessor::new(2048, 512);
        assert_eq!(stft.num_frames(0), 0);
        assert_eq!(stft.num_frames(1), 1);
        assert_eq!(stft.num_frames(512), 1);
        assert_eq!(stft.num_frames(513), 2);
        assert_eq!(stft.num_frames(55_125), 108);
    }

    #[test]
    fn test_spectrogram_shape() {
        let stft = StftProcessor::new(2048, 512);
        let signal = sine(22_050, 440.0, 8192);
        let frames = stft.power_spectrogram(&signal);
        assert_eq!(frames.len(), stft.num_frames(8192));
        for frame in &frames {
            assert_eq!(frame.len(), 1025);
        }
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let stft = StftProcessor::new(2048, 512);
        let sample_rate = 22_050;
        let freq = 440.0;
        let signal = sine(sample_rate, freq, 4096);
        let frames = stft.power_spectrogram(&signal);

        let expected_bin = (freq * 2048.0 / sample_rate as f32).round() as usize;
        let first = &frames[0];
        let peak_bin = first
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            (peak_bin as i64 - expected_bin as i64).abs() <= 1,
            "peak at bin {}, expected about {}",
            peak_bin,
            expected_bin
        );
    }

    #[test]
    fn test_silence_is_all_zero_power() {
        let stft = StftProcessor::new(1024, 256);
        let frames = stft.power_spectrogram(&vec![0.0; 2048]);
        for frame in frames {
            assert!(frame.iter().all(|&p| p == 0.0));
        }
    }

    #[test]
    fn test_empty_input_has_no_frames() {
        let stft = StftProcessor::new(2048, 512);
        assert!(stft.power_spectrogram(&[]).is_empty());
    }

    #[test]
    fn test_power_is_non_negative() {
        let stft = StftProcessor::new(1024, 512);
        let signal = sine(22_050, 1000.0, 3000);
        for frame in stft.power_spectrogram(&signal) {
            assert!(frame.iter().all(|&p| p >= 0.0));
        }
    }
}
