// Temporal module - Time-domain feature extraction
//
// This module computes features directly from time-domain audio signals,
// framed the same way as the spectral features: frames advance by the hop
// length and the final frames run past the end of the waveform, where the
// implicit zero padding contributes no sign changes and no energy but still
// counts toward each frame's length.

/// Framewise time-domain feature computation
pub struct TemporalFeatures {
    frame_length: usize,
    hop_length: usize,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `frame_length` - Samples per analysis frame
    /// * `hop_length` - Samples between consecutive frame starts
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        Self {
            frame_length,
            hop_length,
        }
    }

    fn num_frames(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            1 + (len - 1) / self.hop_length
        }
    }

    /// Mean zero-crossing rate across frames
    ///
    /// Per frame: sign changes between consecutive samples divided by the
    /// frame length. High values indicate noise-like content, low values
    /// tonal content. Returns 0.0 for empty input.
    pub fn mean_zcr(&self, samples: &[f32]) -> f32 {
        let n_frames = self.num_frames(samples.len());
        if n_frames == 0 {
            return 0.0;
        }

        let mut total = 0.0_f32;
        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_length;
            let end = (start + self.frame_length).min(samples.len());
            let frame = &samples[start..end];

            let mut crossings = 0;
            for i in 1..frame.len() {
                // Check if sign changed (zero crossing)
                if (frame[i] >= 0.0 && frame[i - 1] < 0.0)
                    || (frame[i] < 0.0 && frame[i - 1] >= 0.0)
                {
                    crossings += 1;
                }
            }
            total += crossings as f32 / self.frame_length as f32;
        }

        total / n_frames as f32
    }

    /// Mean root-mean-square energy across frames
    ///
    /// Per frame: `sqrt(sum(x^2) / frame_length)`. Returns 0.0 for empty
    /// input.
    pub fn mean_rms(&self, samples: &[f32]) -> f32 {
        let n_frames = self.num_frames(samples.len());
        if n_frames == 0 {
            return 0.0;
        }

        let mut total = 0.0_f32;
        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_length;
            let end = (start + self.frame_length).min(samples.len());
            let frame = &samples[start..end];

            let sum_squares: f32 = frame.iter().map(|&x| x * x).sum();
            total += (sum_squares / self.frame_length as f32).sqrt();
        }

        total / n_frames as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zcr_of_alternating_signal() {
        // +1 -1 +1 -1 ... crosses on every step
        let samples: Vec<f32> = (0..8).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let temporal = TemporalFeatures::new(4, 4);
        // 3 crossings per 4-sample frame
        assert!((temporal.mean_zcr(&samples) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_of_constant_signal_is_zero() {
        let samples = vec![0.5; 64];
        let temporal = TemporalFeatures::new(16, 8);
        assert_eq!(temporal.mean_zcr(&samples), 0.0);
    }

    #[test]
    fn test_zcr_of_empty_input_is_zero() {
        let temporal = TemporalFeatures::new(2048, 512);
        assert_eq!(temporal.mean_zcr(&[]), 0.0);
        assert_eq!(temporal.mean_rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_constant_full_frames() {
        // Length is a multiple of hop with frame == hop: every frame full
        let samples = vec![0.5; 8];
        let temporal = TemporalFeatures::new(4, 4);
        assert!((temporal.mean_rms(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rms_counts_padding_in_denominator() {
        // Single sample: one frame of length 4, three implicit zeros
        let temporal = TemporalFeatures::new(4, 4);
        let rms = temporal.mean_rms(&[1.0]);
        assert!((rms - 0.5).abs() < 1e-6, "sqrt(1/4) expected, got {}", rms);
    }

    #[test]
    fn test_sine_zcr_tracks_frequency() {
        let sample_rate = 22_050_u32;
        let freq = 440.0_f32;
        let samples: Vec<f32> = (0..22_050)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect();
        let temporal = TemporalFeatures::new(2048, 512);
        let zcr = temporal.mean_zcr(&samples);
        // 440 Hz crosses zero 880 times per second: about 0.04 per sample
        let expected = 2.0 * freq / sample_rate as f32;
        assert!(
            (zcr - expected).abs() < 0.01,
            "zcr {} expected about {}",
            zcr,
            expected
        );
    }
}
