// Mel module - mel filterbank, band energies, and MFCC support
//
// Maps short-time power spectra onto a perceptually spaced frequency axis.
// The same filterbank feeds both the mel-spectrogram feature block and the
// log-mel input of the MFCC computation, so the two stay consistent by
// construction.

/// Convert frequency in Hz to the mel scale (HTK formula)
pub fn hz_to_mel(freq: f32) -> f32 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Convert mel back to frequency in Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Floor used before taking logs of spectral power
pub const POWER_FLOOR: f32 = 1e-10;

/// Convert a power value to decibels with a fixed floor
pub fn power_to_db(power: f32) -> f32 {
    10.0 * power.max(POWER_FLOOR).log10()
}

/// Triangular mel filterbank over the positive-frequency FFT bins
///
/// Filter centers are spaced evenly on the mel axis between 0 Hz and the
/// Nyquist frequency; each filter rises linearly from its left neighbor's
/// center and falls to its right neighbor's, with unit peak. Weights are
/// evaluated at each bin's exact frequency, so neighboring filters never
/// collapse onto the same edge.
pub struct MelFilterbank {
    /// Row per mel band, column per FFT bin
    weights: Vec<Vec<f32>>,
    n_mels: usize,
}

impl MelFilterbank {
    /// Build a filterbank for the given analysis geometry
    ///
    /// # Arguments
    /// * `sample_rate` - Analysis rate in Hz
    /// * `n_fft` - FFT size the spectra were computed with
    /// * `n_mels` - Number of triangular filters
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;

        let mel_low = hz_to_mel(0.0);
        let mel_high = hz_to_mel(nyquist);
        // n_mels + 2 edge points: left edge, n_mels centers, right edge
        let hz_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_low + (mel_high - mel_low) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let bin_freq = |bin: usize| bin as f32 * sample_rate as f32 / n_fft as f32;

        let mut weights = Vec::with_capacity(n_mels);
        for m in 0..n_mels {
            let left = hz_points[m];
            let center = hz_points[m + 1];
            let right = hz_points[m + 2];
            let row = (0..n_bins)
                .map(|bin| {
                    let freq = bin_freq(bin);
                    let rising = (freq - left) / (center - left);
                    let falling = (right - freq) / (right - center);
                    rising.min(falling).max(0.0)
                })
                .collect();
            weights.push(row);
        }

        Self { weights, n_mels }
    }

    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Project one power spectrum onto the mel bands
    pub fn apply(&self, power_spectrum: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| {
                row.iter()
                    .zip(power_spectrum)
                    .map(|(w, p)| w * p)
                    .sum::<f32>()
            })
            .collect()
    }
}

/// Orthonormal DCT-II basis applied across the mel axis
///
/// Row `c` holds the basis vector of coefficient `c`; rows are identical for
/// any requested coefficient count, so MFCC blocks of different sizes agree
/// on their shared prefix.
pub fn dct_basis(n_coeffs: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let mut basis = Vec::with_capacity(n_coeffs);
    for c in 0..n_coeffs {
        let scale = if c == 0 {
            (1.0 / n_mels as f32).sqrt()
        } else {
            (2.0 / n_mels as f32).sqrt()
        };
        let row = (0..n_mels)
            .map(|m| {
                scale
                    * (std::f32::consts::PI / n_mels as f32 * (m as f32 + 0.5) * c as f32).cos()
            })
            .collect();
        basis.push(row);
    }
    basis
}
