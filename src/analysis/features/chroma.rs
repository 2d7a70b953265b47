// Chroma module - pitch-class energy distribution from the STFT
//
// Folds the power spectrum onto the 12 pitch classes of the octave. Each FFT
// bin contributes to the classes nearest its fractional pitch position with
// Gaussian weighting, and each frame is normalized by its peak so the chroma
// block describes pitch content independently of level.

/// Reference frequency of pitch class 0 (C4)
const C4_HZ: f32 = 261.625_58;

/// Width of the Gaussian assignment in chroma bins
const ASSIGN_SIGMA: f32 = 1.0;

/// Chroma filterbank over the positive-frequency FFT bins
pub struct ChromaFilterbank {
    /// Row per pitch class, column per FFT bin
    weights: Vec<Vec<f32>>,
    n_chroma: usize,
}

impl ChromaFilterbank {
    /// Build the filterbank for the given analysis geometry
    ///
    /// The DC bin has no pitch and carries zero weight everywhere. Every
    /// other bin's weights are normalized to sum to one, so total spectral
    /// energy is conserved when folding into chroma space.
    pub fn new(sample_rate: u32, n_fft: usize, n_chroma: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let mut weights = vec![vec![0.0_f32; n_bins]; n_chroma];

        for bin in 1..n_bins {
            let freq = bin as f32 * sample_rate as f32 / n_fft as f32;
            let pitch = n_chroma as f32 * (freq / C4_HZ).log2();

            let mut column = vec![0.0_f32; n_chroma];
            let mut total = 0.0_f32;
            for (class, value) in column.iter_mut().enumerate() {
                let distance = wrapped_distance(pitch - class as f32, n_chroma as f32);
                let weight = (-0.5 * (distance / ASSIGN_SIGMA).powi(2)).exp();
                *value = weight;
                total += weight;
            }
            if total > 0.0 {
                for (class, value) in column.iter().enumerate() {
                    weights[class][bin] = value / total;
                }
            }
        }

        Self { weights, n_chroma }
    }

    pub fn n_chroma(&self) -> usize {
        self.n_chroma
    }

    /// Fold one power spectrum into pitch-class energies
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

    /// Fold and normalize one frame by its peak energy
    ///
    /// Silent frames stay all-zero instead of dividing by zero.
    pub fn apply_normalized(&self, power_spectrum: &[f32]) -> Vec<f32> {
        let mut chroma = self.apply(power_spectrum);
        let peak = chroma.iter().fold(0.0_f32, |acc, &v| acc.max(v));
        if peak > 0.0 {
            for value in &mut chroma {
                *value /= peak;
            }
        }
        chroma
    }
}

/// Signed distance folded into [-half, half) of the chroma circle
fn wrapped_distance(delta: f32, n_chroma: f32) -> f32 {
    let wrapped = delta.rem_euclid(n_chroma);
    if wrapped >= n_chroma / 2.0 {
        wrapped - n_chroma
    } else {
        wrapped
    }
}
