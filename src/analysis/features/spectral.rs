// Spectral module - Frequency-domain feature extraction
//
// This module computes spectral features from linear magnitude spectra.
// Centroid, spread, rolloff and brightness all weight bins by linear
// magnitude.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Spectral feature computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_size: usize,
    rolloff_fraction: f32,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT window size (spectrum length is half of it)
    /// * `rolloff_fraction` - Energy fraction for the rolloff point (0.85)
    pub fn new(sample_rate: u32, fft_size: usize, rolloff_fraction: f32) -> Self {
        Self {
            sample_rate,
            fft_size,
            rolloff_fraction,
        }
    }

    /// Width of one frequency bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// The spectral centroid represents the "center of mass" of the spectrum,
    /// and is a measure of the brightness of a sound.
    ///
    /// # Returns
    /// Spectral centroid in Hz, 0 for an empty or silent spectrum
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f32 {
        let freq_bin_width = self.bin_width();

        let weighted_sum: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| i as f32 * freq_bin_width * mag)
            .sum();

        let magnitude_sum: f32 = spectrum.iter().sum();

        if magnitude_sum > 1e-10 {
            weighted_sum / magnitude_sum
        } else {
            0.0
        }
    }

    /// Compute spectral spread around a given centroid
    ///
    /// Formula: spread = sqrt(Σ((f_i - centroid)² × |X[i]|) / Σ|X[i]|)
    ///
    /// # Returns
    /// Spread in Hz (standard deviation of the spectral distribution)
    pub fn compute_spread(&self, spectrum: &[f32], centroid: f32) -> f32 {
        let magnitude_sum: f32 = spectrum.iter().sum();
        if magnitude_sum <= 1e-10 {
            return 0.0;
        }

        let freq_bin_width = self.bin_width();
        let moment: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| {
                let deviation = i as f32 * freq_bin_width - centroid;
                deviation * deviation * mag
            })
            .sum();

        (moment / magnitude_sum).sqrt()
    }

    /// Compute spectral flatness (tonality measure)
    ///
    /// Formula: flatness = geometric_mean(|X[i]|) / arithmetic_mean(|X[i]|)
    ///
    /// Returns value between 0 (tonal, e.g., sine wave) and 1 (noise-like).
    /// This is also known as the Wiener entropy.
    pub fn compute_flatness(&self, spectrum: &[f32]) -> f32 {
        if spectrum.is_empty() {
            return 0.0;
        }

        // Filter out zero or near-zero values for geometric mean
        let non_zero_spectrum: Vec<f32> = spectrum
            .iter()
            .filter(|&&mag| mag > 1e-10)
            .copied()
            .collect();

        if non_zero_spectrum.is_empty() {
            return 0.0;
        }

        // Geometric mean: exp(mean(log(x)))
        let log_sum: f32 = non_zero_spectrum.iter().map(|&mag| mag.ln()).sum();
        let geometric_mean = (log_sum / non_zero_spectrum.len() as f32).exp();

        let arithmetic_mean: f32 =
            non_zero_spectrum.iter().sum::<f32>() / non_zero_spectrum.len() as f32;

        if arithmetic_mean > 1e-10 {
            (geometric_mean / arithmetic_mean).min(1.0)
        } else {
            0.0
        }
    }

    /// Compute spectral rolloff
    ///
    /// Finds the frequency below which `rolloff_fraction` of the summed
    /// magnitude is contained.
    ///
    /// # Returns
    /// Rolloff frequency in Hz
    pub fn compute_rolloff(&self, spectrum: &[f32]) -> f32 {
        let magnitude_sum: f32 = spectrum.iter().sum();

        if magnitude_sum < 1e-10 {
            return 0.0;
        }

        let threshold = self.rolloff_fraction * magnitude_sum;
        let freq_bin_width = self.bin_width();

        let mut cumulative = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            cumulative += mag;
            if cumulative >= threshold {
                return i as f32 * freq_bin_width;
            }
        }

        // Float accumulation can leave the last bins just short of the threshold
        (spectrum.len() - 1) as f32 * freq_bin_width
    }

    /// Fraction of summed magnitude above `cutoff_hz`
    ///
    /// Used as the brightness descriptor; 0 for a silent spectrum.
    pub fn compute_brightness(&self, spectrum: &[f32], cutoff_hz: f32) -> f32 {
        let magnitude_sum: f32 = spectrum.iter().sum();
        if magnitude_sum < 1e-10 {
            return 0.0;
        }

        let freq_bin_width = self.bin_width();
        let high: f32 = spectrum
            .iter()
            .enumerate()
            .filter(|(i, _)| *i as f32 * freq_bin_width > cutoff_hz)
            .map(|(_, &mag)| mag)
            .sum();

        (high / magnitude_sum).clamp(0.0, 1.0)
    }
}
