// MFCC module - Mel-frequency cepstral coefficients
//
// Power spectrum -> triangular Mel filterbank (0 Hz .. Nyquist) -> ln(1 + x)
// -> orthonormal DCT-II, keeping the first `coefficients` values.
//
// ln(1 + x) keeps a silent frame at an all-zero coefficient vector, which
// lets silence compare cleanly against silence.

/// Hz to Mel scale conversion
#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz conversion
#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Filterbank and DCT table for one (sample rate, FFT size) pair
#[derive(Debug, Clone)]
pub struct MfccProcessor {
    /// One weight per spectrum bin, per filter
    filters: Vec<Vec<f32>>,
    /// dct[k][n] for k < coefficients, n < mel bands
    dct: Vec<Vec<f32>>,
}

impl MfccProcessor {
    /// Build the filterbank
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT size; spectra passed in have `fft_size / 2` bins
    /// * `mel_bands` - Number of triangular filters (26)
    /// * `coefficients` - Number of cepstral coefficients kept (13)
    pub fn new(sample_rate: u32, fft_size: usize, mel_bands: usize, coefficients: usize) -> Self {
        let num_bins = fft_size / 2;
        let bin_hz = sample_rate as f32 / fft_size.max(1) as f32;
        let mel_high = hz_to_mel(sample_rate as f32 / 2.0);

        let edges_hz: Vec<f32> = (0..mel_bands + 2)
            .map(|i| mel_to_hz(mel_high * i as f32 / (mel_bands + 1) as f32))
            .collect();

        let filters = edges_hz
            .windows(3)
            .map(|edge| {
                let (start_hz, center_hz, end_hz) = (edge[0], edge[1], edge[2]);
                (0..num_bins)
                    .map(|bin| {
                        let freq = bin as f32 * bin_hz;
                        if freq <= start_hz || freq >= end_hz {
                            0.0
                        } else if freq <= center_hz {
                            (freq - start_hz) / (center_hz - start_hz)
                        } else {
                            (end_hz - freq) / (end_hz - center_hz)
                        }
                    })
                    .collect()
            })
            .collect();

        let n = mel_bands as f32;
        let dct = (0..coefficients)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..mel_bands)
                    .map(|i| {
                        scale * (std::f32::consts::PI * k as f32 * (i as f32 + 0.5) / n).cos()
                    })
                    .collect()
            })
            .collect();

        Self { filters, dct }
    }

    pub fn coefficients(&self) -> usize {
        self.dct.len()
    }

    pub fn mel_bands(&self) -> usize {
        self.filters.len()
    }

    /// Filterbank energies of the power spectrum (|X|²)
    pub fn mel_energies(&self, spectrum: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|weights| {
                weights
                    .iter()
                    .zip(spectrum)
                    .map(|(&w, &mag)| w * mag * mag)
                    .sum()
            })
            .collect()
    }

    /// MFCC vector of a linear magnitude spectrum
    pub fn compute(&self, spectrum: &[f32]) -> Vec<f32> {
        self.compute_from_energies(&self.mel_energies(spectrum))
    }

    /// MFCC vector from precomputed filterbank energies
    pub fn compute_from_energies(&self, mel_energies: &[f32]) -> Vec<f32> {
        let log_energies: Vec<f32> = mel_energies.iter().map(|&e| e.max(0.0).ln_1p()).collect();

        self.dct
            .iter()
            .map(|row| row.iter().zip(&log_energies).map(|(c, e)| c * e).sum())
            .collect()
    }
}
