// Perceptual module - Bark-band loudness, perceptual spread and sharpness
//
// The magnitude spectrum is grouped into 24 critical bands; the specific
// loudness of a band is its summed magnitude raised to 0.23. Total loudness
// is the sum over bands. Spread measures how far the loudest band is from
// dominating, sharpness is the Zwicker-weighted loudness centroid.

/// Number of critical bands
pub const NUM_BARK_BANDS: usize = 24;

/// Critical band edges in Hz (Zwicker)
pub const BARK_EDGES: [f32; NUM_BARK_BANDS + 1] = [
    0.0, 100.0, 200.0, 300.0, 400.0, 510.0, 630.0, 770.0, 920.0, 1080.0, 1270.0, 1480.0, 1720.0,
    2000.0, 2320.0, 2700.0, 3150.0, 3700.0, 4400.0, 5300.0, 6400.0, 7700.0, 9500.0, 12000.0,
    15500.0,
];

/// Exponent applied to band magnitude sums
const LOUDNESS_EXPONENT: f32 = 0.23;

/// Loudness summary of one spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Loudness {
    /// Sum of specific loudness over all bands
    pub total: f32,
    /// Per-band specific loudness
    pub specific: Vec<f32>,
}

/// Critical band holding `freq`; frequencies past the last edge fall in the top band
pub fn bark_band(freq: f32) -> usize {
    BARK_EDGES[1..]
        .iter()
        .position(|&edge| freq < edge)
        .unwrap_or(NUM_BARK_BANDS - 1)
}

/// Bark-band perceptual features
pub struct PerceptualFeatures {
    /// Band index of each spectrum bin
    bin_bands: Vec<usize>,
}

impl PerceptualFeatures {
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT size; spectra passed in have `fft_size / 2` bins
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        let bin_hz = sample_rate as f32 / fft_size.max(1) as f32;
        let bin_bands = (0..fft_size / 2)
            .map(|bin| bark_band(bin as f32 * bin_hz))
            .collect();
        Self { bin_bands }
    }

    pub fn compute_loudness(&self, spectrum: &[f32]) -> Loudness {
        let mut band_sums = [0.0f32; NUM_BARK_BANDS];
        for (&band, &mag) in self.bin_bands.iter().zip(spectrum) {
            band_sums[band] += mag;
        }

        let specific: Vec<f32> = band_sums
            .iter()
            .map(|&sum| sum.max(0.0).powf(LOUDNESS_EXPONENT))
            .collect();
        let total = specific.iter().sum();

        Loudness { total, specific }
    }

    /// ((total - max) / total)², 0 for silence
    pub fn compute_spread(&self, loudness: &Loudness) -> f32 {
        if loudness.total <= 0.0 {
            return 0.0;
        }
        let max = loudness.specific.iter().copied().fold(0.0f32, f32::max);
        let ratio = (loudness.total - max) / loudness.total;
        ratio * ratio
    }

    /// Zwicker sharpness: 0.11 · Σ z·g(z)·N'(z) / N
    pub fn compute_sharpness(&self, loudness: &Loudness) -> f32 {
        if loudness.total <= 0.0 {
            return 0.0;
        }

        let weighted: f32 = loudness
            .specific
            .iter()
            .enumerate()
            .map(|(band, &specific)| {
                let z = band as f32 + 0.5;
                let g = if z < 15.8 {
                    1.0
                } else {
                    0.066 * (0.171 * z).exp()
                };
                z * g * specific
            })
            .sum();

        0.11 * weighted / loudness.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bark_band_lookup() {
        assert_eq!(bark_band(0.0), 0);
        assert_eq!(bark_band(150.0), 1);
        assert_eq!(bark_band(1000.0), 8);
        assert_eq!(bark_band(20_000.0), NUM_BARK_BANDS - 1);
    }

    #[test]
    fn test_silence_is_zero() {
        let p = PerceptualFeatures::new(44_100, 2048);
        let loudness = p.compute_loudness(&vec![0.0; 1024]);
        assert_eq!(loudness.total, 0.0);
        assert_eq!(p.compute_spread(&loudness), 0.0);
        assert_eq!(p.compute_sharpness(&loudness), 0.0);
    }

    #[test]
    fn test_single_band_has_no_spread() {
        let p = PerceptualFeatures::new(44_100, 2048);
        let mut spectrum = vec![0.0; 1024];
        spectrum[20] = 1.0; // ~430 Hz
        let loudness = p.compute_loudness(&spectrum);
        assert!((loudness.total - 1.0).abs() < 1e-6);
        assert_eq!(p.compute_spread(&loudness), 0.0);
    }

    #[test]
    fn test_high_content_is_sharper() {
        let p = PerceptualFeatures::new(44_100, 2048);
        let mut low = vec![0.0; 1024];
        low[10] = 1.0;
        let mut high = vec![0.0; 1024];
        high[400] = 1.0; // ~8.6 kHz
        let low_sharpness = p.compute_sharpness(&p.compute_loudness(&low));
        let high_sharpness = p.compute_sharpness(&p.compute_loudness(&high));
        assert!(high_sharpness > low_sharpness);
    }
}
