// Pitch module - fundamental frequency and harmonic detection
//
// Two estimators are provided:
// - Autocorrelation over the time-domain frame, taking the first local
//   maximum after the shortest admissible lag (refined by parabolic
//   interpolation around the peak)
// - Strongest magnitude bin inside the pitch search range
//
// Both return 0 Hz when no pitch can be found.

/// Lowest fundamental searched (Hz)
pub const MIN_PITCH_HZ: f32 = 20.0;

/// Highest fundamental searched (Hz)
pub const MAX_PITCH_HZ: f32 = 2000.0;

/// Longest autocorrelation lag evaluated, also the correlation window length
pub const MAX_AUTOCORRELATION_LAG: usize = 1000;

/// Number of harmonics tested (including the fundamental)
pub const HARMONICS_TESTED: usize = 8;

/// A harmonic found in a magnitude spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// 1 for the fundamental
    pub number: usize,
    pub frequency_hz: f32,
    pub magnitude: f32,
}

/// Estimate F0 from the first autocorrelation peak
///
/// # Arguments
/// * `audio` - Time-domain frame
/// * `sample_rate` - Sample rate of the frame in Hz
///
/// # Returns
/// Fundamental frequency in Hz, 0 when no positive local maximum exists
pub fn autocorrelation_pitch(audio: &[f32], sample_rate: u32) -> f32 {
    if audio.len() < 3 || sample_rate == 0 {
        return 0.0;
    }

    let sample_rate = sample_rate as f32;
    let min_lag = ((sample_rate / MAX_PITCH_HZ).floor() as usize).max(1);
    let max_lag = MAX_AUTOCORRELATION_LAG
        .min(audio.len() - 1)
        .min((sample_rate / MIN_PITCH_HZ).ceil() as usize);
    if max_lag < min_lag + 2 {
        return 0.0;
    }

    let correlation: Vec<f32> = (0..=max_lag)
        .map(|lag| {
            let count = MAX_AUTOCORRELATION_LAG.min(audio.len() - lag);
            audio[..count]
                .iter()
                .zip(&audio[lag..lag + count])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect();

    for lag in min_lag..max_lag {
        let (prev, current, next) = (correlation[lag - 1], correlation[lag], correlation[lag + 1]);
        if current > 0.0 && current > prev && current > next {
            let denominator = prev - 2.0 * current + next;
            let offset = if denominator.abs() > f32::EPSILON {
                (0.5 * (prev - next) / denominator).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            return sample_rate / (lag as f32 + offset);
        }
    }

    0.0
}

/// Estimate F0 as the strongest bin between 20 Hz and 2 kHz
///
/// # Arguments
/// * `spectrum` - Linear magnitude spectrum
/// * `bin_width` - Width of one bin in Hz
pub fn spectral_peak_pitch(spectrum: &[f32], bin_width: f32) -> f32 {
    if spectrum.is_empty() || bin_width <= 0.0 {
        return 0.0;
    }

    let min_bin = (MIN_PITCH_HZ / bin_width).floor() as usize;
    let max_bin = ((MAX_PITCH_HZ / bin_width).floor() as usize).min(spectrum.len());

    let mut best: Option<(usize, f32)> = None;
    for (i, &mag) in spectrum.iter().enumerate().take(max_bin).skip(min_bin) {
        if mag > best.map(|(_, m)| m).unwrap_or(0.0) {
            best = Some((i, mag));
        }
    }

    best.map(|(i, _)| i as f32 * bin_width).unwrap_or(0.0)
}

/// Find harmonics 1..=8 of `f0` whose bin is within `threshold_db` of the peak
///
/// The threshold is relative to the strongest bin of the spectrum, so the
/// harmonic count does not depend on overall gain.
pub fn detect_harmonics(
    spectrum: &[f32],
    f0: f32,
    bin_width: f32,
    threshold_db: f32,
) -> Vec<Harmonic> {
    if f0 <= 0.0 || !f0.is_finite() || bin_width <= 0.0 {
        return Vec::new();
    }

    let peak = spectrum.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return Vec::new();
    }
    let threshold = peak * 10f32.powf(threshold_db / 20.0);

    (1..=HARMONICS_TESTED)
        .filter_map(|number| {
            let frequency_hz = f0 * number as f32;
            let bin = (frequency_hz / bin_width).round() as usize;
            spectrum
                .get(bin)
                .filter(|&&magnitude| magnitude > threshold)
                .map(|&magnitude| Harmonic {
                    number,
                    frequency_hz,
                    magnitude,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_autocorrelation_finds_440() {
        let f0 = autocorrelation_pitch(&sine(44_100, 440.0, 2048), 44_100);
        assert!((f0 - 440.0).abs() < 5.0, "got {} Hz", f0);
    }

    #[test]
    fn test_autocorrelation_low_voice() {
        let f0 = autocorrelation_pitch(&sine(16_000, 120.0, 2048), 16_000);
        assert!((f0 - 120.0).abs() < 2.0, "got {} Hz", f0);
    }

    #[test]
    fn test_autocorrelation_silence_is_zero() {
        assert_eq!(autocorrelation_pitch(&[0.0; 2048], 44_100), 0.0);
        assert_eq!(autocorrelation_pitch(&[0.5], 44_100), 0.0);
    }

    #[test]
    fn test_spectral_peak_pitch() {
        let mut spectrum = vec![0.0; 100];
        spectrum[0] = 50.0; // DC, below the search range
        spectrum[22] = 5.0;
        spectrum[23] = 2.0;
        assert_eq!(spectral_peak_pitch(&spectrum, 20.0), 440.0);
        assert_eq!(spectral_peak_pitch(&vec![0.0; 100], 20.0), 0.0);
    }

    #[test]
    fn test_detect_harmonics_relative_threshold() {
        let mut spectrum = vec![0.0; 200];
        spectrum[10] = 1.0;
        spectrum[20] = 0.1; // -20 dB
        spectrum[30] = 1e-4; // -80 dB
        let harmonics = detect_harmonics(&spectrum, 100.0, 10.0, -50.0);
        let numbers: Vec<usize> = harmonics.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![1, 2]);

        // Same shape at a tenth of the level keeps the same count
        let quiet: Vec<f32> = spectrum.iter().map(|m| m * 0.1).collect();
        assert_eq!(detect_harmonics(&quiet, 100.0, 10.0, -50.0).len(), 2);
    }

    #[test]
    fn test_detect_harmonics_without_pitch() {
        assert!(detect_harmonics(&[1.0; 16], 0.0, 10.0, -50.0).is_empty());
        assert!(detect_harmonics(&[0.0; 16], 100.0, 10.0, -50.0).is_empty());
    }
}
