// Temporal module - Time-domain feature extraction
//
// This module computes features directly from time-domain audio signals:
// RMS, power, zero-crossing rate and the running effective voiced duration.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Differences smaller than this are treated as quantization jitter
const ZCR_EPSILON: f32 = 1e-6;

/// Floor used when converting power to decibels
pub const ENERGY_DB_FLOOR: f32 = -100.0;

/// Temporal feature computation functions
pub struct TemporalFeatures {
    sample_rate: u32,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Root-mean-square amplitude, 0 for an empty signal
    pub fn compute_rms(&self, audio: &[f32]) -> f32 {
        self.compute_energy(audio).sqrt()
    }

    /// Mean power (squared RMS), kept linear so it interpolates well
    pub fn compute_energy(&self, audio: &[f32]) -> f32 {
        if audio.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = audio.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_squares / audio.len() as f64) as f32
    }

    /// Compute zero-crossing rate in Hz
    ///
    /// Formula: ZCR = crossings × sample_rate / (2N)
    ///
    /// A crossing needs opposite signs and a step larger than 1e-6 so that
    /// quantization jitter around zero is not counted.
    pub fn compute_zcr(&self, audio: &[f32]) -> f32 {
        if audio.len() < 2 {
            return 0.0;
        }

        let crossings = audio
            .windows(2)
            .filter(|pair| pair[0] * pair[1] < 0.0 && (pair[1] - pair[0]).abs() > ZCR_EPSILON)
            .count();

        crossings as f32 * self.sample_rate as f32 / (2.0 * audio.len() as f32)
    }
}

/// Convert linear power to dB, clamped at [`ENERGY_DB_FLOOR`]
pub fn energy_to_db(energy: f32) -> f32 {
    if energy > 0.0 && energy.is_finite() {
        (10.0 * energy.log10()).max(ENERGY_DB_FLOOR)
    } else {
        ENERGY_DB_FLOOR
    }
}

/// Running effective voiced-duration counter
///
/// A sample is voiced when its amplitude exceeds the threshold. Sub-threshold
/// samples right after a voiced run are still counted while the run of
/// silence stays shorter than the bridge, so brief pauses inside speech do
/// not split it. The count survives across `process` calls.
#[derive(Debug, Clone)]
pub struct VoicedDurationTracker {
    sample_rate: u32,
    threshold: f32,
    bridge_samples: u64,
    silence_counter: u64,
    in_voice_segment: bool,
    total_voiced_samples: u64,
}

impl VoicedDurationTracker {
    pub fn new(sample_rate: u32, threshold: f32, bridge_ms: u32) -> Self {
        Self {
            sample_rate,
            threshold,
            bridge_samples: (bridge_ms as u64 * sample_rate as u64) / 1000,
            silence_counter: 0,
            in_voice_segment: false,
            total_voiced_samples: 0,
        }
    }

    /// Feed the next chunk of samples; returns how many counted as voiced
    pub fn process(&mut self, audio: &[f32]) -> u64 {
        let mut voiced = 0u64;
        for &sample in audio {
            if sample.abs() > self.threshold {
                self.in_voice_segment = true;
                self.silence_counter = 0;
                voiced += 1;
            } else {
                self.silence_counter += 1;
                if self.in_voice_segment && self.silence_counter < self.bridge_samples {
                    voiced += 1;
                } else {
                    self.in_voice_segment = false;
                }
            }
        }
        self.total_voiced_samples += voiced;
        voiced
    }

    pub fn total_voiced_samples(&self) -> u64 {
        self.total_voiced_samples
    }

    pub fn silence_counter(&self) -> u64 {
        self.silence_counter
    }

    /// Accumulated voiced time in seconds
    pub fn voiced_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_voiced_samples as f32 / self.sample_rate as f32
    }

    pub fn reset(&mut self) {
        self.silence_counter = 0;
        self.in_voice_segment = false;
        self.total_voiced_samples = 0;
    }
}
