//! Deterministic synthetic recordings.
//!
//! Tests and the CLI `synth` command need repeatable audio without a
//! microphone. A `SyntheticSpec` describes the waveform; `generate` renders
//! it into a `SampleBuffer`. Noise is drawn from a seeded `StdRng` so the
//! same spec always yields the same samples.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::audio::SampleBuffer;

/// Default sample rate for generated fixtures.
pub const FIXTURE_SAMPLE_RATE: u32 = 44_100;

/// Number of partials in the voice-like pattern.
const VOICE_PARTIALS: usize = 8;

/// Syllable rate of the voice-like amplitude envelope (Hz).
const VOICE_SYLLABLE_HZ: f32 = 3.0;

/// Supported deterministic waveform patterns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Sine,
    /// Harmonic series with 1/k partial amplitudes under a syllable envelope
    Voice,
    WhiteNoise,
    Silence,
}

/// Configuration for synthetic fixtures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_frequency_hz() -> f32 {
    220.0
}

fn default_amplitude() -> f32 {
    0.8
}

fn default_sample_rate() -> u32 {
    FIXTURE_SAMPLE_RATE
}

fn default_duration_ms() -> u32 {
    1_000
}

fn default_seed() -> u64 {
    0x5EED
}

impl SyntheticSpec {
    /// One second of `pattern` at 44.1 kHz with default amplitude
    pub fn new(pattern: SyntheticPattern, frequency_hz: f32) -> Self {
        Self {
            pattern,
            frequency_hz,
            amplitude: default_amplitude(),
            sample_rate: default_sample_rate(),
            duration_ms: default_duration_ms(),
            seed: default_seed(),
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Render the fixture
    pub fn generate(&self) -> SampleBuffer {
        let len = (self.sample_rate as u64 * self.duration_ms as u64 / 1000) as usize;
        let rate = self.sample_rate.max(1) as f32;

        let samples: Vec<f32> = match self.pattern {
            SyntheticPattern::Sine => (0..len)
                .map(|i| self.amplitude * (2.0 * PI * self.frequency_hz * i as f32 / rate).sin())
                .collect(),
            SyntheticPattern::Voice => {
                let norm: f32 = (1..=VOICE_PARTIALS).map(|k| 1.0 / k as f32).sum();
                (0..len)
                    .map(|i| {
                        let t = i as f32 / rate;
                        let tone: f32 = (1..=VOICE_PARTIALS)
                            .filter(|&k| self.frequency_hz * (k as f32) < rate / 2.0)
                            .map(|k| {
                                (2.0 * PI * self.frequency_hz * k as f32 * t).sin() / k as f32
                            })
                            .sum();
                        let envelope = 0.5 * (1.0 - (2.0 * PI * VOICE_SYLLABLE_HZ * t).cos());
                        self.amplitude * envelope * tone / norm
                    })
                    .collect()
            }
            SyntheticPattern::WhiteNoise => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                (0..len)
                    .map(|_| self.amplitude * rng.gen_range(-1.0..1.0))
                    .collect()
            }
            SyntheticPattern::Silence => vec![0.0; len],
        };

        SampleBuffer::new(samples, self.sample_rate)
    }
}

/// Copy of `buffer` with every sample multiplied by `gain`
pub fn scaled(buffer: &SampleBuffer, gain: f32) -> SampleBuffer {
    SampleBuffer::new(
        buffer.samples().iter().map(|s| s * gain).collect(),
        buffer.sample_rate(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_follow_duration() {
        let buffer = SyntheticSpec::new(SyntheticPattern::Sine, 440.0)
            .with_duration_ms(500)
            .generate();
        assert_eq!(buffer.len(), 22_050);
        assert_eq!(buffer.sample_rate(), 44_100);
    }

    #[test]
    fn test_noise_is_seeded() {
        let spec = SyntheticSpec::new(SyntheticPattern::WhiteNoise, 0.0);
        assert_eq!(spec.generate(), spec.generate());
        assert_ne!(spec.generate(), spec.clone().with_seed(1).generate());
    }

    #[test]
    fn test_amplitude_bounds() {
        for pattern in [
            SyntheticPattern::Sine,
            SyntheticPattern::Voice,
            SyntheticPattern::WhiteNoise,
        ] {
            let buffer = SyntheticSpec::new(pattern, 150.0).with_amplitude(0.5).generate();
            assert!(buffer.samples().iter().all(|s| s.abs() <= 0.5 + 1e-6));
            assert!(buffer.samples().iter().any(|s| s.abs() > 0.05));
        }
    }

    #[test]
    fn test_silence_and_gain() {
        let silence = SyntheticSpec::new(SyntheticPattern::Silence, 0.0).generate();
        assert!(silence.samples().iter().all(|&s| s == 0.0));

        let sine = SyntheticSpec::new(SyntheticPattern::Sine, 440.0).generate();
        let half = scaled(&sine, 0.5);
        assert_eq!(half.samples()[100], sine.samples()[100] * 0.5);
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: SyntheticSpec = serde_json::from_str(r#"{"pattern":"voice"}"#).unwrap();
        assert_eq!(spec.pattern, SyntheticPattern::Voice);
        assert_eq!(spec.duration_ms, 1_000);
        assert_eq!(spec.sample_rate, FIXTURE_SAMPLE_RATE);
    }
}
