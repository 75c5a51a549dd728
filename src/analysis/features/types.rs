// Types module - Data structures for audio features
//
// This module defines the per-frame feature record produced by the
// `FeatureExtractor` and consumed by both the buffer aggregator and the
// live monitor.

use super::pitch::Harmonic;

/// Features extracted from one analysis frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameFeatures {
    /// Root-mean-square amplitude of the time-domain frame
    pub rms: f32,

    /// Mean power (rms²)
    pub energy: f32,

    /// Zero-crossing rate in Hz
    pub zcr: f32,

    /// Spectral centroid in Hz (weighted mean frequency)
    pub centroid: f32,

    /// Spectral rolloff in Hz (85% energy threshold)
    pub rolloff: f32,

    /// Spectral flatness (0.0 tonal to 1.0 noise-like)
    pub flatness: f32,

    /// Spectral spread in Hz around the centroid
    pub spread: f32,

    /// Fraction of spectral energy above the brightness cutoff
    pub brightness: f32,

    /// Total Bark-band loudness
    pub loudness: f32,

    pub perceptual_spread: f32,

    pub perceptual_sharpness: f32,

    /// Estimated fundamental in Hz, 0 when unvoiced or silent
    pub fundamental_hz: f32,

    /// Harmonics of `fundamental_hz` present in the spectrum
    pub harmonics: Vec<Harmonic>,

    pub mfcc: Vec<f32>,

    /// Mel filterbank energies (spectral envelope)
    pub mel_energies: Vec<f32>,
}

impl FrameFeatures {
    /// True when every scalar and vector entry is finite
    pub fn is_finite(&self) -> bool {
        let scalars = [
            self.rms,
            self.energy,
            self.zcr,
            self.centroid,
            self.rolloff,
            self.flatness,
            self.spread,
            self.brightness,
            self.loudness,
            self.perceptual_spread,
            self.perceptual_sharpness,
            self.fundamental_hz,
        ];
        scalars.iter().all(|v| v.is_finite())
            && self.mfcc.iter().all(|v| v.is_finite())
            && self.mel_energies.iter().all(|v| v.is_finite())
            && self.harmonics.iter().all(|h| h.magnitude.is_finite())
    }

    pub fn harmonic_count(&self) -> usize {
        self.harmonics.len()
    }
}
