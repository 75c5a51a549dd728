//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Frame geometry, feature
//! thresholds, live-monitor timing and similarity weights can all be
//! adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Tolerance used when checking that category weights sum to one
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub live: LiveMonitorConfig,
    #[serde(default)]
    pub weights: SimilarityWeights,
}

/// Frame slicing and comparison down-sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Analysis frame size in samples
    pub frame_size: usize,
    /// Hop between frame starts (must be <= frame_size)
    pub hop_size: usize,
    /// Buffers longer than this are decimated before comparison
    pub max_comparison_samples: usize,
    /// Apply a buffer-wide Hann window before frequency analysis
    pub window_buffer: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 2048,
            // 2 seconds at 44.1 kHz
            max_comparison_samples: 88_200,
            window_buffer: true,
        }
    }
}

/// Fundamental frequency estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchMethod {
    /// First autocorrelation peak of the time-domain frame
    Autocorrelation,
    /// Strongest magnitude bin inside the pitch search range
    SpectralPeak,
}

/// Feature extraction thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Number of MFCC coefficients per frame
    pub mfcc_coefficients: usize,
    /// Number of triangular mel filters
    pub mel_bands: usize,
    /// Amplitude above which a sample counts as voiced
    pub silence_threshold: f32,
    /// Sub-threshold run still bridged into a voiced segment
    pub silence_bridge_ms: u32,
    /// Fraction of spectral energy below the rolloff frequency
    pub rolloff_fraction: f32,
    /// Harmonic presence threshold relative to the frame peak (dB)
    pub harmonic_threshold_db: f32,
    /// Energy above this frequency counts towards brightness
    pub brightness_cutoff_hz: f32,
    /// Estimator used for the comparison path
    pub pitch_method: PitchMethod,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            mfcc_coefficients: 13,
            mel_bands: 26,
            silence_threshold: 0.01,
            silence_bridge_ms: 200,
            rolloff_fraction: 0.85,
            harmonic_threshold_db: -50.0,
            brightness_cutoff_hz: 1500.0,
            pitch_method: PitchMethod::Autocorrelation,
        }
    }
}

/// Live feature monitor timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMonitorConfig {
    /// EMA smoothing factor applied to instantaneous features
    pub ema_alpha: f32,
    /// Minimum interval between processed ticks
    pub tick_interval_ms: u64,
    /// Silence longer than this resets the monitor
    pub silence_reset_ms: u64,
}

impl Default for LiveMonitorConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.1,
            tick_interval_ms: 100,
            silence_reset_ms: 1000,
        }
    }
}

/// Timbre category weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimbreWeights {
    pub harmonics: f32,
    pub spectral_envelope: f32,
    pub brightness: f32,
    pub formant: f32,
}

/// Acoustic category weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticWeights {
    pub mfcc: f32,
    pub spectral: f32,
    pub pitch: f32,
}

/// Rhythm category weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmWeights {
    pub speed: f32,
    pub pause: f32,
    pub duration: f32,
}

/// Overall score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallWeights {
    pub timbre: f32,
    pub acoustic: f32,
    pub rhythm: f32,
}

/// Fixed category weights for the similarity scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub timbre: TimbreWeights,
    pub acoustic: AcousticWeights,
    pub rhythm: RhythmWeights,
    pub overall: OverallWeights,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            timbre: TimbreWeights {
                harmonics: 0.35,
                spectral_envelope: 0.35,
                brightness: 0.15,
                formant: 0.15,
            },
            acoustic: AcousticWeights {
                mfcc: 0.4,
                spectral: 0.3,
                pitch: 0.3,
            },
            rhythm: RhythmWeights {
                speed: 0.4,
                pause: 0.4,
                duration: 0.2,
            },
            overall: OverallWeights {
                timbre: 0.4,
                acoustic: 0.3,
                rhythm: 0.3,
            },
        }
    }
}

impl SimilarityWeights {
    fn check_sum(field: &str, weights: &[f32]) -> Result<(), AnalysisError> {
        let sum: f32 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE
        {
            return Err(AnalysisError::ConfigInvalid {
                field: field.to_string(),
                reason: format!("weights must be non-negative and sum to 1 (got {:.4})", sum),
            });
        }
        Ok(())
    }

    /// Verify every category sums to one
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let t = &self.timbre;
        Self::check_sum(
            "weights.timbre",
            &[t.harmonics, t.spectral_envelope, t.brightness, t.formant],
        )?;
        let a = &self.acoustic;
        Self::check_sum("weights.acoustic", &[a.mfcc, a.spectral, a.pitch])?;
        let r = &self.rhythm;
        Self::check_sum("weights.rhythm", &[r.speed, r.pause, r.duration])?;
        let o = &self.overall;
        Self::check_sum("weights.overall", &[o.timbre, o.acoustic, o.rhythm])
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// its JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |field: &str, reason: &str| AnalysisError::ConfigInvalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.frames.frame_size < 2 {
            return Err(invalid("frames.frame_size", "must be at least 2"));
        }
        if self.frames.hop_size == 0 || self.frames.hop_size > self.frames.frame_size {
            return Err(invalid("frames.hop_size", "must be in 1..=frame_size"));
        }
        if self.frames.max_comparison_samples == 0 {
            return Err(invalid("frames.max_comparison_samples", "must be > 0"));
        }
        if self.features.mfcc_coefficients == 0
            || self.features.mfcc_coefficients > self.features.mel_bands
        {
            return Err(invalid(
                "features.mfcc_coefficients",
                "must be in 1..=mel_bands",
            ));
        }
        if !(self.features.rolloff_fraction > 0.0 && self.features.rolloff_fraction <= 1.0) {
            return Err(invalid("features.rolloff_fraction", "must be in (0, 1]"));
        }
        if !(self.live.ema_alpha > 0.0 && self.live.ema_alpha <= 1.0) {
            return Err(invalid("live.ema_alpha", "must be in (0, 1]"));
        }
        self.weights.validate()
    }
}
