// Similarity module - turn two FeatureSets into a weighted similarity report
//
// Scoring hierarchy (default weights):
//   timbre   = harmonics 0.35, spectral envelope 0.35, brightness 0.15, formant 0.15
//   acoustic = MFCC 0.4, spectral 0.3, pitch 0.3
//   rhythm   = speed 0.4, pause 0.4, duration ratio 0.2
//   total    = timbre 0.4, acoustic 0.3, rhythm 0.3
//
// Every helper returns a value in [0, 1]; anything that cannot be compared
// (zeros on both sides, NaN, mismatched lengths) scores 0.

mod report;

pub use report::{
    sanitize_score, ReportSummary, SimilarityDetails, SimilarityLevel, SimilarityReport,
    STRENGTH_THRESHOLD, WEAKNESS_THRESHOLD,
};

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::feature_set::{BufferAnalyzer, FeatureSet};
use super::features::SharedPlanner;
use crate::audio::SampleBuffer;
use crate::config::{AppConfig, SimilarityWeights};
use crate::error::{log_analysis_error, AnalysisError};

/// Relative closeness of two scalars: 1 − |a − b| / max(|a|, |b|)
///
/// Symmetric. 0 when both are zero or either is non-finite.
pub fn scalar_similarity(a: f32, b: f32) -> f32 {
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    let max = a.abs().max(b.abs());
    if max == 0.0 {
        return 0.0;
    }
    sanitize_score(1.0 - (a - b).abs() / max)
}

/// 1 / (1 + RMSE) of two MFCC vectors; 0 when lengths differ or are empty
pub fn mfcc_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mse = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64;
    sanitize_score((1.0 / (1.0 + mse.sqrt())) as f32)
}

/// Shorter duration over longer duration
pub fn duration_ratio(a: f64, b: f64) -> f32 {
    if !(a.is_finite() && b.is_finite()) || a <= 0.0 || b <= 0.0 {
        return 0.0;
    }
    sanitize_score((a.min(b) / a.max(b)) as f32)
}

/// Pitch closeness on a log-frequency scale: 1 − |log2(a / b)|
///
/// One octave apart scores 0. Unpitched input (f0 ≤ 0) scores 0.
pub fn pitch_similarity(a: f32, b: f32) -> f32 {
    if !(a > 0.0 && b > 0.0) || !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    sanitize_score(1.0 - (a / b).log2().abs())
}

/// Cosine similarity of two non-negative vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    sanitize_score((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}

/// Mean scalar similarity over feature pairs
///
/// Pairs with zero or non-finite values on both sides carry no information
/// and are left out; with no pair left the group scores 0.
pub fn group_similarity(pairs: &[(f32, f32)]) -> f32 {
    let scores: Vec<f32> = pairs
        .iter()
        .filter(|(a, b)| {
            let informative = |v: &f32| v.is_finite() && *v != 0.0;
            informative(a) || informative(b)
        })
        .map(|&(a, b)| scalar_similarity(a, b))
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f32>() / scores.len() as f32
}

/// Index-wise mean similarity of formant lists; 0 if either side has none
pub fn formant_similarity(a: &[f32], b: &[f32]) -> f32 {
    let count = a.len().min(b.len());
    if count == 0 {
        return 0.0;
    }
    let sum: f32 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| scalar_similarity(x, y))
        .sum();
    // Missing formants on one side count as mismatches
    sum / a.len().max(b.len()) as f32
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Feature-level scorer holding the category weights
///
/// Stateless between calls; one comparator can serve any number of
/// comparisons.
pub struct Comparator {
    weights: SimilarityWeights,
    analyzer: BufferAnalyzer,
}

impl Comparator {
    pub fn new(config: &AppConfig, planner: SharedPlanner) -> Self {
        Self {
            weights: config.weights.clone(),
            analyzer: BufferAnalyzer::new(config, planner),
        }
    }

    pub fn analyzer(&self) -> &BufferAnalyzer {
        &self.analyzer
    }

    /// Score two extracted feature sets
    pub fn compare(&self, a: &FeatureSet, b: &FeatureSet) -> SimilarityReport {
        if a.valid_frames == 0 && b.valid_frames == 0 {
            tracing::warn!("[Comparator] Neither recording produced a valid frame");
            return SimilarityReport::zero();
        }
        if a == b {
            return SimilarityReport::perfect();
        }

        let w = &self.weights;

        // Timbre
        let harmonic_structure = scalar_similarity(a.harmonic_count, b.harmonic_count);
        let perceptual = group_similarity(&[
            (a.perceptual_spread, b.perceptual_spread),
            (a.perceptual_sharpness, b.perceptual_sharpness),
        ]);
        let spectral_envelope = mean(&[
            cosine_similarity(&a.spectral_envelope, &b.spectral_envelope),
            perceptual,
        ]);
        let brightness = scalar_similarity(a.brightness, b.brightness);
        let formant_match = formant_similarity(&a.formants, &b.formants);
        let timbre = w.timbre.harmonics * harmonic_structure
            + w.timbre.spectral_envelope * spectral_envelope
            + w.timbre.brightness * brightness
            + w.timbre.formant * formant_match;

        // Acoustic
        let mfcc = mfcc_similarity(&a.mfcc, &b.mfcc);
        let spectral = group_similarity(&[
            (a.spectral_centroid, b.spectral_centroid),
            (a.spectral_rolloff, b.spectral_rolloff),
            (a.spectral_flatness, b.spectral_flatness),
            (a.spectral_spread, b.spectral_spread),
        ]);
        let pitch = pitch_similarity(a.fundamental_hz, b.fundamental_hz);
        let pitch_range = mean(&[
            pitch_similarity(a.pitch_min_hz, b.pitch_min_hz),
            pitch_similarity(a.pitch_max_hz, b.pitch_max_hz),
        ]);
        let acoustic =
            w.acoustic.mfcc * mfcc + w.acoustic.spectral * spectral + w.acoustic.pitch * pitch;

        // Rhythm
        let speed = scalar_similarity(a.zcr, b.zcr);
        let pause = mean(&[
            scalar_similarity(
                a.statistics.rms.change_rate,
                b.statistics.rms.change_rate,
            ),
            scalar_similarity(a.voiced_ratio(), b.voiced_ratio()),
        ]);
        let duration = duration_ratio(a.duration_secs, b.duration_secs);
        let rhythm =
            w.rhythm.speed * speed + w.rhythm.pause * pause + w.rhythm.duration * duration;

        let energy = group_similarity(&[(a.rms, b.rms), (a.loudness, b.loudness)]);

        let total = w.overall.timbre * timbre
            + w.overall.acoustic * acoustic
            + w.overall.rhythm * rhythm;

        let report = SimilarityReport::new(
            total,
            timbre,
            acoustic,
            rhythm,
            SimilarityDetails {
                harmonic_structure,
                spectral_envelope,
                brightness,
                formant_match,
                mfcc,
                spectral,
                pitch,
                pitch_range,
                speed,
                pause,
                duration_ratio: duration,
                energy,
            },
        );

        tracing::info!(
            "[Comparator] total {:.3} (timbre {:.3}, acoustic {:.3}, rhythm {:.3})",
            report.total,
            report.timbre,
            report.acoustic,
            report.rhythm
        );
        report
    }

    /// Extract both buffers and score them, surfacing errors
    pub fn try_compare_buffers(
        &self,
        a: &SampleBuffer,
        b: &SampleBuffer,
    ) -> Result<SimilarityReport, AnalysisError> {
        let features_a = self.analyzer.analyze(a)?;
        let features_b = self.analyzer.analyze(b)?;
        Ok(self.compare(&features_a, &features_b))
    }

    /// Extract both buffers and score them
    ///
    /// Never fails: invalid input, extraction errors and panics inside the
    /// pipeline are logged and reported as `SimilarityReport::zero()`.
    pub fn compare_buffers(&self, a: &SampleBuffer, b: &SampleBuffer) -> SimilarityReport {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_compare_buffers(a, b)))
            .unwrap_or_else(|_| {
                Err(AnalysisError::ComparisonFailure {
                    reason: "comparison pipeline panicked".to_string(),
                })
            });

        match outcome {
            Ok(report) => report,
            Err(err) => {
                log_analysis_error(&err, "compare_buffers");
                SimilarityReport::zero()
            }
        }
    }
}
