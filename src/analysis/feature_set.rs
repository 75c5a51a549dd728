// FeatureSet - buffer-level feature aggregation for the comparison path
//
// BufferAnalyzer runs the whole comparison-side pipeline for one buffer:
//   validate -> downsample -> Hann window -> frames -> per-frame features
//   -> aggregate (means, pitch range, envelope, formants, statistics)
//
// Frames with non-finite features are skipped and logged. A buffer that
// yields no valid frame aggregates to the all-zero FeatureSet.

use serde::Serialize;

use super::features::{FeatureExtractor, FrameFeatures, SharedPlanner, VoicedDurationTracker};
use super::stats::{compute_statistics, Statistics};
use crate::audio::frames::apply_hann;
use crate::audio::{downsample, FrameExtractor, SampleBuffer};
use crate::config::AppConfig;
use crate::error::AnalysisError;

/// Width of the moving average applied before formant peak picking (Hz)
pub const FORMANT_SMOOTHING_HZ: f32 = 300.0;

/// Formant search range (Hz)
pub const FORMANT_MIN_HZ: f32 = 200.0;
pub const FORMANT_MAX_HZ: f32 = 4000.0;

/// Number of formants kept
pub const MAX_FORMANTS: usize = 3;

/// Per-track statistics kept for rhythm comparison
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStatistics {
    pub rms: Statistics,
    pub spectral_centroid: Statistics,
    pub zcr: Statistics,
}

/// Buffer-level description of one recording
///
/// Computed once per compared buffer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    /// Coefficient-wise mean MFCC over valid frames
    pub mfcc: Vec<f32>,
    pub spectral_centroid: f32,
    pub spectral_rolloff: f32,
    pub spectral_flatness: f32,
    pub spectral_spread: f32,
    /// Mean fraction of energy above the brightness cutoff
    pub brightness: f32,
    pub rms: f32,
    pub energy: f32,
    /// Mean zero-crossing rate in Hz
    pub zcr: f32,
    pub loudness: f32,
    pub perceptual_spread: f32,
    pub perceptual_sharpness: f32,
    /// Mean fundamental over pitched frames, 0 when none
    pub fundamental_hz: f32,
    pub pitch_min_hz: f32,
    pub pitch_max_hz: f32,
    /// Mean harmonic count over pitched frames
    pub harmonic_count: f32,
    /// Mean Mel filterbank energies
    pub spectral_envelope: Vec<f32>,
    /// Up to three formant frequencies in Hz, ascending
    pub formants: Vec<f32>,
    pub duration_secs: f64,
    pub voiced_duration_secs: f64,
    pub statistics: FeatureStatistics,
    pub valid_frames: usize,
    pub skipped_frames: usize,
}

impl FeatureSet {
    /// All-zero set with correctly sized vectors
    pub fn zero(mfcc_coefficients: usize, mel_bands: usize) -> Self {
        Self {
            mfcc: vec![0.0; mfcc_coefficients],
            spectral_envelope: vec![0.0; mel_bands],
            ..Self::default()
        }
    }

    /// Voiced share of the recording in [0, 1]
    pub fn voiced_ratio(&self) -> f32 {
        if self.duration_secs > 0.0 {
            (self.voiced_duration_secs / self.duration_secs).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }

    fn aggregate(frames: &[FrameFeatures], mean_spectrum: &[f32], bin_width: f32) -> Self {
        let mean_of = |f: fn(&FrameFeatures) -> f32| -> f32 {
            frames.iter().map(f).sum::<f32>() / frames.len() as f32
        };

        let pitched: Vec<&FrameFeatures> =
            frames.iter().filter(|f| f.fundamental_hz > 0.0).collect();
        let (fundamental_hz, pitch_min_hz, pitch_max_hz, harmonic_count) = if pitched.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let n = pitched.len() as f32;
            (
                pitched.iter().map(|f| f.fundamental_hz).sum::<f32>() / n,
                pitched.iter().map(|f| f.fundamental_hz).fold(f32::MAX, f32::min),
                pitched.iter().map(|f| f.fundamental_hz).fold(0.0, f32::max),
                pitched.iter().map(|f| f.harmonic_count() as f32).sum::<f32>() / n,
            )
        };

        let rms_track: Vec<f32> = frames.iter().map(|f| f.rms).collect();
        let centroid_track: Vec<f32> = frames.iter().map(|f| f.centroid).collect();
        let zcr_track: Vec<f32> = frames.iter().map(|f| f.zcr).collect();

        Self {
            mfcc: mean_vector(frames.iter().map(|f| f.mfcc.as_slice())),
            spectral_centroid: mean_of(|f| f.centroid),
            spectral_rolloff: mean_of(|f| f.rolloff),
            spectral_flatness: mean_of(|f| f.flatness),
            spectral_spread: mean_of(|f| f.spread),
            brightness: mean_of(|f| f.brightness),
            rms: mean_of(|f| f.rms),
            energy: mean_of(|f| f.energy),
            zcr: mean_of(|f| f.zcr),
            loudness: mean_of(|f| f.loudness),
            perceptual_spread: mean_of(|f| f.perceptual_spread),
            perceptual_sharpness: mean_of(|f| f.perceptual_sharpness),
            fundamental_hz,
            pitch_min_hz,
            pitch_max_hz,
            harmonic_count,
            spectral_envelope: mean_vector(frames.iter().map(|f| f.mel_energies.as_slice())),
            formants: estimate_formants(mean_spectrum, bin_width),
            duration_secs: 0.0,
            voiced_duration_secs: 0.0,
            statistics: FeatureStatistics {
                rms: compute_statistics(&rms_track),
                spectral_centroid: compute_statistics(&centroid_track),
                zcr: compute_statistics(&zcr_track),
            },
            valid_frames: frames.len(),
            skipped_frames: 0,
        }
    }
}

/// Element-wise mean of equally long vectors
fn mean_vector<'a>(vectors: impl Iterator<Item = &'a [f32]>) -> Vec<f32> {
    let mut sum: Vec<f32> = Vec::new();
    let mut count = 0usize;
    for v in vectors {
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        }
        for (acc, &x) in sum.iter_mut().zip(v) {
            *acc += x;
        }
        count += 1;
    }
    if count > 0 {
        for acc in &mut sum {
            *acc /= count as f32;
        }
    }
    sum
}

/// Pick formant candidates from an average magnitude spectrum
///
/// The spectrum is smoothed with a 300 Hz moving average; the strongest
/// (up to three) local maxima between 200 Hz and 4 kHz are returned in
/// ascending frequency order.
pub fn estimate_formants(spectrum: &[f32], bin_width: f32) -> Vec<f32> {
    if spectrum.len() < 3 || bin_width <= 0.0 {
        return Vec::new();
    }

    let half = ((FORMANT_SMOOTHING_HZ / 2.0 / bin_width).round() as usize).max(1);
    let smoothed: Vec<f32> = (0..spectrum.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(spectrum.len());
            spectrum[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
        })
        .collect();

    let first = ((FORMANT_MIN_HZ / bin_width).ceil() as usize).max(1);
    let last = ((FORMANT_MAX_HZ / bin_width).floor() as usize).min(smoothed.len() - 2);

    // Flat tops (a lone bin smoothed into a plateau) report their center
    let mut peaks: Vec<(usize, f32)> = Vec::new();
    let mut i = first;
    while i <= last {
        if smoothed[i] > 0.0 && smoothed[i] > smoothed[i - 1] {
            let mut j = i;
            while j + 1 < smoothed.len() && smoothed[j + 1] == smoothed[i] {
                j += 1;
            }
            if j + 1 < smoothed.len() && smoothed[j + 1] < smoothed[i] {
                let center = (i + j) / 2;
                if center <= last {
                    peaks.push((center, smoothed[i]));
                }
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(MAX_FORMANTS);
    peaks.sort_by_key(|&(i, _)| i);
    peaks.into_iter().map(|(i, _)| i as f32 * bin_width).collect()
}

/// Runs the comparison-side extraction pipeline on whole buffers
pub struct BufferAnalyzer {
    config: AppConfig,
    planner: SharedPlanner,
}

impl BufferAnalyzer {
    pub fn new(config: &AppConfig, planner: SharedPlanner) -> Self {
        Self {
            config: config.clone(),
            planner,
        }
    }

    /// Extract the FeatureSet of one buffer
    ///
    /// # Errors
    /// `InvalidInput` for an empty buffer or a zero sample rate
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<FeatureSet, AnalysisError> {
        buffer.validate()?;

        let frame_config = &self.config.frames;
        let feature_config = &self.config.features;

        let (samples, stride) = downsample(buffer.samples(), frame_config.max_comparison_samples);
        let sample_rate = ((buffer.sample_rate() as f64 / stride as f64).round() as u32).max(1);
        if stride > 1 {
            tracing::debug!(
                "[BufferAnalyzer] Decimated {} samples by {} to {} Hz",
                buffer.len(),
                stride,
                sample_rate
            );
        }

        let mut windowed = samples.clone();
        if frame_config.window_buffer {
            apply_hann(&mut windowed);
        }

        let extractor = FeatureExtractor::new(
            sample_rate,
            frame_config.frame_size,
            feature_config,
            &self.planner,
        );
        let frame_extractor = FrameExtractor::new(frame_config.frame_size, frame_config.hop_size);

        let mut valid: Vec<FrameFeatures> = Vec::new();
        let mut spectrum_sum = vec![0.0f32; extractor.fft_size() / 2];
        let mut skipped = 0usize;

        for frame in frame_extractor.frames(&samples) {
            let end = (frame.start + frame_extractor.frame_size()).min(windowed.len());
            let spectrum = extractor.spectrum(&windowed[frame.start..end]);
            let features = extractor.extract_with_spectrum(&frame.data, &spectrum);

            if !features.is_finite() {
                let err = AnalysisError::ExtractionFailure {
                    frame_index: frame.index,
                    reason: "non-finite feature value".to_string(),
                };
                tracing::debug!("[BufferAnalyzer] Skipping frame: {}", err);
                skipped += 1;
                continue;
            }

            for (acc, &mag) in spectrum_sum.iter_mut().zip(&spectrum) {
                *acc += mag;
            }
            valid.push(features);
        }

        let mut tracker = VoicedDurationTracker::new(
            buffer.sample_rate(),
            feature_config.silence_threshold,
            feature_config.silence_bridge_ms,
        );
        tracker.process(buffer.samples());

        let mut set = if valid.is_empty() {
            FeatureSet::zero(feature_config.mfcc_coefficients, feature_config.mel_bands)
        } else {
            for acc in &mut spectrum_sum {
                *acc /= valid.len() as f32;
            }
            FeatureSet::aggregate(&valid, &spectrum_sum, extractor.bin_width())
        };
        set.duration_secs = buffer.duration_secs();
        set.voiced_duration_secs = tracker.voiced_seconds() as f64;
        set.skipped_frames = skipped;

        tracing::debug!(
            "[BufferAnalyzer] {} valid frames, {} skipped, f0 {:.1} Hz",
            set.valid_frames,
            set.skipped_frames,
            set.fundamental_hz
        );

        Ok(set)
    }
}
