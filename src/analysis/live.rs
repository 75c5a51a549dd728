// Live module - streaming feature monitor with EMA smoothing and a voice gate
//
// The monitor is polled with `tick`. Each accepted tick pulls the newest
// frame from a `LiveSource`, extracts instantaneous features and folds them
// into a smoothed snapshot:
//
//   smoothed = alpha * instant + (1 - alpha) * smoothed      (alpha = 0.1)
//
// State machine:
//   Idle --voiced frame--> Voiced --silent frame--> SilencePending
//   SilencePending --voiced frame--> Voiced
//   SilencePending --silent for >= 1 s--> Idle (snapshot reset)
//
// Ticks closer than the configured interval (100 ms) to the previous
// accepted tick are ignored.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::features::{
    energy_to_db, FeatureExtractor, FrameFeatures, SharedPlanner, VoicedDurationTracker,
};
use crate::config::{AppConfig, LiveMonitorConfig, PitchMethod};

/// Newest audio handed over by a streaming source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveFrame {
    /// Time-domain samples in [-1, 1]
    pub samples: Vec<f32>,
    /// Linear magnitude spectrum (fft_size / 2 bins) when the source has one
    pub spectrum: Option<Vec<f32>>,
}

impl LiveFrame {
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples,
            spectrum: None,
        }
    }
}

/// Streaming frame provider (microphone tap, playback analyser, file replay)
pub trait LiveSource {
    fn sample_rate(&self) -> u32;

    /// Most recent frame, or `None` when nothing new is available
    fn latest_frame(&mut self) -> Option<LiveFrame>;
}

/// Voice-activity state of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Voiced,
    SilencePending,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Too soon after the previous tick
    Throttled,
    /// The source had no frame
    NoFrame,
    /// Silent frame while already idle
    Idle,
    /// Snapshot updated with the new frame
    Updated,
    /// Frame produced non-finite features and was dropped
    Skipped,
    /// Silence outlasted the grace period; state cleared
    Reset,
}

/// Smoothed feature values for display
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    /// Running voiced time in seconds (not smoothed)
    pub effective_duration_secs: f32,
    pub zcr_hz: f32,
    pub rms: f32,
    pub energy: f32,
    pub energy_db: f32,
    pub fundamental_hz: f32,
    pub harmonic_count: f32,
    pub spectral_centroid: f32,
    pub spectral_spread: f32,
    pub loudness: f32,
    pub perceptual_sharpness: f32,
    pub mfcc: Vec<f32>,
}

impl LiveSnapshot {
    fn from_features(features: &FrameFeatures) -> Self {
        Self {
            effective_duration_secs: 0.0,
            zcr_hz: features.zcr,
            rms: features.rms,
            energy: features.energy,
            energy_db: energy_to_db(features.energy),
            fundamental_hz: features.fundamental_hz,
            harmonic_count: features.harmonic_count() as f32,
            spectral_centroid: features.centroid,
            spectral_spread: features.spread,
            loudness: features.loudness,
            perceptual_sharpness: features.perceptual_sharpness,
            mfcc: features.mfcc.clone(),
        }
    }

    fn blend(&mut self, instant: &LiveSnapshot, alpha: f32) {
        let ema = |smoothed: &mut f32, value: f32| {
            *smoothed = alpha * value + (1.0 - alpha) * *smoothed;
        };
        ema(&mut self.zcr_hz, instant.zcr_hz);
        ema(&mut self.rms, instant.rms);
        ema(&mut self.energy, instant.energy);
        ema(&mut self.fundamental_hz, instant.fundamental_hz);
        ema(&mut self.harmonic_count, instant.harmonic_count);
        ema(&mut self.spectral_centroid, instant.spectral_centroid);
        ema(&mut self.spectral_spread, instant.spectral_spread);
        ema(&mut self.loudness, instant.loudness);
        ema(&mut self.perceptual_sharpness, instant.perceptual_sharpness);
        if self.mfcc.len() == instant.mfcc.len() {
            for (smoothed, &value) in self.mfcc.iter_mut().zip(&instant.mfcc) {
                ema(smoothed, value);
            }
        } else {
            self.mfcc = instant.mfcc.clone();
        }
        self.energy_db = energy_to_db(self.energy);
    }
}

/// Streaming analyser owned by a single task
pub struct LiveFeatureMonitor {
    config: LiveMonitorConfig,
    app_config: AppConfig,
    planner: SharedPlanner,
    sample_rate: u32,
    extractor: FeatureExtractor,
    tracker: VoicedDurationTracker,
    state: MonitorState,
    snapshot: LiveSnapshot,
    first_update: bool,
    last_tick: Option<Instant>,
    last_voiced_at: Option<Instant>,
}

impl LiveFeatureMonitor {
    /// Create a monitor for frames at `sample_rate`
    ///
    /// Pitch is always taken from the spectral peak here, independent of the
    /// comparison-side pitch method.
    pub fn new(sample_rate: u32, config: &AppConfig, planner: SharedPlanner) -> Self {
        let mut app_config = config.clone();
        app_config.features.pitch_method = PitchMethod::SpectralPeak;

        let extractor = Self::build_extractor(sample_rate, &app_config, &planner);
        let tracker = Self::build_tracker(sample_rate, &app_config);

        Self {
            config: config.live.clone(),
            app_config,
            planner,
            sample_rate,
            extractor,
            tracker,
            state: MonitorState::Idle,
            snapshot: LiveSnapshot::default(),
            first_update: true,
            last_tick: None,
            last_voiced_at: None,
        }
    }

    fn build_extractor(
        sample_rate: u32,
        config: &AppConfig,
        planner: &SharedPlanner,
    ) -> FeatureExtractor {
        FeatureExtractor::new(sample_rate, config.frames.frame_size, &config.features, planner)
    }

    fn build_tracker(sample_rate: u32, config: &AppConfig) -> VoicedDurationTracker {
        VoicedDurationTracker::new(
            sample_rate,
            config.features.silence_threshold,
            config.features.silence_bridge_ms,
        )
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Current smoothed values; re-queryable between ticks
    pub fn snapshot(&self) -> &LiveSnapshot {
        &self.snapshot
    }

    /// Poll the source now
    pub fn tick<S: LiveSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        self.tick_at(source, Instant::now())
    }

    /// Poll the source as if the current time were `now`
    pub fn tick_at<S: LiveSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> TickOutcome {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < interval {
                return TickOutcome::Throttled;
            }
        }
        self.last_tick = Some(now);

        if source.sample_rate() != self.sample_rate && source.sample_rate() > 0 {
            tracing::warn!(
                "[LiveMonitor] Source rate changed {} -> {} Hz, resetting",
                self.sample_rate,
                source.sample_rate()
            );
            self.sample_rate = source.sample_rate();
            self.extractor = Self::build_extractor(self.sample_rate, &self.app_config, &self.planner);
            self.tracker = Self::build_tracker(self.sample_rate, &self.app_config);
            self.reset();
        }

        let Some(frame) = source.latest_frame() else {
            return TickOutcome::NoFrame;
        };

        let threshold = self.app_config.features.silence_threshold;
        let silent = frame.samples.iter().all(|s| s.abs() < threshold);

        if silent {
            if self.state == MonitorState::Idle {
                return TickOutcome::Idle;
            }
            let grace = Duration::from_millis(self.config.silence_reset_ms);
            let expired = self
                .last_voiced_at
                .map_or(true, |at| now.saturating_duration_since(at) >= grace);
            if expired {
                tracing::debug!("[LiveMonitor] Silence exceeded {:?}, resetting", grace);
                self.reset();
                return TickOutcome::Reset;
            }
            self.state = MonitorState::SilencePending;
        } else {
            self.state = MonitorState::Voiced;
            self.last_voiced_at = Some(now);
        }

        self.update(&frame)
    }

    fn update(&mut self, frame: &LiveFrame) -> TickOutcome {
        let expected_bins = self.extractor.fft_size() / 2;
        let features = match &frame.spectrum {
            Some(spectrum) if spectrum.len() == expected_bins => {
                self.extractor.extract_with_spectrum(&frame.samples, spectrum)
            }
            _ => self.extractor.extract(&frame.samples),
        };
        self.tracker.process(&frame.samples);

        if !features.is_finite() {
            tracing::debug!("[LiveMonitor] Dropping frame with non-finite features");
            return TickOutcome::Skipped;
        }

        let instant = LiveSnapshot::from_features(&features);
        if self.first_update {
            self.snapshot = instant;
            self.first_update = false;
        } else {
            self.snapshot.blend(&instant, self.config.ema_alpha);
        }
        self.snapshot.effective_duration_secs = self.tracker.voiced_seconds();

        TickOutcome::Updated
    }

    /// Clear the snapshot and voice bookkeeping
    pub fn reset(&mut self) {
        self.state = MonitorState::Idle;
        self.snapshot = LiveSnapshot::default();
        self.first_update = true;
        self.last_voiced_at = None;
        self.tracker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::new_planner;
    use std::collections::VecDeque;
    use std::f32::consts::PI;

    struct ScriptedSource {
        sample_rate: u32,
        frames: VecDeque<LiveFrame>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<LiveFrame>) -> Self {
            Self {
                sample_rate: 44_100,
                frames: frames.into(),
            }
        }
    }

    impl LiveSource for ScriptedSource {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn latest_frame(&mut self) -> Option<LiveFrame> {
            self.frames.pop_front()
        }
    }

    fn tone(frequency: f32, amplitude: f32) -> LiveFrame {
        LiveFrame::from_samples(
            (0..2048)
                .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / 44_100.0).sin())
                .collect(),
        )
    }

    fn silence() -> LiveFrame {
        LiveFrame::from_samples(vec![0.0; 2048])
    }

    fn monitor() -> LiveFeatureMonitor {
        LiveFeatureMonitor::new(44_100, &AppConfig::default(), new_planner())
    }

    fn ms(start: Instant, offset: u64) -> Instant {
        start + Duration::from_millis(offset)
    }

    #[test]
    fn test_first_tick_assigns_directly() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5)]);
        let start = Instant::now();
        assert_eq!(m.tick_at(&mut source, start), TickOutcome::Updated);
        assert_eq!(m.state(), MonitorState::Voiced);
        let snap = m.snapshot();
        assert!((snap.rms - 0.5 / 2f32.sqrt()).abs() < 0.01);
        assert!((snap.fundamental_hz - 440.0).abs() < 25.0);
        assert!(snap.effective_duration_secs > 0.04);
    }

    #[test]
    fn test_ema_smoothing() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), tone(440.0, 0.1)]);
        let start = Instant::now();
        m.tick_at(&mut source, start);
        let first = m.snapshot().rms;
        m.tick_at(&mut source, ms(start, 100));
        let instant = 0.1 / 2f32.sqrt();
        let expected = 0.1 * instant + 0.9 * first;
        assert!((m.snapshot().rms - expected).abs() < 1e-3);
    }

    #[test]
    fn test_ticks_are_rate_limited() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), tone(440.0, 0.5)]);
        let start = Instant::now();
        assert_eq!(m.tick_at(&mut source, start), TickOutcome::Updated);
        assert_eq!(m.tick_at(&mut source, ms(start, 50)), TickOutcome::Throttled);
        assert_eq!(m.tick_at(&mut source, ms(start, 100)), TickOutcome::Updated);
        assert_eq!(m.tick_at(&mut source, ms(start, 200)), TickOutcome::NoFrame);
    }

    #[test]
    fn test_short_silence_is_pending() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), silence(), tone(440.0, 0.5)]);
        let start = Instant::now();
        m.tick_at(&mut source, start);
        assert_eq!(m.tick_at(&mut source, ms(start, 500)), TickOutcome::Updated);
        assert_eq!(m.state(), MonitorState::SilencePending);
        assert!(m.snapshot().rms > 0.0);
        m.tick_at(&mut source, ms(start, 600));
        assert_eq!(m.state(), MonitorState::Voiced);
    }

    #[test]
    fn test_long_silence_resets() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), silence(), silence()]);
        let start = Instant::now();
        m.tick_at(&mut source, start);
        assert_eq!(m.tick_at(&mut source, ms(start, 1_000)), TickOutcome::Reset);
        assert_eq!(m.state(), MonitorState::Idle);
        assert_eq!(m.snapshot(), &LiveSnapshot::default());
        assert_eq!(m.tick_at(&mut source, ms(start, 1_100)), TickOutcome::Idle);
    }

    #[test]
    fn test_update_after_reset_assigns_directly() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), tone(440.0, 0.1)]);
        let start = Instant::now();
        m.tick_at(&mut source, start);
        m.reset();
        m.tick_at(&mut source, ms(start, 100));
        assert!((m.snapshot().rms - 0.1 / 2f32.sqrt()).abs() < 0.01);
    }

    #[test]
    fn test_provided_spectrum_is_used() {
        let mut m = monitor();
        let mut frame = tone(440.0, 0.5);
        let mut spectrum = vec![0.0; 1024];
        spectrum[100] = 1.0; // ~2153 Hz
        frame.spectrum = Some(spectrum);
        let mut source = ScriptedSource::new(vec![frame]);
        m.tick_at(&mut source, Instant::now());
        assert!((m.snapshot().spectral_centroid - 100.0 * 44_100.0 / 2048.0).abs() < 1.0);
    }

    #[test]
    fn test_effective_duration_accumulates_unsmoothed() {
        let mut m = monitor();
        let mut source = ScriptedSource::new(vec![tone(440.0, 0.5), tone(440.0, 0.5)]);
        let start = Instant::now();
        m.tick_at(&mut source, start);
        m.tick_at(&mut source, ms(start, 100));
        let expected = 2.0 * 2048.0 / 44_100.0;
        assert!((m.snapshot().effective_duration_secs - expected).abs() < 0.005);
    }
}
