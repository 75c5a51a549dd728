// FeatureExtractor - per-frame DSP feature extraction for voice comparison
//
// This module extracts the features used to describe a voice recording.
// Features are computed from time-domain and frequency-domain
// representations of each analysis frame.
//
// Module organization:
// - types: Data structures (FrameFeatures struct)
// - fft: FFT computation with windowing
// - spectral: Frequency-domain features (centroid, rolloff, flatness, spread, brightness)
// - temporal: Time-domain features (RMS, energy, ZCR, voiced duration)
// - pitch: Fundamental frequency and harmonics
// - mfcc: Mel filterbank and cepstral coefficients
// - perceptual: Bark-band loudness, spread and sharpness
// - mod.rs: Coordinator (FeatureExtractor)
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

pub mod fft;
pub mod mfcc;
pub mod perceptual;
pub mod pitch;
pub mod spectral;
pub mod temporal;
mod types;

pub use fft::{new_planner, FftProcessor, SharedPlanner};
pub use mfcc::MfccProcessor;
pub use perceptual::PerceptualFeatures;
pub use pitch::Harmonic;
pub use spectral::SpectralFeatures;
pub use temporal::{energy_to_db, TemporalFeatures, VoicedDurationTracker};
pub use types::FrameFeatures;

use crate::config::{FeatureConfig, PitchMethod};

/// FeatureExtractor coordinates the DSP feature extraction pipeline
///
/// This struct combines FFT processing with the spectral, temporal, pitch,
/// cepstral and perceptual feature modules into a single interface. It is
/// built once per (sample rate, frame size) and reused for every frame.
pub struct FeatureExtractor {
    fft_processor: FftProcessor,
    spectral_features: SpectralFeatures,
    temporal_features: TemporalFeatures,
    perceptual_features: PerceptualFeatures,
    mfcc_processor: MfccProcessor,
    config: FeatureConfig,
    sample_rate: u32,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz of the frames to analyse
    /// * `fft_size` - FFT size, normally the frame size (2048)
    /// * `config` - Feature thresholds and pitch method
    /// * `planner` - Shared FFT planner
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        config: &FeatureConfig,
        planner: &SharedPlanner,
    ) -> Self {
        Self {
            fft_processor: FftProcessor::with_planner(fft_size, planner),
            spectral_features: SpectralFeatures::new(sample_rate, fft_size, config.rolloff_fraction),
            temporal_features: TemporalFeatures::new(sample_rate),
            perceptual_features: PerceptualFeatures::new(sample_rate, fft_size),
            mfcc_processor: MfccProcessor::new(
                sample_rate,
                fft_size,
                config.mel_bands,
                config.mfcc_coefficients,
            ),
            config: config.clone(),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_processor.fft_size()
    }

    /// Width of one spectrum bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.spectral_features.bin_width()
    }

    /// Linear magnitude spectrum (fft_size / 2 bins) of a frame
    pub fn spectrum(&self, audio: &[f32]) -> Vec<f32> {
        self.fft_processor.compute_magnitude_spectrum(audio)
    }

    /// Extract all features from one frame
    pub fn extract(&self, audio: &[f32]) -> FrameFeatures {
        self.extract_frame(audio, audio)
    }

    /// Extract features when time and frequency analysis use different samples
    ///
    /// The comparison path windows the whole (decimated) buffer before
    /// spectral analysis, while RMS, ZCR and pitch stay on the raw samples.
    ///
    /// # Arguments
    /// * `time_frame` - Raw samples for time-domain features and pitch
    /// * `freq_frame` - Samples to transform for spectral features
    pub fn extract_frame(&self, time_frame: &[f32], freq_frame: &[f32]) -> FrameFeatures {
        let spectrum = self.spectrum(freq_frame);
        self.extract_with_spectrum(time_frame, &spectrum)
    }

    /// Extract features from a frame whose spectrum is already known
    pub fn extract_with_spectrum(&self, audio: &[f32], spectrum: &[f32]) -> FrameFeatures {
        // Time-domain features
        let energy = self.temporal_features.compute_energy(audio);
        let rms = energy.sqrt();
        let zcr = self.temporal_features.compute_zcr(audio);

        // Frequency-domain features
        let centroid = self.spectral_features.compute_centroid(spectrum);
        let spread = self.spectral_features.compute_spread(spectrum, centroid);
        let flatness = self.spectral_features.compute_flatness(spectrum);
        let rolloff = self.spectral_features.compute_rolloff(spectrum);
        let brightness = self
            .spectral_features
            .compute_brightness(spectrum, self.config.brightness_cutoff_hz);

        // Perceptual features
        let loudness = self.perceptual_features.compute_loudness(spectrum);
        let perceptual_spread = self.perceptual_features.compute_spread(&loudness);
        let perceptual_sharpness = self.perceptual_features.compute_sharpness(&loudness);

        // Cepstral features
        let mel_energies = self.mfcc_processor.mel_energies(spectrum);
        let mfcc = self.mfcc_processor.compute_from_energies(&mel_energies);

        // Pitch only for frames above the silence gate
        let fundamental_hz = if rms > self.config.silence_threshold {
            match self.config.pitch_method {
                PitchMethod::Autocorrelation => {
                    pitch::autocorrelation_pitch(audio, self.sample_rate)
                }
                PitchMethod::SpectralPeak => {
                    pitch::spectral_peak_pitch(spectrum, self.bin_width())
                }
            }
        } else {
            0.0
        };
        let harmonics = pitch::detect_harmonics(
            spectrum,
            fundamental_hz,
            self.bin_width(),
            self.config.harmonic_threshold_db,
        );

        FrameFeatures {
            rms,
            energy,
            zcr,
            centroid,
            rolloff,
            flatness,
            spread,
            brightness,
            loudness: loudness.total,
            perceptual_spread,
            perceptual_sharpness,
            fundamental_hz,
            harmonics,
            mfcc,
            mel_energies,
        }
    }
}
