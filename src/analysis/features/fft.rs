// FFT module - Fast Fourier Transform computation
//
// This module handles FFT computation with proper windowing to reduce
// spectral leakage. The magnitude spectrum is used by the spectral,
// pitch, cepstral and perceptual feature modules.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::{Arc, Mutex};

use crate::audio::hann_window;

/// Shared planner handle; plans are cached per size
pub type SharedPlanner = Arc<Mutex<FftPlanner<f32>>>;

/// Create a fresh planner handle
pub fn new_planner() -> SharedPlanner {
    Arc::new(Mutex::new(FftPlanner::new()))
}

/// FFT processor that computes magnitude spectra from audio frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Hann window for FFT (pre-computed)
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor with its own planner
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (2048 for voice analysis)
    pub fn new(fft_size: usize) -> Self {
        Self::with_planner(fft_size, &new_planner())
    }

    /// Create an FFT processor reusing plans from a shared planner
    pub fn with_planner(fft_size: usize, planner: &SharedPlanner) -> Self {
        let fft = {
            // A poisoned planner still holds valid cached plans
            let mut planner = planner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            planner.plan_fft_forward(fft_size)
        };

        Self {
            fft,
            fft_size,
            window: hann_window(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute magnitude spectrum using FFT
    ///
    /// Applies Hann windowing, performs FFT, and returns the linear
    /// magnitude of the positive frequencies.
    ///
    /// # Arguments
    /// * `audio` - Audio frame (shorter frames are zero-padded, longer ones truncated)
    ///
    /// # Returns
    /// Magnitude spectrum (size = fft_size / 2)
    pub fn compute_magnitude_spectrum(&self, audio: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = audio
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2].iter().map(|c| c.norm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Naive O(N^2) DFT magnitude of the Hann-windowed input
    fn reference_dft(audio: &[f32]) -> Vec<f32> {
        let n = audio.len();
        let window = hann_window(n);
        (0..n / 2)
            .map(|k| {
                let (mut re, mut im) = (0.0f64, 0.0f64);
                for (i, (&x, &w)) in audio.iter().zip(&window).enumerate() {
                    let angle = -2.0 * std::f64::consts::PI * (k * i) as f64 / n as f64;
                    re += (x * w) as f64 * angle.cos();
                    im += (x * w) as f64 * angle.sin();
                }
                (re * re + im * im).sqrt() as f32
            })
            .collect()
    }

    #[test]
    fn test_fft_matches_reference_dft() {
        let processor = FftProcessor::new(256);
        let audio: Vec<f32> = (0..256)
            .map(|i| {
                let t = i as f32 / 8000.0;
                0.6 * (2.0 * PI * 440.0 * t).sin() + 0.3 * (2.0 * PI * 1250.0 * t).cos()
            })
            .collect();

        let fast = processor.compute_magnitude_spectrum(&audio);
        let slow = reference_dft(&audio);
        assert_eq!(fast.len(), 128);
        for (k, (a, b)) in fast.iter().zip(&slow).enumerate() {
            assert!((a - b).abs() < 1e-3, "bin {}: fft {} vs dft {}", k, a, b);
        }
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let processor = FftProcessor::new(64);
        let spectrum = processor.compute_magnitude_spectrum(&[1.0; 10]);
        assert_eq!(spectrum.len(), 32);
        assert!(spectrum.iter().all(|m| m.is_finite()));
    }

    #[test]
    fn test_shared_planner() {
        let planner = new_planner();
        let a = FftProcessor::with_planner(128, &planner);
        let b = FftProcessor::with_planner(128, &planner);
        let audio = vec![0.5; 128];
        assert_eq!(
            a.compute_magnitude_spectrum(&audio),
            b.compute_magnitude_spectrum(&audio)
        );
    }
}
