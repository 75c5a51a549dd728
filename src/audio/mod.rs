// Audio module - sample buffers handed over by the capture/playback provider
//
// The engine never talks to audio hardware. A provider decodes or records
// audio and hands over a fully materialized `SampleBuffer`; everything in
// this crate only borrows those samples read-only.

pub mod frames;
pub mod wav;

pub use frames::{downsample, hann_window, Frame, FrameExtractor};
pub use wav::{load_wav, write_wav};

use crate::error::AnalysisError;

/// Mono PCM samples in [-1, 1] tagged with their sample rate
///
/// Immutable once constructed. Duration is derived from the sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap already-decoded mono samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Down-mix interleaved multi-channel samples to mono by averaging
    ///
    /// # Errors
    /// `InvalidInput` when `channels` is zero
    pub fn from_interleaved(
        interleaved: &[f32],
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        if channels == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        let channels = channels as usize;
        let samples = if channels == 1 {
            interleaved.to_vec()
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        Ok(Self::new(samples, sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (0 when the sample rate is invalid)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Reject buffers no feature work can be done on
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: "sample rate must be > 0".to_string(),
            });
        }
        if self.samples.is_empty() {
            return Err(AnalysisError::InvalidInput {
                reason: "buffer contains no samples".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_sample_count() {
        let buffer = SampleBuffer::new(vec![0.0; 44_100], 44_100);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-12);
        assert_eq!(buffer.len(), 44_100);
    }

    #[test]
    fn test_from_interleaved_downmixes() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 48_000).unwrap();
        assert_eq!(buffer.samples(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_from_interleaved_rejects_zero_channels() {
        let result = SampleBuffer::from_interleaved(&[0.1, 0.2], 0, 48_000);
        assert!(matches!(result, Err(AnalysisError::InvalidInput { .. })));
    }

    #[test]
    fn test_validate() {
        assert!(SampleBuffer::new(vec![0.1], 0).validate().is_err());
        assert!(SampleBuffer::new(vec![], 44_100).validate().is_err());
        assert!(SampleBuffer::new(vec![0.1], 44_100).validate().is_ok());
    }
}
