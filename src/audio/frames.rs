// Frames module - analysis frame slicing, windowing and decimation
//
// A buffer is cut into frames of `frame_size` samples every `hop_size`
// samples. The trailing partial frame is dropped when it holds fewer than
// half a frame of samples, otherwise it is zero-padded to full length.
// A partial frame is only emitted if it reaches samples no earlier frame
// covered.

use std::borrow::Cow;
use std::f32::consts::PI;

/// Symmetric Hann window: w[i] = 0.5 * (1 - cos(2*pi*i / (N - 1)))
pub fn hann_window(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f32) / (len as f32 - 1.0)).cos()))
        .collect()
}

/// Multiply samples in place by a Hann window of the same length
pub fn apply_hann(samples: &mut [f32]) {
    let window = hann_window(samples.len());
    for (sample, w) in samples.iter_mut().zip(window) {
        *sample *= w;
    }
}

/// Decimate by an integer stride so at most about `max_samples` remain
///
/// stride = floor(len / max_samples), at least 1; one sample is kept per
/// stride. Returns the decimated samples and the stride used.
pub fn downsample(samples: &[f32], max_samples: usize) -> (Vec<f32>, usize) {
    let stride = if max_samples == 0 {
        1
    } else {
        (samples.len() / max_samples).max(1)
    };
    if stride == 1 {
        return (samples.to_vec(), 1);
    }

    let kept = samples.len() / stride;
    let decimated = (0..kept).map(|i| samples[i * stride]).collect();
    (decimated, stride)
}

/// One analysis frame borrowed from (or padded copy of) a buffer
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Position of the frame in the sequence
    pub index: usize,
    /// Offset of the first sample in the source buffer
    pub start: usize,
    /// Exactly `frame_size` samples
    pub data: Cow<'a, [f32]>,
    /// True when the tail was zero-padded
    pub padded: bool,
}

/// Slices buffers into fixed-size, possibly overlapping frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameExtractor {
    frame_size: usize,
    hop_size: usize,
}

impl FrameExtractor {
    /// Create a frame extractor
    ///
    /// `hop_size` is clamped to 1..=frame_size.
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            frame_size,
            hop_size: hop_size.clamp(1, frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Lazily iterate over the frames of `samples`
    pub fn frames<'a>(&self, samples: &'a [f32]) -> Frames<'a> {
        Frames {
            samples,
            frame_size: self.frame_size,
            hop_size: self.hop_size,
            index: 0,
            done: false,
        }
    }

    /// Number of frames `frames()` yields for a buffer of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        let full = if len >= self.frame_size {
            (len - self.frame_size) / self.hop_size + 1
        } else {
            0
        };
        let next_start = full * self.hop_size;
        let has_partial = next_start < len
            && 2 * (len - next_start) >= self.frame_size
            && (full == 0 || (full - 1) * self.hop_size + self.frame_size < len);
        full + usize::from(has_partial)
    }
}

/// Iterator returned by [`FrameExtractor::frames`]
pub struct Frames<'a> {
    samples: &'a [f32],
    frame_size: usize,
    hop_size: usize,
    index: usize,
    done: bool,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let len = self.samples.len();
        let start = self.index * self.hop_size;
        if start >= len {
            self.done = true;
            return None;
        }

        let remaining = len - start;
        let index = self.index;

        if remaining >= self.frame_size {
            self.index += 1;
            return Some(Frame {
                index,
                start,
                data: Cow::Borrowed(&self.samples[start..start + self.frame_size]),
                padded: false,
            });
        }

        // Trailing partial frame: at most one, never entirely overlapped
        self.done = true;
        let reaches_new_samples =
            index == 0 || (index - 1) * self.hop_size + self.frame_size < len;
        if 2 * remaining < self.frame_size || !reaches_new_samples {
            return None;
        }

        let mut padded = Vec::with_capacity(self.frame_size);
        padded.extend_from_slice(&self.samples[start..]);
        padded.resize(self.frame_size, 0.0);
        Some(Frame {
            index,
            start,
            data: Cow::Owned(padded),
            padded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_shape() {
        let window = hann_window(5);
        assert!(window[0].abs() < 1e-7);
        assert!((window[2] - 1.0).abs() < 1e-6);
        assert!(window[4].abs() < 1e-7);
        assert_eq!(hann_window(1), vec![1.0]);
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_non_overlapping_frames_drop_short_tail() {
        let extractor = FrameExtractor::new(4, 4);
        let samples: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let frames: Vec<_> = extractor.frames(&samples).collect();
        // 9 = 4 + 4 + 1; a single-sample tail is under half a frame
        assert_eq!(frames.len(), 2);
        assert_eq!(extractor.frame_count(samples.len()), 2);
        assert!(frames.iter().all(|f| !f.padded));
    }

    #[test]
    fn test_long_tail_is_zero_padded() {
        let extractor = FrameExtractor::new(4, 4);
        let samples: Vec<f32> = (1..=10).map(|i| i as f32).collect();
        let frames: Vec<_> = extractor.frames(&samples).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(extractor.frame_count(samples.len()), 3);
        let last = frames.last().unwrap();
        assert!(last.padded);
        assert_eq!(&*last.data, &[9.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overlapping_frames() {
        let extractor = FrameExtractor::new(4, 2);
        let samples = vec![1.0; 8];
        let frames: Vec<_> = extractor.frames(&samples).collect();
        // Starts 0, 2, 4; the tail at 6 is already covered by the frame at 4
        assert_eq!(frames.len(), 3);
        assert_eq!(extractor.frame_count(samples.len()), 3);
        assert_eq!(frames[2].start, 4);
    }

    #[test]
    fn test_short_buffer_yields_no_frames() {
        let extractor = FrameExtractor::new(2048, 2048);
        assert_eq!(extractor.frames(&[0.5; 1000]).count(), 0);
        assert_eq!(extractor.frame_count(1000), 0);
        assert_eq!(extractor.frames(&[]).count(), 0);
    }

    #[test]
    fn test_frame_count_matches_iterator() {
        for (frame, hop) in [(8, 8), (8, 3), (8, 1), (5, 2)] {
            let extractor = FrameExtractor::new(frame, hop);
            for len in 0..40 {
                let samples = vec![0.0; len];
                assert_eq!(
                    extractor.frames(&samples).count(),
                    extractor.frame_count(len),
                    "frame={} hop={} len={}",
                    frame,
                    hop,
                    len
                );
            }
        }
    }

    #[test]
    fn test_downsample_stride() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let (decimated, stride) = downsample(&samples, 3);
        assert_eq!(stride, 3);
        assert_eq!(decimated, vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_downsample_is_idempotent_at_budget() {
        let samples: Vec<f32> = (0..200_000).map(|i| (i as f32 * 0.01).sin()).collect();
        let (once, _) = downsample(&samples, 88_200);
        let (twice, stride) = downsample(&once, 88_200);
        assert_eq!(stride, 1);
        assert_eq!(once, twice);
    }
}
