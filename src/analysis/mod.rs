// Analysis module - feature extraction and voiceprint comparison
//
// Architecture:
// - features: per-frame DSP (FFT, spectral, temporal, pitch, MFCC, perceptual)
// - stats: mean / std dev / change rate of per-frame tracks
// - feature_set: whole-buffer pipeline producing a FeatureSet
// - similarity: FeatureSet pair -> SimilarityReport
// - live: streaming monitor with EMA smoothing and a voice gate
//
// Comparison path: SampleBuffer -> BufferAnalyzer -> FeatureSet -> Comparator
// Live path:       LiveSource -> LiveFeatureMonitor -> LiveSnapshot

pub mod feature_set;
pub mod features;
pub mod live;
pub mod similarity;
pub mod stats;

pub use feature_set::{BufferAnalyzer, FeatureSet, FeatureStatistics};
pub use features::{FeatureExtractor, FrameFeatures};
pub use live::{LiveFeatureMonitor, LiveFrame, LiveSnapshot, LiveSource, MonitorState, TickOutcome};
pub use similarity::{Comparator, SimilarityDetails, SimilarityLevel, SimilarityReport};
pub use stats::{compute_statistics, Statistics};
