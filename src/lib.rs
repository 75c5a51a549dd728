// Voiceprint Core - Rust audio feature engine
// Feature extraction, two-recording similarity scoring and live monitoring

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;

// Re-exports for convenience
pub use analysis::{
    FeatureSet, LiveFeatureMonitor, LiveFrame, LiveSnapshot, LiveSource, SimilarityReport,
};
pub use audio::{load_wav, SampleBuffer};
pub use config::AppConfig;
pub use context::AnalysisContext;
pub use error::{AnalysisError, ErrorCode};

/// Install a `tracing` fmt subscriber at `level`
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place. `log` records (configuration loading) are forwarded as well.
pub fn init_logging(level: tracing::Level) {
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        tracing::debug!("[Logging] Subscriber installed at {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(tracing::Level::DEBUG);
        init_logging(tracing::Level::INFO);
    }
}
