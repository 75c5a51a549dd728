// AnalysisContext: explicitly owned engine state
// Carries the configuration and the shared FFT planner; no global singletons

use std::sync::Arc;

use crate::analysis::features::{new_planner, SharedPlanner};
use crate::analysis::{Comparator, FeatureSet, LiveFeatureMonitor, SimilarityReport};
use crate::audio::SampleBuffer;
use crate::config::AppConfig;
use crate::error::{log_analysis_error, AnalysisError};

/// AnalysisContext: entry point for extraction and comparison
///
/// Cheap to clone; clones share the FFT planner. Comparisons hold no
/// mutable state, so one context can serve concurrent calls.
#[derive(Clone)]
pub struct AnalysisContext {
    config: Arc<AppConfig>,
    planner: SharedPlanner,
    comparator: Arc<Comparator>,
}

impl AnalysisContext {
    /// Create a context from a validated configuration
    ///
    /// # Errors
    /// `ConfigInvalid` when the configuration fails validation
    pub fn new(config: AppConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let planner = new_planner();
        let comparator = Arc::new(Comparator::new(&config, planner.clone()));
        Ok(Self {
            config: Arc::new(config),
            planner,
            comparator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Extract the FeatureSet of one buffer on the calling thread
    pub fn extract(&self, buffer: &SampleBuffer) -> Result<FeatureSet, AnalysisError> {
        self.comparator.analyzer().analyze(buffer)
    }

    /// Compare two buffers on the calling thread
    ///
    /// Errors are logged and reported as `SimilarityReport::zero()`.
    pub fn compare(&self, a: &SampleBuffer, b: &SampleBuffer) -> SimilarityReport {
        self.comparator.compare_buffers(a, b)
    }

    /// Compare two already-extracted feature sets
    pub fn compare_features(&self, a: &FeatureSet, b: &FeatureSet) -> SimilarityReport {
        self.comparator.compare(a, b)
    }

    /// Extract on the tokio blocking pool
    pub async fn extract_async(&self, buffer: SampleBuffer) -> Result<FeatureSet, AnalysisError> {
        let comparator = Arc::clone(&self.comparator);
        tokio::task::spawn_blocking(move || comparator.analyzer().analyze(&buffer))
            .await
            .map_err(|err| AnalysisError::ComparisonFailure {
                reason: format!("extraction worker failed: {}", err),
            })?
    }

    /// Compare on the tokio blocking pool
    ///
    /// A worker that panics or is cancelled yields the zero report.
    pub async fn compare_async(&self, a: SampleBuffer, b: SampleBuffer) -> SimilarityReport {
        let comparator = Arc::clone(&self.comparator);
        match tokio::task::spawn_blocking(move || comparator.compare_buffers(&a, &b)).await {
            Ok(report) => report,
            Err(err) => {
                let err = AnalysisError::ComparisonFailure {
                    reason: format!("comparison worker failed: {}", err),
                };
                log_analysis_error(&err, "compare_async");
                SimilarityReport::zero()
            }
        }
    }

    /// New live monitor sharing this context's configuration and planner
    pub fn live_monitor(&self, sample_rate: u32) -> LiveFeatureMonitor {
        LiveFeatureMonitor::new(sample_rate, &self.config, self.planner.clone())
    }
}
