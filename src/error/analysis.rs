// Analysis error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Analysis error code constants
///
/// Single source of truth for the numeric codes reported by [`AnalysisError`].
///
/// Error code range: 2001-2005
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Buffer missing, empty, zero channels or non-positive sample rate
    pub const INVALID_INPUT: i32 = 2001;

    /// A single frame produced non-finite features
    pub const EXTRACTION_FAILURE: i32 = 2002;

    /// The two-buffer comparison pipeline failed as a whole
    pub const COMPARISON_FAILURE: i32 = 2003;

    /// Configuration values are inconsistent
    pub const CONFIG_INVALID: i32 = 2004;

    /// Audio could not be read from its source
    pub const SOURCE_UNAVAILABLE: i32 = 2005;
}

/// Log an analysis error with structured context
///
/// Logs the numeric code, the component and the message. Never panics.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=VoiceprintEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by feature extraction and comparison
///
/// Per-frame failures are normally absorbed by the extractor; only input
/// validation, configuration and source errors reach callers of the
/// extraction API. The comparator never returns these, it degrades to a
/// zero report instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input buffer rejected before any feature work
    InvalidInput { reason: String },

    /// Frame-level feature computation yielded non-finite output
    ExtractionFailure { frame_index: usize, reason: String },

    /// Uncaught failure during a two-buffer comparison
    ComparisonFailure { reason: String },

    /// Configuration rejected by validation
    ConfigInvalid { field: String, reason: String },

    /// Audio source could not be opened or decoded
    SourceUnavailable { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidInput { .. } => AnalysisErrorCodes::INVALID_INPUT,
            AnalysisError::ExtractionFailure { .. } => AnalysisErrorCodes::EXTRACTION_FAILURE,
            AnalysisError::ComparisonFailure { .. } => AnalysisErrorCodes::COMPARISON_FAILURE,
            AnalysisError::ConfigInvalid { .. } => AnalysisErrorCodes::CONFIG_INVALID,
            AnalysisError::SourceUnavailable { .. } => AnalysisErrorCodes::SOURCE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidInput { reason } => format!("Invalid input: {}", reason),
            AnalysisError::ExtractionFailure {
                frame_index,
                reason,
            } => format!("Feature extraction failed at frame {}: {}", frame_index, reason),
            AnalysisError::ComparisonFailure { reason } => {
                format!("Comparison failed: {}", reason)
            }
            AnalysisError::ConfigInvalid { field, reason } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            AnalysisError::SourceUnavailable { reason } => {
                format!("Audio source unavailable: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        AnalysisError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_codes() {
        assert_eq!(
            AnalysisError::InvalidInput {
                reason: "empty".to_string()
            }
            .code(),
            AnalysisErrorCodes::INVALID_INPUT
        );
        assert_eq!(
            AnalysisError::ExtractionFailure {
                frame_index: 3,
                reason: "nan".to_string()
            }
            .code(),
            AnalysisErrorCodes::EXTRACTION_FAILURE
        );
        assert_eq!(
            AnalysisError::ComparisonFailure {
                reason: "worker".to_string()
            }
            .code(),
            AnalysisErrorCodes::COMPARISON_FAILURE
        );
        assert_eq!(
            AnalysisError::ConfigInvalid {
                field: "frames.hop_size".to_string(),
                reason: "zero".to_string()
            }
            .code(),
            AnalysisErrorCodes::CONFIG_INVALID
        );
        assert_eq!(
            AnalysisError::SourceUnavailable {
                reason: "missing".to_string()
            }
            .code(),
            AnalysisErrorCodes::SOURCE_UNAVAILABLE
        );
    }

    #[test]
    fn test_analysis_error_messages() {
        let err = AnalysisError::ExtractionFailure {
            frame_index: 7,
            reason: "non-finite centroid".to_string(),
        };
        assert_eq!(
            err.message(),
            "Feature extraction failed at frame 7: non-finite centroid"
        );

        let err = AnalysisError::ConfigInvalid {
            field: "live.ema_alpha".to_string(),
            reason: "must be in (0, 1]".to_string(),
        };
        assert!(err.message().contains("live.ema_alpha"));
    }

    #[test]
    fn test_analysis_error_display() {
        let err = AnalysisError::InvalidInput {
            reason: "sample rate must be > 0".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("AnalysisError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("test io error");
        let err: AnalysisError = io_err.into();
        match err {
            AnalysisError::SourceUnavailable { reason } => {
                assert!(reason.contains("test io error"));
            }
            _ => panic!("Expected SourceUnavailable"),
        }
    }
}
