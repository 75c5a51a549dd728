// Error types for the voiceprint engine
//
// This module defines the error taxonomy for feature extraction and comparison,
// providing structured error handling with numeric error codes so callers can
// map failures onto their own reporting surface.

mod analysis;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and the CLI.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
