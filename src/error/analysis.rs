// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// These constants provide a single source of truth for error codes used
/// when bucketing extraction failures.
///
/// Error code range: 2001-2003
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Sample frame was empty (zero-length input)
    pub const EMPTY_FRAME: i32 = 2001;

    /// Input channel layout cannot be down-mixed
    pub const UNSUPPORTED_CHANNEL_LAYOUT: i32 = 2002;

    /// Decoding the source audio failed
    pub const DECODE_FAILED: i32 = 2003;
}

/// Log an analysis error with structured context
///
/// Logs with the error code, the failing component, and the caller-supplied
/// context string. Non-blocking and never panics.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Analysis-related errors
///
/// These cover input-shape failures on the extraction path and decode
/// failures propagated from the file-loading adapter. Numerical
/// degeneracies (zero energy, zero spread, empty history) are NOT errors;
/// each formula has an explicit fallback value instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Sample frame was empty; the extractor refuses to fabricate data
    EmptyFrame,

    /// Channel layout cannot be down-mixed (zero channels)
    UnsupportedChannelLayout { channels: u16 },

    /// Decoding the source audio failed; propagated unchanged from the
    /// decoder, retry policy belongs to the caller
    DecodeFailed { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::EmptyFrame => AnalysisErrorCodes::EMPTY_FRAME,
            AnalysisError::UnsupportedChannelLayout { .. } => {
                AnalysisErrorCodes::UNSUPPORTED_CHANNEL_LAYOUT
            }
            AnalysisError::DecodeFailed { .. } => AnalysisErrorCodes::DECODE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::EmptyFrame => {
                "Sample frame is empty; supply at least one sample".to_string()
            }
            AnalysisError::UnsupportedChannelLayout { channels } => {
                format!("Cannot down-mix a {}-channel layout", channels)
            }
            AnalysisError::DecodeFailed { reason } => {
                format!("Audio decode failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        AnalysisError::DecodeFailed {
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
            AnalysisError::EmptyFrame.code(),
            AnalysisErrorCodes::EMPTY_FRAME
        );
        assert_eq!(
            AnalysisError::UnsupportedChannelLayout { channels: 0 }.code(),
            AnalysisErrorCodes::UNSUPPORTED_CHANNEL_LAYOUT
        );
        assert_eq!(
            AnalysisError::DecodeFailed {
                reason: "test".to_string()
            }
            .code(),
            AnalysisErrorCodes::DECODE_FAILED
        );
    }

    #[test]
    fn test_analysis_error_messages() {
        let err = AnalysisError::EmptyFrame;
        assert!(err.message().contains("empty"));

        let err = AnalysisError::UnsupportedChannelLayout { channels: 0 };
        assert!(err.message().contains("0-channel"));

        let err = AnalysisError::DecodeFailed {
            reason: "truncated header".to_string(),
        };
        assert_eq!(err.message(), "Audio decode failed: truncated header");
    }

    #[test]
    fn test_analysis_error_display() {
        let err = AnalysisError::EmptyFrame;
        let display = format!("{}", err);
        assert!(display.contains("AnalysisError"));
        assert!(display.contains("2001"));
    }
}
