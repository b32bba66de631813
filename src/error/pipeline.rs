// Pipeline error types and constants

use super::{ErrorCode, Status};
use log::error;
use std::fmt;

/// Pipeline error code constants
///
/// Error code range: 1001-1006
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// Unexpected internal failure
    pub const UNSPECIFIED: i32 = 1001;

    /// Argument violates the entry point contract
    pub const INVALID_ARGUMENT: i32 = 1002;

    /// Required data was empty
    pub const NULL_ARGUMENT: i32 = 1003;

    /// Requested result is not available yet
    pub const UNAVAILABLE: i32 = 1004;

    /// Operation is not supported by the loaded model
    pub const NOT_SUPPORTED: i32 = 1005;

    /// Buffer is not aligned for its element type
    pub const WRONG_MEM_ALIGNMENT: i32 = 1006;
}

/// Log a pipeline error with structured context
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    error!(
        "Pipeline error in {}: code={}, status={}, message={}",
        context,
        err.code(),
        err.status().as_i32(),
        err.message()
    );
}

/// Runtime errors returned by the feed / inference entry points
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Unexpected internal failure
    Unspecified { details: String },

    /// Argument violates the entry point contract
    InvalidArgument { reason: String },

    /// Required data was empty
    NullArgument { argument: &'static str },

    /// Requested result is not available yet
    Unavailable { what: &'static str },

    /// Operation is not supported by the loaded model
    NotSupported { operation: String },

    /// Buffer is not aligned for its element type
    WrongMemAlignment { buffer: &'static str },
}

impl PipelineError {
    /// Status code reported to the caller for this error
    pub fn status(&self) -> Status {
        match self {
            PipelineError::Unspecified { .. } => Status::UnspecifiedError,
            PipelineError::InvalidArgument { .. } => Status::InvalidArgument,
            PipelineError::NullArgument { .. } => Status::NullArgument,
            PipelineError::Unavailable { .. } => Status::Unavailable,
            PipelineError::NotSupported { .. } => Status::NotSupported,
            PipelineError::WrongMemAlignment { .. } => Status::WrongMemAlignment,
        }
    }
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Unspecified { .. } => PipelineErrorCodes::UNSPECIFIED,
            PipelineError::InvalidArgument { .. } => PipelineErrorCodes::INVALID_ARGUMENT,
            PipelineError::NullArgument { .. } => PipelineErrorCodes::NULL_ARGUMENT,
            PipelineError::Unavailable { .. } => PipelineErrorCodes::UNAVAILABLE,
            PipelineError::NotSupported { .. } => PipelineErrorCodes::NOT_SUPPORTED,
            PipelineError::WrongMemAlignment { .. } => PipelineErrorCodes::WRONG_MEM_ALIGNMENT,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Unspecified { details } => format!("Unspecified failure: {}", details),
            PipelineError::InvalidArgument { reason } => format!("Invalid argument: {}", reason),
            PipelineError::NullArgument { argument } => {
                format!("Argument '{}' must not be empty", argument)
            }
            PipelineError::Unavailable { what } => format!("{} is not available yet", what),
            PipelineError::NotSupported { operation } => {
                format!("Operation not supported: {}", operation)
            }
            PipelineError::WrongMemAlignment { buffer } => {
                format!("Buffer '{}' is not aligned for its element type", buffer)
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineError::{:?} (code {}): {}", self, self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_codes() {
        assert_eq!(
            PipelineError::Unspecified { details: String::new() }.code(),
            1001
        );
        assert_eq!(
            PipelineError::InvalidArgument { reason: String::new() }.code(),
            1002
        );
        assert_eq!(PipelineError::NullArgument { argument: "values" }.code(), 1003);
        assert_eq!(PipelineError::Unavailable { what: "window" }.code(), 1004);
        assert_eq!(
            PipelineError::NotSupported { operation: String::new() }.code(),
            1005
        );
        assert_eq!(PipelineError::WrongMemAlignment { buffer: "blob" }.code(), 1006);
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::NullArgument { argument: "values" };
        let text = format!("{}", err);
        assert!(text.contains("code 1003"));
        assert!(text.contains("values"));
    }
}
