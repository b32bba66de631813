// Error types for the gesture inference engine
//
// This module defines the status codes returned by the public entry points and
// the two error families behind them: runtime pipeline errors (caller contract
// violations) and setup errors (malformed model or configuration data).

mod pipeline;
mod setup;

pub use pipeline::{log_pipeline_error, PipelineError, PipelineErrorCodes};
pub use setup::{log_setup_error, SetupError, SetupErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Status codes shared by every public entry point
///
/// The numeric values are part of the external contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Operation accepted, more input is needed before a result exists
    InProgress = 126,
    Success = 0,
    UnspecifiedError = -1,
    InvalidArgument = -2,
    NullArgument = -3,
    Unavailable = -4,
    NotSupported = -5,
    WrongMemAlignment = -6,
}

impl Status {
    /// Numeric value of the status
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a raw status value back to the enum
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            126 => Some(Status::InProgress),
            0 => Some(Status::Success),
            -1 => Some(Status::UnspecifiedError),
            -2 => Some(Status::InvalidArgument),
            -3 => Some(Status::NullArgument),
            -4 => Some(Status::Unavailable),
            -5 => Some(Status::NotSupported),
            -6 => Some(Status::WrongMemAlignment),
            _ => None,
        }
    }

    /// True for `Success` and `InProgress`
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Success | Status::InProgress)
    }
}
