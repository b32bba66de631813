// Setup error types and constants

use super::{ErrorCode, Status};
use log::error;
use std::fmt;

/// Setup error code constants
///
/// Error code range: 2001-2010
pub struct SetupErrorCodes {}

impl SetupErrorCodes {
    /// Window geometry is inconsistent
    pub const INVALID_WINDOW: i32 = 2001;

    /// A model table has the wrong length
    pub const TABLE_LENGTH: i32 = 2002;

    /// FFT length is not a power of two or outside the supported range
    pub const FFT_LENGTH: i32 = 2003;

    /// Declared feature count does not match the masks and arguments
    pub const FEATURE_COUNT_MISMATCH: i32 = 2004;

    /// A link points to a neuron that is not evaluated earlier
    pub const LINK_ORDER: i32 = 2005;

    /// A link or output index is out of range
    pub const INDEX_OUT_OF_RANGE: i32 = 2006;

    /// Binary blob is not aligned for its element type
    pub const BLOB_MISALIGNED: i32 = 2007;

    /// Task and outputs are inconsistent
    pub const TASK_MISMATCH: i32 = 2008;

    /// Feature argument is outside its valid domain
    pub const INVALID_ARGUMENT: i32 = 2009;

    /// Model descriptor could not be parsed
    pub const PARSE: i32 = 2010;
}

/// Log a setup error with structured context
pub fn log_setup_error(err: &SetupError, context: &str) {
    error!(
        "Setup error in {}: code={}, component=ModelSetup, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors detected while binding model data
///
/// These are fatal to initialisation and are never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// Window geometry is inconsistent
    InvalidWindow { reason: String },

    /// A model table has the wrong length
    TableLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// FFT length is not a power of two or outside the supported range
    FftLength { len: usize },

    /// Declared feature count does not match the masks and arguments
    FeatureCountMismatch { declared: usize, computed: usize },

    /// A link points to a neuron that is not evaluated earlier
    LinkOrder { neuron: usize, source: usize },

    /// A link or output index is out of range
    IndexOutOfRange {
        table: &'static str,
        index: usize,
        limit: usize,
    },

    /// Binary blob is not aligned for its element type
    BlobMisaligned { blob: String },

    /// Task and outputs are inconsistent
    TaskMismatch { reason: String },

    /// Feature argument is outside its valid domain
    InvalidArgument { feature: String, reason: String },

    /// Model descriptor could not be parsed
    Parse { reason: String },
}

impl SetupError {
    /// Status code reported to the caller for this error
    pub fn status(&self) -> Status {
        match self {
            SetupError::BlobMisaligned { .. } => Status::WrongMemAlignment,
            SetupError::FftLength { .. } => Status::NotSupported,
            SetupError::Parse { .. } => Status::UnspecifiedError,
            _ => Status::InvalidArgument,
        }
    }
}

impl ErrorCode for SetupError {
    fn code(&self) -> i32 {
        match self {
            SetupError::InvalidWindow { .. } => SetupErrorCodes::INVALID_WINDOW,
            SetupError::TableLength { .. } => SetupErrorCodes::TABLE_LENGTH,
            SetupError::FftLength { .. } => SetupErrorCodes::FFT_LENGTH,
            SetupError::FeatureCountMismatch { .. } => SetupErrorCodes::FEATURE_COUNT_MISMATCH,
            SetupError::LinkOrder { .. } => SetupErrorCodes::LINK_ORDER,
            SetupError::IndexOutOfRange { .. } => SetupErrorCodes::INDEX_OUT_OF_RANGE,
            SetupError::BlobMisaligned { .. } => SetupErrorCodes::BLOB_MISALIGNED,
            SetupError::TaskMismatch { .. } => SetupErrorCodes::TASK_MISMATCH,
            SetupError::InvalidArgument { .. } => SetupErrorCodes::INVALID_ARGUMENT,
            SetupError::Parse { .. } => SetupErrorCodes::PARSE,
        }
    }

    fn message(&self) -> String {
        match self {
            SetupError::InvalidWindow { reason } => format!("Invalid window geometry: {}", reason),
            SetupError::TableLength {
                table,
                expected,
                actual,
            } => format!(
                "Table '{}' has {} entries, expected {}",
                table, actual, expected
            ),
            SetupError::FftLength { len } => format!(
                "FFT length {} is not a supported power of two",
                len
            ),
            SetupError::FeatureCountMismatch { declared, computed } => format!(
                "Model declares {} extracted features but masks produce {}",
                declared, computed
            ),
            SetupError::LinkOrder { neuron, source } => format!(
                "Neuron {} reads neuron {} which is not evaluated before it",
                neuron, source
            ),
            SetupError::IndexOutOfRange {
                table,
                index,
                limit,
            } => format!(
                "Index {} in '{}' is out of range (limit {})",
                index, table, limit
            ),
            SetupError::BlobMisaligned { blob } => {
                format!("Blob '{}' is misaligned or has a partial element", blob)
            }
            SetupError::TaskMismatch { reason } => format!("Task mismatch: {}", reason),
            SetupError::InvalidArgument { feature, reason } => {
                format!("Invalid argument for {}: {}", feature, reason)
            }
            SetupError::Parse { reason } => format!("Failed to parse model: {}", reason),
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetupError::{:?} (code {}): {}", self, self.code(), self.message())
    }
}

impl std::error::Error for SetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_codes_in_range() {
        let errors = vec![
            SetupError::InvalidWindow { reason: String::new() },
            SetupError::TableLength {
                table: "links",
                expected: 1,
                actual: 0,
            },
            SetupError::FftLength { len: 100 },
            SetupError::FeatureCountMismatch {
                declared: 3,
                computed: 4,
            },
            SetupError::LinkOrder {
                neuron: 1,
                source: 2,
            },
            SetupError::IndexOutOfRange {
                table: "outputs",
                index: 9,
                limit: 3,
            },
            SetupError::BlobMisaligned { blob: "weights".to_string() },
            SetupError::TaskMismatch { reason: String::new() },
            SetupError::InvalidArgument {
                feature: "AUTOCORR".to_string(),
                reason: String::new(),
            },
            SetupError::Parse { reason: String::new() },
        ];

        for err in errors {
            assert!((2001..=2010).contains(&err.code()), "{}", err);
        }
    }

    #[test]
    fn test_fft_length_is_not_supported_status() {
        let err = SetupError::FftLength { len: 100 };
        assert_eq!(err.status(), Status::NotSupported);
        assert!(err.message().contains("100"));
    }
}
