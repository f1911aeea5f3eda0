//! Error types for the idatest harness

use std::fmt;
use thiserror::Error;

/// Script-style error kinds raised by the value model and by test code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// TypeError - wrong type for operation
    TypeError,
    /// ReferenceError - missing binding
    ReferenceError,
    /// RangeError - value out of range
    RangeError,
    /// Generic Error - user-thrown errors
    GenericError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::ReferenceError => write!(f, "ReferenceError"),
            ErrorKind::RangeError => write!(f, "RangeError"),
            ErrorKind::GenericError => write!(f, "Error"),
        }
    }
}

/// Main error type for idatest
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid registration arguments, raised at declaration time
    #[error("ConfigurationError: {0}")]
    Configuration(String),

    /// The assertion façade was asked for a method it does not have
    #[error("UnknownAssertion: Unknown assertion method: {0}")]
    UnknownAssertion(String),

    /// Script-style runtime error (TypeError, RangeError, ...)
    #[error("{kind}: {message}")]
    Runtime { kind: ErrorKind, message: String },

    /// `wait_for` gave up before its condition held
    #[error("WaitTimeout: Condition not met within {timeout_ms}ms")]
    WaitTimeout { timeout_ms: u64 },

    /// Config file could not be parsed
    #[error("ConfigError: {0}")]
    Config(String),

    /// IO error
    #[error("IOError: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a ConfigurationError
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Create a TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::Runtime {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Create a ReferenceError
    pub fn reference_error(message: impl Into<String>) -> Self {
        Error::Runtime {
            kind: ErrorKind::ReferenceError,
            message: message.into(),
        }
    }

    /// Create a RangeError
    pub fn range_error(message: impl Into<String>) -> Self {
        Error::Runtime {
            kind: ErrorKind::RangeError,
            message: message.into(),
        }
    }

    /// Create a plain `Error`, the kind a test body throws on purpose
    pub fn thrown(message: impl Into<String>) -> Self {
        Error::Runtime {
            kind: ErrorKind::GenericError,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type alias for idatest
pub type Result<T> = std::result::Result<T, Error>;

/// Error message templates shared by the value model and the harness
pub mod messages {
    pub const NOT_A_FUNCTION: &str = "is not a function";
    pub const CANNOT_READ_PROPERTY: &str = "Cannot read property";
    pub const CANNOT_SET_PROPERTY: &str = "Cannot set property";

    /// Format a "X is not a function" error message
    pub fn not_a_function(name: &str) -> String {
        format!("'{}' {}", name, NOT_A_FUNCTION)
    }

    /// Format a "Cannot read property 'X' of Y" error message
    pub fn cannot_read_property(prop: &str, of: &str) -> String {
        format!("{} '{}' of {}", CANNOT_READ_PROPERTY, prop, of)
    }

    /// Format a "Cannot set property 'X' of Y" error message
    pub fn cannot_set_property(prop: &str, of: &str) -> String {
        format!("{} '{}' of {}", CANNOT_SET_PROPERTY, prop, of)
    }

    /// Format a "X must be Y" error message
    pub fn must_be(what: &str, requirement: &str) -> String {
        format!("{} must be {}", what, requirement)
    }
}
