// SPDX-License-Identifier: Apache-2.0

use std::{
    error,
    fmt::Display,
    io,
};

/// A convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the native security primitives behind a bound
/// security service (signing, certificate export).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// The primitive refused the input it was handed.
    Rejected(String),

    /// The primitive or the transport underneath it failed.
    Fault(String),

    /// The primitive answered, but with a buffer of the wrong size.
    UnexpectedLength {
        /// The size this layer requires.
        expected: usize,

        /// The size that was actually returned.
        actual: usize,
    },
}

impl error::Error for NativeError {}

impl Display for NativeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeError::Rejected(reason) => write!(f, "input rejected: {reason}"),
            NativeError::Fault(reason) => write!(f, "native fault: {reason}"),
            NativeError::UnexpectedLength { expected, actual } => write!(
                f,
                "unexpected response length: expected {expected} bytes, got {actual}"
            ),
        }
    }
}

/// Reasons a binder may refuse a bind request outright, before any
/// asynchronous completion is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The service provider package is not installed.
    NotInstalled,

    /// The platform refused to bind (missing permission, service not exported, ...).
    Refused(String),
}

impl error::Error for BindError {}

impl Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::NotInstalled => write!(f, "service provider is not installed"),
            BindError::Refused(reason) => write!(f, "bind refused: {reason}"),
        }
    }
}

/// Error conditions surfaced to callers of the security access layer.
#[derive(Debug)]
pub enum Error {
    /// Malformed input, detected before or by the native call.
    InvalidArgument {
        /// The native function that was (or would have been) called.
        function: &'static str,

        /// What was wrong with the input.
        reason: String,
    },

    /// The native primitive failed on well-formed input.
    NativeCallFailed {
        /// The native function that was called.
        function: &'static str,

        /// The underlying failure.
        cause: NativeError,
    },

    /// No eligible security service is connected. Carries the requested
    /// service name when the caller asked for a specific one.
    NotConnected(Option<String>),

    /// The named service is not part of the compiled registry.
    UnknownService(String),

    /// A certificate bundle could not be parsed.
    ParseFailure,

    /// The application-discovery lookup had no certificate for this app.
    AppNotFound(String),

    /// Something went wrong reading or writing a cached chain.
    IoError(io::Error),
}

impl Error {
    /// Surfaces a native failure, keeping "bad input" apart from
    /// "native fault".
    pub fn from_native(function: &'static str, cause: NativeError) -> Self {
        match cause {
            NativeError::Rejected(reason) => Error::InvalidArgument { function, reason },
            cause => Error::NativeCallFailed { function, cause },
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgument { function, reason } => {
                write!(f, "Error while calling native function {function}: {reason}")
            }
            Error::NativeCallFailed { function, cause } => {
                write!(f, "Native function {function} failed: {cause}")
            }
            Error::NotConnected(Some(service)) => {
                write!(f, "Security service {service} is not connected")
            }
            Error::NotConnected(None) => write!(f, "No security service is connected"),
            Error::UnknownService(service) => write!(f, "Unknown security service: {service}"),
            Error::ParseFailure => write!(f, "Unable to parse certificate bundle"),
            Error::AppNotFound(app) => write!(f, "No certificate found for app {app}"),
            Error::IoError(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::NativeCallFailed { cause, .. } => Some(cause),
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Error {
        Error::IoError(error)
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        let kind = match error {
            Error::IoError(e) => return e,
            Error::ParseFailure => io::ErrorKind::InvalidData,
            Error::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            Error::NotConnected(_) => io::ErrorKind::NotConnected,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, error.to_string())
    }
}
