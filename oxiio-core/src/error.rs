//! Error types for OxiIO operations.
//!
//! One error type covers every layer of the stack: usage errors, stream-state
//! errors, encoding errors, end of stream for operations that must produce
//! data, and the consistency violations that indicate a broken [`Source`]
//! implementation.
//!
//! Would-block and interruption are *not* errors; they travel as values of
//! [`Signal`] and [`Outcome`].
//!
//! [`Source`]: crate::source::Source
//! [`Signal`]: crate::signal::Signal
//! [`Outcome`]: crate::signal::Outcome

use std::io;
use thiserror::Error;

/// The main error type for OxiIO operations.
#[derive(Debug, Error)]
pub enum OxiIoError {
    /// I/O error reported by an adapter wrapping a `std::io` object.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream (or source) is closed.
    #[error("closed stream")]
    Closed,

    /// A half of the stream was closed twice.
    #[error("{half} half already closed")]
    AlreadyClosed {
        /// Which half: `"read"` or `"write"`.
        half: &'static str,
    },

    /// The stream is not open for reading.
    #[error("not opened for reading")]
    NotReadable,

    /// The stream is not open for writing.
    #[error("not opened for writing")]
    NotWritable,

    /// An unbuffered operation would bypass buffered data.
    #[error("{operation} with buffered data pending")]
    BufferedDataPending {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The source does not implement an optional capability.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// The capability that was requested.
        operation: &'static str,
    },

    /// The source cannot be repositioned.
    #[error("illegal seek")]
    IllegalSeek,

    /// An argument was out of range.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// End of stream reached by an operation that must produce data.
    #[error("end of stream reached")]
    EndOfStream,

    /// A blocking wait elapsed without the source becoming ready.
    #[error("timed out waiting for the source to become {interest}")]
    TimedOut {
        /// `"readable"` or `"writable"`.
        interest: &'static str,
    },

    /// A buffer has no room for the requested operation.
    #[error("insufficient buffer space: need {needed} bytes, have {available}")]
    InsufficientBuffer {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A refill succeeded but added no bytes.
    #[error("no bytes read")]
    NoBytesRead,

    /// A source returned a value outside its contract.
    #[error("unexpected result from source: {message}")]
    UnexpectedResult {
        /// Description of the violation.
        message: String,
    },

    /// Input bytes are not valid in the source encoding.
    #[error("invalid byte sequence in {encoding}: {bytes:02x?}")]
    InvalidByteSequence {
        /// The offending bytes.
        bytes: Vec<u8>,
        /// Name of the encoding being decoded.
        encoding: &'static str,
    },

    /// A character cannot be represented in the target encoding.
    #[error("undefined conversion of {character:?} into {encoding}")]
    UndefinedConversion {
        /// The unrepresentable character.
        character: char,
        /// Name of the target encoding.
        encoding: &'static str,
    },
}

/// Result type alias for OxiIO operations.
pub type Result<T> = std::result::Result<T, OxiIoError>;

impl OxiIoError {
    /// Create an already-closed error for the given half.
    pub fn already_closed(half: &'static str) -> Self {
        Self::AlreadyClosed { half }
    }

    /// Create a buffered-data-pending error.
    pub fn buffered_data_pending(operation: &'static str) -> Self {
        Self::BufferedDataPending { operation }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timed_out(interest: &'static str) -> Self {
        Self::TimedOut { interest }
    }

    /// Create an insufficient buffer error.
    pub fn insufficient_buffer(needed: usize, available: usize) -> Self {
        Self::InsufficientBuffer { needed, available }
    }

    /// Create an unexpected result error.
    pub fn unexpected_result(message: impl Into<String>) -> Self {
        Self::UnexpectedResult {
            message: message.into(),
        }
    }

    /// Create an invalid byte sequence error.
    pub fn invalid_byte_sequence(bytes: impl Into<Vec<u8>>, encoding: &'static str) -> Self {
        Self::InvalidByteSequence {
            bytes: bytes.into(),
            encoding,
        }
    }

    /// Create an undefined conversion error.
    pub fn undefined_conversion(character: char, encoding: &'static str) -> Self {
        Self::UndefinedConversion {
            character,
            encoding,
        }
    }

    /// Whether this error indicates a broken source implementation.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Self::NoBytesRead | Self::UnexpectedResult { .. })
    }
}

impl From<OxiIoError> for io::Error {
    fn from(err: OxiIoError) -> Self {
        let kind = match &err {
            OxiIoError::Io(inner) => return io::Error::new(inner.kind(), err.to_string()),
            OxiIoError::Closed | OxiIoError::AlreadyClosed { .. } => io::ErrorKind::NotConnected,
            OxiIoError::NotReadable | OxiIoError::NotWritable => io::ErrorKind::PermissionDenied,
            OxiIoError::Unsupported { .. } | OxiIoError::IllegalSeek => io::ErrorKind::Unsupported,
            OxiIoError::InvalidArgument { .. } | OxiIoError::BufferedDataPending { .. } => {
                io::ErrorKind::InvalidInput
            }
            OxiIoError::EndOfStream => io::ErrorKind::UnexpectedEof,
            OxiIoError::TimedOut { .. } => io::ErrorKind::TimedOut,
            OxiIoError::InsufficientBuffer { .. } => io::ErrorKind::OutOfMemory,
            OxiIoError::InvalidByteSequence { .. } | OxiIoError::UndefinedConversion { .. } => {
                io::ErrorKind::InvalidData
            }
            OxiIoError::NoBytesRead | OxiIoError::UnexpectedResult { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiIoError::unsupported("fileno");
        assert_eq!(err.to_string(), "unsupported operation: fileno");

        let err = OxiIoError::insufficient_buffer(10, 4);
        assert!(err.to_string().contains("need 10 bytes, have 4"));

        let err = OxiIoError::invalid_byte_sequence(vec![0xFF], "UTF-8");
        assert!(err.to_string().contains("ff"));
        assert!(err.to_string().contains("UTF-8"));

        assert_eq!(OxiIoError::Closed.to_string(), "closed stream");
        assert_eq!(
            OxiIoError::already_closed("read").to_string(),
            "read half already closed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiIoError = io_err.into();
        assert!(matches!(err, OxiIoError::Io(_)));
    }

    #[test]
    fn test_into_io_error_kind() {
        let err: io::Error = OxiIoError::EndOfStream.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = OxiIoError::undefined_conversion('€', "ISO-8859-2").into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = OxiIoError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_consistency_violation() {
        assert!(OxiIoError::NoBytesRead.is_consistency_violation());
        assert!(OxiIoError::unexpected_result("x").is_consistency_violation());
        assert!(!OxiIoError::Closed.is_consistency_violation());
    }
}
