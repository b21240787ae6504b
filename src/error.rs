//! Unified error types for webservice.
//!
//! This module provides a single error type [`Error`] covering every failure a
//! caller can observe, whichever calling convention they use:
//! - Request materialization errors (malformed URL, illegal header values)
//! - Response validation errors (status, content type, empty body)
//! - Transport errors reported by the [`Session`](crate::Session)
//! - Transform errors (JSON decoding)
//! - Multipart encoding errors, grouped under [`MultipartError`]

use std::{error::Error as StdError, path::PathBuf};

use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for all webservice operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request URL could not be built from the base string and query items.
    #[error("bad URL: {0}")]
    BadUrl(String),

    /// Request construction error (illegal header name or value, unencodable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response was not a well-formed HTTP response for the validation asked of it.
    ///
    /// Raised when an allow-list of content types is required but the response
    /// carries no `Content-Type` header.
    #[error("bad server response")]
    BadResponse,

    /// The response status code is outside the acceptable range.
    #[error("unacceptable status code {status}")]
    Status {
        /// Offending status code
        status: StatusCode,
    },

    /// The response content type is not in the allow-list.
    #[error("content type {content_type:?} rejected")]
    ContentTypeRejected {
        /// Content type sent by the server
        content_type: String,
    },

    /// The response body is empty.
    #[error("zero byte resource")]
    ZeroByteResource,

    /// Network transport error reported by the session.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The request was cancelled before completing.
    #[error("request cancelled")]
    Cancelled,

    /// The response body could not be decoded by the transform.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Multipart form encoding error.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// I/O error (reading an upload file, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Multipart form encoding errors.
///
/// Every file check done before a part is appended has its own variant so
/// callers can tell a directory from a missing file from a permission problem.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The URL does not point to a local file.
    #[error("not a file URL: {0}")]
    InvalidUrl(Url),

    /// The path has no usable file name or extension.
    #[error("invalid file name: {}", .0.display())]
    InvalidFilename(PathBuf),

    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf, #[source] std::io::Error),

    /// The output file already exists.
    #[error("file already exists: {}", .0.display())]
    FileAlreadyExists(PathBuf),

    /// The file exists but cannot be accessed.
    #[error("access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    /// The path points to a directory.
    #[error("path is a directory: {}", .0.display())]
    FileIsDirectory(PathBuf),

    /// The file size could not be read.
    #[error("file size not available: {}", .0.display())]
    FileSizeNotAvailable(PathBuf),

    /// The input or output stream could not be opened.
    #[error("failed to create stream for {}", .0.display())]
    StreamCreation(PathBuf, #[source] std::io::Error),

    /// Writing to the output sink failed.
    #[error("failed to write output stream: {0}")]
    OutputStreamWriteFailed(#[source] std::io::Error),

    /// Reading a part's input stream failed.
    #[error("failed to read input stream: {0}")]
    InputStreamReadFailed(#[source] std::io::Error),

    /// A part's stream yielded a different number of bytes than declared.
    #[error("expected body content length {expected}, read {actual}")]
    InputStreamLength {
        /// Length declared when the part was appended
        expected: u64,
        /// Bytes actually read from the stream
        actual: u64,
    },
}

impl Error {
    /// Wrap any transport failure.
    pub fn transport(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Transport(err.into())
    }

    /// Check if this is a network transport error.
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }

    /// Check if this error carries an unacceptable status code.
    pub const fn is_status_error(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Check if the request was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a response validation error.
    pub const fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::BadResponse
                | Self::Status { .. }
                | Self::ContentTypeRejected { .. }
                | Self::ZeroByteResource
        )
    }

    /// Get the offending status code (if this is a status error).
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category/kind.
    ///
    /// Useful for logging.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadUrl(_) | Self::InvalidRequest(_) => ErrorKind::Request,
            Self::BadResponse => ErrorKind::BadResponse,
            Self::Status { .. } => ErrorKind::Status,
            Self::ContentTypeRejected { .. } => ErrorKind::ContentType,
            Self::ZeroByteResource => ErrorKind::EmptyBody,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Multipart(_) => ErrorKind::Multipart,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Error category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request construction error
    Request,
    /// Malformed response
    BadResponse,
    /// Status code out of range
    Status,
    /// Content type rejected
    ContentType,
    /// Empty response body
    EmptyBody,
    /// Transport/network error
    Transport,
    /// Timeout error
    Timeout,
    /// Cancellation
    Cancelled,
    /// Transform/decoding error
    Decode,
    /// Multipart encoding error
    Multipart,
    /// I/O error
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::BadResponse => write!(f, "bad_response"),
            Self::Status => write!(f, "status"),
            Self::ContentType => write!(f, "content_type"),
            Self::EmptyBody => write!(f, "empty_body"),
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Decode => write!(f, "decode"),
            Self::Multipart => write!(f, "multipart"),
            Self::Io => write!(f, "io"),
        }
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::BadUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_exposes_code() {
        let err = Error::Status {
            status: StatusCode::UNAUTHORIZED,
        };
        assert!(err.is_status_error());
        assert!(err.is_validation_error());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.kind(), ErrorKind::Status);
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn multipart_errors_convert() {
        let err: Error = MultipartError::InputStreamLength {
            expected: 4,
            actual: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Multipart);
        assert_eq!(err.kind().to_string(), "multipart");
        assert!(err.to_string().contains("expected body content length 4"));
    }

    #[test]
    fn url_parse_errors_are_bad_url() {
        let err: Error = Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::BadUrl(_)));
        assert!(!err.is_network_error());
    }
}
