//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Protocol-level error codes exchanged with the host.
///
/// These travel through [`crate::ResponseOutparam::set`] and out of
/// [`crate::Host::fetch`], mirroring the `wasi:http` `error-code` variants the
/// handler can encounter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// DNS lookup timed out.
    #[error("DNS timeout")]
    DnsTimeout,

    /// DNS lookup failed.
    #[error("DNS error (rcode: {rcode:?}, info code: {info_code:?})")]
    DnsError {
        /// DNS response code, e.g. `NXDOMAIN`.
        rcode: Option<String>,
        /// Extended DNS error code.
        info_code: Option<u16>,
    },

    /// No route to the destination.
    #[error("destination not found")]
    DestinationNotFound,

    /// The destination exists but is not reachable.
    #[error("destination unavailable")]
    DestinationUnavailable,

    /// The peer refused the connection.
    #[error("connection refused")]
    ConnectionRefused,

    /// Connecting to the peer timed out.
    #[error("connection timeout")]
    ConnectionTimeout,

    /// The request URI could not be built.
    #[error("invalid request URI")]
    HttpRequestUriInvalid,

    /// The response (or its body) was not completed.
    #[error("incomplete response")]
    HttpResponseIncomplete,

    /// The response body did not match its declared size.
    #[error("response body size mismatch (expected: {0:?})")]
    HttpResponseBodySize(Option<u64>),

    /// Any other failure.
    #[error("internal error: {}", .0.as_deref().unwrap_or("unspecified"))]
    InternalError(Option<String>),
}

/// Errors raised by the outgoing body and its sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    /// `OutgoingResponse::body` was called more than once.
    #[error("response body has already been taken")]
    BodyAlreadyTaken,

    /// `OutgoingBody::write` was called more than once.
    #[error("body output stream has already been taken")]
    StreamAlreadyTaken,

    /// The body was finished or aborted.
    #[error("body is closed")]
    Closed,

    /// A write would overrun the declared `Content-Length`.
    #[error("write of {attempted} bytes exceeds declared content length {limit}")]
    ContentLengthExceeded {
        /// Declared `Content-Length`.
        limit: u64,
        /// Total bytes the write would have produced.
        attempted: u64,
    },

    /// The body was finished short of its declared `Content-Length`.
    #[error("body finished with {written} of {limit} declared bytes")]
    ContentLengthMismatch {
        /// Declared `Content-Length`.
        limit: u64,
        /// Bytes actually written.
        written: u64,
    },
}

/// Failures while preparing a response inside the handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Writing or finishing the response body failed.
    #[error("body write failed: {0}")]
    BodyWrite(#[from] BodyError),

    /// The status code is outside `100..=999`.
    #[error("invalid status code: {0}")]
    InvalidStatus(u16),
}

impl From<Error> for ErrorCode {
    fn from(err: Error) -> Self {
        match err {
            Error::BodyWrite(
                BodyError::ContentLengthExceeded { limit, .. }
                | BodyError::ContentLengthMismatch { limit, .. },
            ) => {
                Self::HttpResponseBodySize(Some(limit))
            }
            Error::BodyWrite(e) => Self::InternalError(Some(e.to_string())),
            Error::InvalidStatus(code) => {
                Self::InternalError(Some(format!("invalid status code: {code}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::BodyWrite(BodyError::Closed);
        assert_eq!(err.to_string(), "body write failed: body is closed");

        let code = ErrorCode::InternalError(None);
        assert_eq!(code.to_string(), "internal error: unspecified");
    }

    #[test]
    fn size_errors_map_to_body_size() {
        let err = Error::from(BodyError::ContentLengthMismatch { limit: 13, written: 5 });
        assert_eq!(ErrorCode::from(err), ErrorCode::HttpResponseBodySize(Some(13)));
    }

    #[test]
    fn invalid_status_is_internal() {
        let code = ErrorCode::from(Error::InvalidStatus(42));
        assert_eq!(code, ErrorCode::InternalError(Some("invalid status code: 42".to_string())));
    }
}
