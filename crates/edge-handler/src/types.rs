//! # Host Object Model
//!
//! Move-only values for the requests and responses exchanged with the host.
//! None of the request or response types implement `Clone`: each is handed to
//! exactly one consumer.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::uri::{PathAndQuery, Scheme, Uri};
use http::{HeaderMap, Method, StatusCode};

use crate::body::{OutgoingBody, Payload, Phase, SharedPayload};
use crate::error::{BodyError, Error, ErrorCode, Result};

/// Ordered multimap of header names to values.
pub type Fields = HeaderMap;

/// A request received from the host.
#[derive(Debug)]
pub struct IncomingRequest {
    method: Method,
    scheme: Option<Scheme>,
    authority: Option<String>,
    path_with_query: Option<String>,
    headers: Fields,
}

impl IncomingRequest {
    /// The request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request scheme, when the host supplied one.
    #[must_use]
    pub const fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    /// The request authority, when the host supplied one.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The request path and query, when the host supplied one.
    #[must_use]
    pub fn path_with_query(&self) -> Option<&str> {
        self.path_with_query.as_deref()
    }

    /// A copy of the request headers.
    ///
    /// The request itself is left untouched.
    #[must_use]
    pub fn headers(&self) -> Fields {
        self.headers.clone()
    }
}

impl<B> From<http::Request<B>> for IncomingRequest {
    fn from(request: http::Request<B>) -> Self {
        let (parts, _body) = request.into_parts();
        let uri = parts.uri;

        Self {
            method: parts.method,
            scheme: uri.scheme().cloned(),
            authority: uri.authority().map(ToString::to_string),
            path_with_query: uri.path_and_query().map(ToString::to_string),
            headers: parts.headers,
        }
    }
}

/// Per-request transport options. Unset values fall back to host defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Timeout for establishing the connection.
    pub connect_timeout: Option<Duration>,

    /// Timeout for receiving the first byte of the response.
    pub first_byte_timeout: Option<Duration>,

    /// Timeout between consecutive bytes of the response body.
    pub between_bytes_timeout: Option<Duration>,
}

/// A request to be sent by the host on the handler's behalf.
#[derive(Debug)]
pub struct OutgoingRequest {
    method: Method,
    scheme: Option<Scheme>,
    authority: Option<String>,
    path_with_query: Option<String>,
    headers: Fields,
    body: Option<Bytes>,
}

impl OutgoingRequest {
    /// Create a `GET` request with the given headers and no body.
    ///
    /// Scheme, authority and path are left unset for the host to default.
    #[must_use]
    pub const fn new(headers: Fields) -> Self {
        Self {
            method: Method::GET,
            scheme: None,
            authority: None,
            path_with_query: None,
            headers,
            body: None,
        }
    }

    /// The request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Set the request method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The request scheme, if set.
    #[must_use]
    pub const fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    /// Set the request scheme.
    pub fn set_scheme(&mut self, scheme: Option<Scheme>) {
        self.scheme = scheme;
    }

    /// The request authority, if set.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Set the request authority.
    pub fn set_authority(&mut self, authority: Option<String>) {
        self.authority = authority;
    }

    /// The request path and query, if set.
    #[must_use]
    pub fn path_with_query(&self) -> Option<&str> {
        self.path_with_query.as_deref()
    }

    /// Set the request path and query.
    pub fn set_path_with_query(&mut self, path_with_query: Option<String>) {
        self.path_with_query = path_with_query;
    }

    /// The request headers.
    #[must_use]
    pub const fn headers(&self) -> &Fields {
        &self.headers
    }

    /// The request body, if one was attached.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Attach a body to the request.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Convert into an [`http::Request`], defaulting the path to `/`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::HttpRequestUriInvalid`] if the scheme, authority
    /// and path do not form a valid URI.
    pub fn into_http(self) -> Result<http::Request<Bytes>, ErrorCode> {
        let mut uri = Uri::builder();
        if let Some(scheme) = self.scheme {
            uri = uri.scheme(scheme);
        }
        if let Some(authority) = self.authority {
            uri = uri.authority(authority.as_str());
        }
        let path = match self.path_with_query {
            Some(p) => {
                PathAndQuery::try_from(p.as_str()).map_err(|e| {
                    tracing::debug!("invalid path: {e}");
                    ErrorCode::HttpRequestUriInvalid
                })?
            }
            None => PathAndQuery::from_static("/"),
        };
        let uri = uri.path_and_query(path).build().map_err(|e| {
            tracing::debug!("invalid uri: {e}");
            ErrorCode::HttpRequestUriInvalid
        })?;

        let mut request = http::Request::new(self.body.unwrap_or_default());
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;

        Ok(request)
    }
}

/// The response to an outbound fetch, with its body collected.
#[derive(Debug)]
pub struct IncomingResponse {
    /// Response status.
    pub status: StatusCode,

    /// Response headers.
    pub headers: Fields,

    /// Response body.
    pub body: Bytes,
}

impl<B: Into<Bytes>> From<http::Response<B>> for IncomingResponse {
    fn from(response: http::Response<B>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body: body.into(),
        }
    }
}

/// A response under construction, delivered through
/// [`crate::ResponseOutparam`].
pub struct OutgoingResponse {
    status: StatusCode,
    headers: Fields,
    payload: SharedPayload,
    body_taken: bool,
}

impl Debug for OutgoingResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_taken", &self.body_taken)
            .finish_non_exhaustive()
    }
}

impl OutgoingResponse {
    /// Create a `200 OK` response with the given headers.
    ///
    /// A `Content-Length` header, when present and valid, bounds the body.
    #[must_use]
    pub fn new(headers: Fields) -> Self {
        let limit = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            status: StatusCode::OK,
            headers,
            payload: Payload::shared(limit),
            body_taken: false,
        }
    }

    /// The response status.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set the response status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStatus`] if `code` is not a valid status code.
    pub fn set_status_code(&mut self, code: u16) -> Result<()> {
        self.status = StatusCode::from_u16(code).map_err(|e| {
            tracing::debug!("rejecting status {code}: {e}");
            Error::InvalidStatus(code)
        })?;
        Ok(())
    }

    /// The response headers.
    #[must_use]
    pub const fn headers(&self) -> &Fields {
        &self.headers
    }

    /// Take the response body for writing.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::BodyAlreadyTaken`] on every call after the first.
    pub fn body(&mut self) -> Result<OutgoingBody, BodyError> {
        if self.body_taken {
            return Err(BodyError::BodyAlreadyTaken);
        }
        self.body_taken = true;
        Ok(OutgoingBody::new(SharedPayload::clone(&self.payload)))
    }

    /// Whether the response can be delivered: its body was either never
    /// taken or has been finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.body_taken || self.payload.lock().phase() == Phase::Finished
    }

    /// Convert into an [`http::Response`] carrying the finished payload.
    ///
    /// Trailers are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::HttpResponseIncomplete`] if the body was taken but
    /// not finished.
    pub fn into_http(self) -> Result<http::Response<Bytes>, ErrorCode> {
        if !self.is_complete() {
            return Err(ErrorCode::HttpResponseIncomplete);
        }

        let (body, _trailers) = self.payload.lock().take();
        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn incoming_from_http() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("https://example.com/x?y=1")
            .header("x-test", "1")
            .body(())
            .expect("should build request");
        let incoming = IncomingRequest::from(request);

        assert_eq!(incoming.method(), Method::POST);
        assert_eq!(incoming.scheme(), Some(&Scheme::HTTPS));
        assert_eq!(incoming.authority(), Some("example.com"));
        assert_eq!(incoming.path_with_query(), Some("/x?y=1"));
        assert_eq!(incoming.headers().get("x-test"), Some(&HeaderValue::from_static("1")));
    }

    #[test]
    fn outgoing_request_defaults() {
        let request = OutgoingRequest::new(Fields::new());

        assert_eq!(request.method(), Method::GET);
        assert!(request.scheme().is_none());
        assert!(request.authority().is_none());
        assert!(request.path_with_query().is_none());
        assert!(request.body().is_none());

        let http_req = request.into_http().expect("should convert");
        assert_eq!(http_req.uri(), "/");
        assert!(http_req.body().is_empty());
    }

    #[test]
    fn outgoing_request_full_uri() {
        let mut request = OutgoingRequest::new(Fields::new());
        request.set_scheme(Some(Scheme::HTTPS));
        request.set_authority(Some("example.com".to_string()));
        request.set_path_with_query(Some("/x".to_string()));

        let http_req = request.into_http().expect("should convert");
        assert_eq!(http_req.uri(), "https://example.com/x");
    }

    #[test]
    fn outgoing_request_rejects_scheme_without_authority() {
        let mut request = OutgoingRequest::new(Fields::new());
        request.set_scheme(Some(Scheme::HTTP));

        let Err(err) = request.into_http() else {
            panic!("expected invalid uri");
        };
        assert_eq!(err, ErrorCode::HttpRequestUriInvalid);
    }

    #[test]
    fn response_status_validation() {
        let mut response = OutgoingResponse::new(Fields::new());
        assert_eq!(response.status_code(), StatusCode::OK);

        response.set_status_code(404).expect("should accept 404");
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let Err(err) = response.set_status_code(42) else {
            panic!("expected 42 to be rejected");
        };
        assert_eq!(err, Error::InvalidStatus(42));
    }

    #[test]
    fn untouched_body_is_complete() {
        let response = OutgoingResponse::new(Fields::new());
        assert!(response.is_complete());

        let http_resp = response.into_http().expect("should convert");
        assert!(http_resp.body().is_empty());
    }

    #[test]
    fn open_body_is_incomplete() {
        let mut response = OutgoingResponse::new(Fields::new());
        let body = response.body().expect("should take body");
        assert!(!response.is_complete());

        body.finish(None).expect("should finish");
        assert!(response.is_complete());
        assert!(matches!(response.body(), Err(BodyError::BodyAlreadyTaken)));
    }

    #[test]
    fn content_length_bounds_body() {
        let mut headers = Fields::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2"));
        let mut response = OutgoingResponse::new(headers);

        let mut body = response.body().expect("should take body");
        let result = body.write().expect("should take stream").write(b"abc");
        assert!(matches!(result, Err(BodyError::ContentLengthExceeded { .. })));
    }
}
