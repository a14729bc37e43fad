//! # Edge Handler
//!
//! Entry point invoked by the host once per inbound request.

use tracing::instrument;

use crate::error::{ErrorCode, Result};
use crate::outparam::ResponseOutparam;
use crate::traits::{FutureIncomingResponse, Host, Task};
use crate::types::{Fields, IncomingRequest, OutgoingRequest, OutgoingResponse};

/// Fixed payload of every response.
pub const GREETING: &[u8] = b"Hello, World!";

/// Answers every inbound request with `200 Hello, World!` after issuing one
/// fire-and-forget outbound fetch carrying the inbound headers.
///
/// The handler keeps no state between invocations; concurrency is entirely
/// the host's concern.
#[derive(Debug)]
pub struct EdgeHandler<H> {
    host: H,
}

impl<H: Host> EdgeHandler<H> {
    /// Create a handler over the given host capabilities.
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    /// The host capabilities this handler was built with.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Handle one inbound request, completing `response_out` exactly once.
    ///
    /// The outbound fetch never influences the response: it is detached
    /// before the response is built and its outcome is discarded.
    #[allow(clippy::needless_pass_by_value)]
    #[instrument(skip_all, fields(method = %request.method()))]
    pub fn handle(&self, request: IncomingRequest, response_out: ResponseOutparam) {
        tracing::debug!("started");

        self.forward(&request);
        tracing::debug!("outbound issued");

        complete(response_out, respond());
        tracing::debug!("response delivered");
    }

    // Send the inbound headers on as a bodiless request with host-default
    // options. An immediate refusal is discarded like any later failure.
    fn forward(&self, request: &IncomingRequest) {
        let outbound = OutgoingRequest::new(request.headers());
        if let Ok(pending) = self.host.fetch(outbound, None) {
            self.host.spawn(fire_and_forget(pending));
        }
    }
}

/// Drive a pending fetch to completion and drop its outcome unobserved.
fn fire_and_forget(pending: FutureIncomingResponse) -> Task {
    Box::pin(async move {
        // outcome intentionally discarded
        let _ = pending.await;
    })
}

// Deliver the built response, or the error code a failed build maps to.
fn complete(response_out: ResponseOutparam, built: Result<OutgoingResponse>) {
    let response = built.map_err(|e| {
        tracing::error!("failed to prepare response: {e}");
        ErrorCode::from(e)
    });
    response_out.set(response);
}

fn respond() -> Result<OutgoingResponse> {
    let mut response = OutgoingResponse::new(Fields::new());
    response.set_status_code(200)?;

    let mut body = response.body()?;
    body.write()?.write(GREETING)?;
    body.finish(None)?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::error::{BodyError, Error};

    #[test]
    fn respond_builds_greeting() {
        let response = respond().expect("should build response");
        assert!(response.is_complete());

        let http_resp = response.into_http().expect("should convert");
        assert_eq!(http_resp.status(), 200);
        assert!(http_resp.headers().is_empty());
        assert_eq!(http_resp.body().as_ref(), GREETING);
        assert_eq!(http_resp.body().len(), 13);
    }

    #[test]
    fn failed_build_delivers_error_code() {
        let (response_out, receiver) = ResponseOutparam::new();
        let built = Err(Error::BodyWrite(BodyError::ContentLengthMismatch {
            limit: 13,
            written: 5,
        }));
        complete(response_out, built);

        let outcome = block_on(receiver);
        assert_eq!(outcome.err(), Some(ErrorCode::HttpResponseBodySize(Some(13))));
    }

    #[test]
    fn built_response_is_delivered() {
        let (response_out, receiver) = ResponseOutparam::new();
        complete(response_out, respond());

        let response = block_on(receiver).expect("should deliver response");
        assert_eq!(response.status_code(), 200);
    }
}
