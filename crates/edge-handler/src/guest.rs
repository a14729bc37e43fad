//! # WASI HTTP Guest
//!
//! Binds the handler to `wasi:http`. [`WasiHost`] forwards outbound fetches
//! to the component's `wasi:http/client` import and [`serve`] adapts the
//! exported `handle` function to [`EdgeHandler`].

use bytes::Bytes;
use http_body_util::Full;
use tracing::instrument;
use wasip3::http::client;
use wasip3::http::types as p3;
use wasip3::http_compat::{
    IncomingMessage, http_from_wasi_request, http_from_wasi_response, http_into_wasi_request,
    http_into_wasi_response,
};
use wasip3::wit_future;

use crate::error::ErrorCode;
use crate::handler::EdgeHandler;
use crate::outparam::ResponseOutparam;
use crate::traits::{FutureIncomingResponse, Host, Task};
use crate::types::{IncomingRequest, IncomingResponse, OutgoingRequest, RequestOptions};

/// [`Host`] backed by the component's `wasi:http` imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasiHost;

impl Host for WasiHost {
    fn fetch(
        &self, request: OutgoingRequest, options: Option<RequestOptions>,
    ) -> Result<FutureIncomingResponse, ErrorCode> {
        if options.is_some() {
            tracing::warn!("request options are not forwarded, host defaults apply");
        }

        let http_req = request.into_http()?.map(Full::new);
        tracing::debug!("forwarding request to proxy: {:?}", http_req.headers());
        let wasi_req = http_into_wasi_request(http_req).map_err(ErrorCode::from)?;

        Ok(Box::pin(async move {
            let wasi_resp = client::send(wasi_req).await.map_err(ErrorCode::from)?;
            let http_resp = http_from_wasi_response(wasi_resp).map_err(ErrorCode::from)?;
            let (parts, mut body) = http_resp.into_parts();

            // read body
            let bytes: Vec<u8> = if let Some(response) = body.take_unstarted() {
                let (_, body_rx) = wit_future::new(|| Ok(()));
                let (stream, _trailers) = response.consume_body(body_rx);
                stream.collect().await
            } else {
                vec![]
            };

            Ok(IncomingResponse {
                status: parts.status,
                headers: parts.headers,
                body: Bytes::from(bytes),
            })
        }))
    }

    fn spawn(&self, task: Task) {
        wit_bindgen::spawn(task);
    }
}

/// Serve an incoming `wasi:http` request with [`EdgeHandler`].
///
/// # Errors
///
/// Returns a [`p3::ErrorCode`] if the request could not be converted or the
/// handler completed its outparam with an error.
#[instrument(skip_all)]
pub async fn serve(request: p3::Request) -> Result<p3::Response, p3::ErrorCode> {
    let http_req = http_from_wasi_request(request)?;
    tracing::debug!("serving request: {:?}", http_req.headers());

    let (response_out, receiver) = ResponseOutparam::new();
    EdgeHandler::new(WasiHost).handle(IncomingRequest::from(http_req), response_out);

    let response = receiver.await?;
    let http_resp = response.into_http()?;
    tracing::debug!("guest response: {http_resp:?}");

    http_into_wasi_response(http_resp.map(Full::new))
}

impl From<p3::ErrorCode> for ErrorCode {
    fn from(code: p3::ErrorCode) -> Self {
        match code {
            p3::ErrorCode::DnsTimeout => Self::DnsTimeout,
            p3::ErrorCode::DnsError(payload) => Self::DnsError {
                rcode: payload.rcode,
                info_code: payload.info_code,
            },
            p3::ErrorCode::DestinationNotFound => Self::DestinationNotFound,
            p3::ErrorCode::DestinationUnavailable => Self::DestinationUnavailable,
            p3::ErrorCode::ConnectionRefused => Self::ConnectionRefused,
            p3::ErrorCode::ConnectionTimeout => Self::ConnectionTimeout,
            p3::ErrorCode::HttpRequestUriInvalid => Self::HttpRequestUriInvalid,
            p3::ErrorCode::HttpResponseIncomplete => Self::HttpResponseIncomplete,
            p3::ErrorCode::HttpResponseBodySize(size) => Self::HttpResponseBodySize(size),
            p3::ErrorCode::InternalError(msg) => Self::InternalError(msg),
            other => Self::InternalError(Some(format!("{other:?}"))),
        }
    }
}

impl From<ErrorCode> for p3::ErrorCode {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::DnsTimeout => Self::DnsTimeout,
            ErrorCode::DnsError { rcode, info_code } => {
                Self::DnsError(p3::DnsErrorPayload { rcode, info_code })
            }
            ErrorCode::DestinationNotFound => Self::DestinationNotFound,
            ErrorCode::DestinationUnavailable => Self::DestinationUnavailable,
            ErrorCode::ConnectionRefused => Self::ConnectionRefused,
            ErrorCode::ConnectionTimeout => Self::ConnectionTimeout,
            ErrorCode::HttpRequestUriInvalid => Self::HttpRequestUriInvalid,
            ErrorCode::HttpResponseIncomplete => Self::HttpResponseIncomplete,
            ErrorCode::HttpResponseBodySize(size) => Self::HttpResponseBodySize(size),
            ErrorCode::InternalError(msg) => Self::InternalError(msg),
        }
    }
}
