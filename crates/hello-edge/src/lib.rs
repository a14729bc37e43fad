//! # Hello Edge Component
//!
//! Exports the `wasi:http` handler. Every inbound request triggers one
//! fire-and-forget outbound fetch carrying its headers and is answered with
//! `200 Hello, World!`.

#![cfg(target_arch = "wasm32")]

use wasip3::exports::http::handler::Guest;
use wasip3::http::types::{ErrorCode, Request, Response};

struct HttpGuest;
wasip3::http::service::export!(HttpGuest);

impl Guest for HttpGuest {
    /// Hands the request to the edge handler.
    #[tracing::instrument(name = "hello_edge_handle", skip_all, level = "debug")]
    async fn handle(request: Request) -> Result<Response, ErrorCode> {
        edge_handler::serve(request).await
    }
}
