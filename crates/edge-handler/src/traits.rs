//! # Host Capabilities
//!
//! The surface a host must provide for the handler to run. Implemented by the
//! `wasi:http` binding on wasm32 and by the stub host on native targets.

use crate::error::ErrorCode;
use crate::types::{IncomingResponse, OutgoingRequest, RequestOptions};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Result type for asynchronous host operations.
        pub type FutureResult<T> = futures::future::LocalBoxFuture<'static, Result<T, ErrorCode>>;

        /// A detached unit of work run by the host.
        pub type Task = futures::future::LocalBoxFuture<'static, ()>;
    } else {
        /// Result type for asynchronous host operations.
        pub type FutureResult<T> = futures::future::BoxFuture<'static, Result<T, ErrorCode>>;

        /// A detached unit of work run by the host.
        pub type Task = futures::future::BoxFuture<'static, ()>;
    }
}

/// Pending response to an outbound fetch.
pub type FutureIncomingResponse = FutureResult<IncomingResponse>;

/// Capabilities the host provides to the handler.
pub trait Host: Send + Sync {
    /// Issue an outbound HTTP request.
    ///
    /// The request is dispatched by the host; the returned future resolves to
    /// its response. `None` options leave timeouts, TLS and redirects to the
    /// host's own policy.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorCode`] if the host refuses the request outright.
    fn fetch(
        &self, request: OutgoingRequest, options: Option<RequestOptions>,
    ) -> Result<FutureIncomingResponse, ErrorCode>;

    /// Run `task` to completion without the caller awaiting it.
    fn spawn(&self, task: Task);
}
