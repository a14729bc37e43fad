//! Logging stub implementation of the host capabilities
//!
//! This is a lightweight implementation for development and tests only.
//! Outbound requests are logged and recorded but never leave the process;
//! each fetch resolves according to the configured [`FetchOutcome`].

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use fromenv::FromEnv;
use futures::FutureExt;
use http::StatusCode;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::instrument;

use crate::error::ErrorCode;
use crate::host::Backend;
use crate::traits::{FutureIncomingResponse, Host, Task};
use crate::types::{Fields, IncomingResponse, OutgoingRequest, RequestOptions};

/// Stub host configuration, read from the environment.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// One of `ok`, `dns-error`, `refused`, `timeout` or `hang`.
    #[env(from = "EDGE_FETCH_OUTCOME", default = "ok")]
    pub outcome: String,

    /// Status returned by successful fetches.
    #[env(from = "EDGE_FETCH_STATUS", default = "200")]
    pub status: u16,
}

impl crate::host::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// How the stub host resolves outbound fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Respond with the given status and an empty body.
    Respond(StatusCode),

    /// Fail with the given error code.
    Fail(ErrorCode),

    /// Never resolve.
    Hang,
}

impl TryFrom<&ConnectOptions> for FetchOutcome {
    type Error = anyhow::Error;

    fn try_from(options: &ConnectOptions) -> Result<Self> {
        let outcome = match options.outcome.trim().to_ascii_lowercase().as_str() {
            "ok" => Self::Respond(
                StatusCode::from_u16(options.status).context("`EDGE_FETCH_STATUS` is not a status")?,
            ),
            "dns-error" => Self::Fail(ErrorCode::DnsError {
                rcode: Some("NXDOMAIN".to_string()),
                info_code: None,
            }),
            "refused" => Self::Fail(ErrorCode::ConnectionRefused),
            "timeout" => Self::Fail(ErrorCode::ConnectionTimeout),
            "hang" => Self::Hang,
            other => return Err(anyhow!("unknown fetch outcome `{other}`")),
        };
        Ok(outcome)
    }
}

/// An outbound fetch as seen by the stub host.
#[derive(Debug)]
pub struct RecordedFetch {
    /// The request handed to the host.
    pub request: OutgoingRequest,

    /// The options passed with it.
    pub options: Option<RequestOptions>,
}

/// Stub implementation of [`Host`].
#[derive(Clone)]
pub struct StubHost {
    outcome: FetchOutcome,
    fetches: Arc<Mutex<Vec<RecordedFetch>>>,
}

impl Debug for StubHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubHost").field("outcome", &self.outcome).finish_non_exhaustive()
    }
}

impl StubHost {
    /// Create a stub host resolving every fetch with `outcome`.
    #[must_use]
    pub fn new(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            fetches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    /// Drain the fetches recorded so far.
    #[must_use]
    pub fn take_requests(&self) -> Vec<RecordedFetch> {
        std::mem::take(&mut *self.fetches.lock())
    }
}

impl Backend for StubHost {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        let outcome = FetchOutcome::try_from(&options)?;
        tracing::debug!("stub fetches resolve as {outcome:?}");
        Ok(Self::new(outcome))
    }
}

impl Host for StubHost {
    fn fetch(
        &self, request: OutgoingRequest, options: Option<RequestOptions>,
    ) -> Result<FutureIncomingResponse, ErrorCode> {
        tracing::info!(
            method = %request.method(),
            headers = ?request.headers(),
            has_body = request.body().is_some(),
            "outbound fetch"
        );
        self.fetches.lock().push(RecordedFetch { request, options });

        let outcome = self.outcome.clone();
        Ok(async move {
            match outcome {
                FetchOutcome::Respond(status) => Ok(IncomingResponse {
                    status,
                    headers: Fields::new(),
                    body: Bytes::new(),
                }),
                FetchOutcome::Fail(code) => Err(code),
                FetchOutcome::Hang => futures::future::pending().await,
            }
        }
        .boxed())
    }

    fn spawn(&self, task: Task) {
        match Handle::try_current() {
            Ok(handle) => drop(handle.spawn(task)),
            Err(e) => tracing::warn!("no runtime for detached task, dropping it: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn options(outcome: &str, status: u16) -> ConnectOptions {
        ConnectOptions {
            outcome: outcome.to_string(),
            status,
        }
    }

    #[test]
    fn parses_outcomes() {
        let ok = FetchOutcome::try_from(&options("ok", 204)).expect("should parse");
        assert_eq!(ok, FetchOutcome::Respond(StatusCode::NO_CONTENT));

        let dns = FetchOutcome::try_from(&options("DNS-Error", 200)).expect("should parse");
        assert!(matches!(dns, FetchOutcome::Fail(ErrorCode::DnsError { .. })));

        let hang = FetchOutcome::try_from(&options("hang", 200)).expect("should parse");
        assert_eq!(hang, FetchOutcome::Hang);
    }

    #[test]
    fn rejects_bad_options() {
        assert!(FetchOutcome::try_from(&options("sometimes", 200)).is_err());
        assert!(FetchOutcome::try_from(&options("ok", 42)).is_err());
    }

    #[tokio::test]
    async fn records_and_resolves_fetches() {
        let host = StubHost::connect_with(options("refused", 200)).await.expect("connect");

        let pending = host.fetch(OutgoingRequest::new(Fields::new()), None).expect("fetch");
        let Err(err) = pending.await else {
            panic!("expected refused fetch");
        };
        assert_eq!(err, ErrorCode::ConnectionRefused);

        let fetches = host.take_requests();
        assert_eq!(fetches.len(), 1);
        assert!(fetches[0].options.is_none());
        assert_eq!(host.fetch_count(), 0);
    }

    #[tokio::test]
    async fn hanging_fetch_never_resolves() {
        let host = StubHost::new(FetchOutcome::Hang);
        let pending = host.fetch(OutgoingRequest::new(Fields::new()), None).expect("fetch");

        let result = tokio::time::timeout(Duration::from_millis(20), pending).await;
        assert!(result.is_err(), "hanging fetch should time out");
    }

    #[tokio::test]
    async fn spawned_tasks_run_detached() {
        let host = StubHost::new(FetchOutcome::Hang);
        let (tx, rx) = futures::channel::oneshot::channel();

        host.spawn(Box::pin(async move {
            let _ = tx.send(());
        }));
        rx.await.expect("detached task should run");
    }
}
