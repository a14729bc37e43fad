//! # Response Outparam
//!
//! The write-once slot a handler fills to complete an invocation.
//!
//! [`ResponseOutparam::set`] consumes the outparam, so a second `set` does not
//! compile. Forgetting to call it is caught at drop time: the host's
//! [`ResponseReceiver`] then resolves to an error instead of hanging.

use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::ErrorCode;
use crate::types::OutgoingResponse;

/// The outcome delivered through a [`ResponseOutparam`].
pub type Outcome = Result<OutgoingResponse, ErrorCode>;

/// Write-once output slot for an invocation's response.
#[must_use = "a response outparam must be set exactly once"]
pub struct ResponseOutparam {
    sender: Option<oneshot::Sender<Outcome>>,
}

impl Debug for ResponseOutparam {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseOutparam").field("set", &self.sender.is_none()).finish()
    }
}

impl ResponseOutparam {
    /// Create an outparam and the receiver the host awaits.
    pub fn new() -> (Self, ResponseReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender: Some(sender) }, ResponseReceiver { receiver })
    }

    /// Deliver the invocation's outcome. This is the terminal action.
    ///
    /// An `Ok` response whose body has not been finished is delivered as
    /// [`ErrorCode::HttpResponseIncomplete`].
    pub fn set(mut self, outcome: Outcome) {
        let outcome = match outcome {
            Ok(response) if !response.is_complete() => {
                tracing::error!("response set before its body was finished");
                Err(ErrorCode::HttpResponseIncomplete)
            }
            other => other,
        };

        let Some(sender) = self.sender.take() else {
            return;
        };
        if sender.send(outcome).is_err() {
            tracing::debug!("host stopped waiting for the response");
        }
    }
}

impl Drop for ResponseOutparam {
    fn drop(&mut self) {
        if self.sender.is_some() {
            tracing::error!("response outparam dropped without being set");
        }
    }
}

/// Host side of a [`ResponseOutparam`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct ResponseReceiver {
    receiver: oneshot::Receiver<Outcome>,
}

impl Future for ResponseReceiver {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_canceled| {
                Err(ErrorCode::InternalError(Some(
                    "handler returned without setting the response outparam".to_string(),
                )))
            })
        })
    }
}
