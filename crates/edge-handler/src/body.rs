//! # Outgoing Body
//!
//! A response body is written through a single [`OutputStream`] and sealed
//! with [`OutgoingBody::finish`]. The payload buffer is shared with the
//! owning [`crate::OutgoingResponse`] so the host can read it back once the
//! response is delivered.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use crate::error::BodyError;
use crate::types::Fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Open,
    Finished,
    Aborted,
}

#[derive(Debug)]
pub(crate) struct Payload {
    data: BytesMut,
    phase: Phase,
    // declared `Content-Length`, if any
    limit: Option<u64>,
    trailers: Option<Fields>,
}

pub(crate) type SharedPayload = Arc<Mutex<Payload>>;

impl Payload {
    pub(crate) fn shared(limit: Option<u64>) -> SharedPayload {
        Arc::new(Mutex::new(Self {
            data: BytesMut::new(),
            phase: Phase::Open,
            limit,
            trailers: None,
        }))
    }

    pub(crate) const fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn take(&mut self) -> (Bytes, Option<Fields>) {
        (self.data.split().freeze(), self.trailers.take())
    }

    fn written(&self) -> u64 {
        self.data.len() as u64
    }
}

/// The writable body of an outgoing response.
///
/// Dropping the body without calling [`OutgoingBody::finish`] aborts the
/// payload and leaves the enclosing response incomplete.
#[derive(Debug)]
pub struct OutgoingBody {
    payload: SharedPayload,
    stream_taken: bool,
}

impl OutgoingBody {
    pub(crate) const fn new(payload: SharedPayload) -> Self {
        Self {
            payload,
            stream_taken: false,
        }
    }

    /// Returns the body's output stream.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::StreamAlreadyTaken`] if the stream was already
    /// handed out.
    pub fn write(&mut self) -> Result<OutputStream<'_>, BodyError> {
        if self.stream_taken {
            return Err(BodyError::StreamAlreadyTaken);
        }
        self.stream_taken = true;
        Ok(OutputStream { body: self })
    }

    /// Seal the payload, optionally attaching trailers.
    ///
    /// # Errors
    ///
    /// * [`BodyError::Closed`] if the body is no longer open
    /// * [`BodyError::ContentLengthMismatch`] if fewer bytes than the declared
    ///   `Content-Length` were written; the payload is aborted
    pub fn finish(self, trailers: Option<Fields>) -> Result<(), BodyError> {
        let mut payload = self.payload.lock();
        if payload.phase != Phase::Open {
            return Err(BodyError::Closed);
        }

        if let Some(limit) = payload.limit {
            let written = payload.written();
            if written != limit {
                payload.phase = Phase::Aborted;
                return Err(BodyError::ContentLengthMismatch { limit, written });
            }
        }

        payload.trailers = trailers;
        payload.phase = Phase::Finished;
        tracing::trace!("body finished with {} bytes", payload.written());

        Ok(())
    }
}

impl Drop for OutgoingBody {
    fn drop(&mut self) {
        let mut payload = self.payload.lock();
        if payload.phase == Phase::Open {
            tracing::warn!("outgoing body dropped before finish, aborting payload");
            payload.phase = Phase::Aborted;
        }
    }
}

/// Write half of an [`OutgoingBody`].
///
/// Borrows the body, so it is always released before the body can be
/// finished.
#[derive(Debug)]
pub struct OutputStream<'a> {
    body: &'a mut OutgoingBody,
}

impl OutputStream<'_> {
    /// Write and flush `bytes` to the body.
    ///
    /// # Errors
    ///
    /// * [`BodyError::Closed`] if the body was finished or aborted
    /// * [`BodyError::ContentLengthExceeded`] if the write would overrun the
    ///   declared `Content-Length`
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BodyError> {
        let mut payload = self.body.payload.lock();
        if payload.phase != Phase::Open {
            return Err(BodyError::Closed);
        }

        if let Some(limit) = payload.limit {
            let attempted = payload.written() + bytes.len() as u64;
            if attempted > limit {
                return Err(BodyError::ContentLengthExceeded { limit, attempted });
            }
        }

        payload.data.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_finish() {
        let shared = Payload::shared(None);
        let mut body = OutgoingBody::new(Arc::clone(&shared));

        let mut stream = body.write().expect("should take stream");
        stream.write(b"Hello, ").expect("should write");
        stream.write(b"World!").expect("should write");
        body.finish(None).expect("should finish");

        let mut payload = shared.lock();
        assert_eq!(payload.phase(), Phase::Finished);
        assert_eq!(payload.take().0, Bytes::from_static(b"Hello, World!"));
    }

    #[test]
    fn stream_taken_once() {
        let mut body = OutgoingBody::new(Payload::shared(None));
        drop(body.write().expect("should take stream"));

        let Err(err) = body.write() else {
            panic!("expected second stream to be refused");
        };
        assert_eq!(err, BodyError::StreamAlreadyTaken);
    }

    #[test]
    fn drop_without_finish_aborts() {
        let shared = Payload::shared(None);
        let mut body = OutgoingBody::new(Arc::clone(&shared));
        body.write().expect("should take stream").write(b"partial").expect("should write");
        drop(body);

        assert_eq!(shared.lock().phase(), Phase::Aborted);
    }

    #[test]
    fn content_length_enforced() {
        let shared = Payload::shared(Some(5));
        let mut body = OutgoingBody::new(Arc::clone(&shared));

        let mut stream = body.write().expect("should take stream");
        let Err(err) = stream.write(b"too long") else {
            panic!("expected overrun to be rejected");
        };
        assert_eq!(err, BodyError::ContentLengthExceeded { limit: 5, attempted: 8 });

        stream.write(b"abc").expect("should write");
        let Err(err) = body.finish(None) else {
            panic!("expected short body to be rejected");
        };
        assert_eq!(err, BodyError::ContentLengthMismatch { limit: 5, written: 3 });
        assert_eq!(shared.lock().phase(), Phase::Aborted);
    }
}
