//! # Native Host
//!
//! Host-side pieces for running the handler outside a wasm runtime: the
//! backend traits and a logging stub that stands in for `wasi:http`.

mod default_impl;

use std::future::Future;

use anyhow::Result;

pub use self::default_impl::{ConnectOptions, FetchOutcome, RecordedFetch, StubHost};

/// Implemented by host backends so they can be built from configuration.
pub trait Backend: Sized + Sync + Send {
    /// The options used to connect the backend.
    type ConnectOptions: FromEnv;

    /// Connect using options read from the environment.
    #[must_use]
    fn connect() -> impl Future<Output = Result<Self>> {
        async { Self::connect_with(Self::ConnectOptions::from_env()?).await }
    }

    /// Connect with the specified options.
    fn connect_with(options: Self::ConnectOptions) -> impl Future<Output = Result<Self>>;
}

/// Trait for creating connection options from environment variables.
pub trait FromEnv: Sized {
    /// Create connection options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    fn from_env() -> Result<Self>;
}
