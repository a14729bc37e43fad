#![doc = include_str!("../README.md")]

//! # Edge Handler
//!
//! An inbound `wasi:http` handler that issues one best-effort outbound fetch
//! and answers every request with `200 Hello, World!`.
//!
//! The handler only sees the host through the [`Host`] capability trait. The
//! `guest` module binds it to `wasi:http` on wasm32 targets; the `host` module
//! provides a logging stub host for native runs and tests.

#![forbid(unsafe_code)]

mod body;
mod error;
mod handler;
mod outparam;
mod traits;
mod types;

#[cfg(target_arch = "wasm32")]
mod guest;
#[cfg(target_arch = "wasm32")]
pub use guest::*;

#[cfg(not(target_arch = "wasm32"))]
mod host;
#[cfg(not(target_arch = "wasm32"))]
pub use host::*;

pub use self::body::*;
pub use self::error::*;
pub use self::handler::*;
pub use self::outparam::*;
pub use self::traits::*;
pub use self::types::*;
