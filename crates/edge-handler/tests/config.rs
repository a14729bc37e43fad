//! Stub host configuration read from the environment.
//!
//! Kept in its own test binary with a single test so that setting variables
//! cannot race other tests.

#![cfg(not(target_arch = "wasm32"))]
#![allow(missing_docs)]

use edge_handler::{Backend, StubHost};

#[tokio::test]
async fn fetch_status_is_parsed_from_env() {
    // SAFETY: the only test in this binary, so no other thread reads the environment.
    unsafe {
        std::env::set_var("EDGE_FETCH_OUTCOME", "ok");
        std::env::set_var("EDGE_FETCH_STATUS", "two hundred");
    }
    assert!(StubHost::connect().await.is_err(), "non-numeric status should be rejected");

    // SAFETY: as above.
    unsafe {
        std::env::set_var("EDGE_FETCH_STATUS", "204");
    }
    let host = StubHost::connect().await.expect("numeric status should load");
    assert!(format!("{host:?}").contains("204"));
}
