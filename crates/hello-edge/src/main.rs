//! # Hello Edge Runner
//!
//! Runs the edge handler natively against the logging stub host, the way a
//! `wasi:http` host would invoke the component for a single request.

#[cfg(not(target_arch = "wasm32"))]
mod cli;

cfg_if::cfg_if! {
    if #[cfg(not(target_arch = "wasm32"))] {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            cli::run().await
        }
    } else {
        fn main() {}
    }
}
