//! x402-paid serverless function gateway.
//!
//! An HTTP server exposing a service-deployment API where service creation is
//! gated behind x402 payments. A payment middleware verifies `X-PAYMENT`
//! proofs against a remote facilitator, the handler delegates deployment to
//! the configured vendor (Hive), and successful requests settle the payment
//! on-chain and carry an `X-PAYMENT-RESPONSE` receipt.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (config.json)
//! cargo run --package function-server
//!
//! # Run with custom configuration
//! cargo run --package function-server -- --config /path/to/config.json
//! ```
//!
//! # Configuration
//!
//! The server loads configuration from a JSON file; see [`config`] for the
//! format and environment fallbacks.

mod config;
mod handlers;
mod response;
mod run;
mod service;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
