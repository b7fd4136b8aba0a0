//! Core types for the server side of the x402 payment protocol.
//!
//! This crate provides the wire model exchanged between a paid HTTP resource,
//! its clients, and a remote facilitator. It is payload-agnostic: scheme-specific
//! payment proofs are carried as opaque JSON and are only ever interpreted by
//! the facilitator.
//!
//! # Overview
//!
//! The x402 protocol mediates payments over HTTP via the 402 Payment Required
//! status code. A server advertises [`proto::PaymentRequirements`] in a 402
//! response; the client retries with a Base64-encoded [`proto::PaymentPayload`]
//! in the `X-PAYMENT` header; the server asks a facilitator to verify the
//! proof, runs the handler, settles the payment, and attaches a
//! [`proto::SettlementResponseHeader`] to the response.
//!
//! # Modules
//!
//! - [`proto`] - Wire format types for protocol messages
//! - [`facilitator`] - Core trait for payment verification and settlement
//! - [`config`] - Configuration helpers (environment variable resolution)
//! - [`util`] - Helper types (base64, money amounts)

pub mod config;
pub mod facilitator;
pub mod proto;
pub mod util;
