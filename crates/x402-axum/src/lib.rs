//! Axum middleware for enforcing x402 payments on protected routes.
//!
//! The middleware validates incoming `X-PAYMENT` headers against a configured
//! remote facilitator, runs the protected handler, settles the payment after
//! the handler succeeds, and attaches an `X-PAYMENT-RESPONSE` receipt header.
//! Requests without a valid payment receive a `402 Payment Required` response
//! carrying machine-readable payment requirements.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::post};
//! use axum::response::IntoResponse;
//! use http::StatusCode;
//! use x402_axum::{X402Config, X402Middleware};
//!
//! let config = X402Config {
//!     facilitator_base_url: Some("https://facilitator.example.com".to_string()),
//!     ..X402Config::default()
//! };
//! let x402 = X402Middleware::try_new(config).unwrap();
//!
//! let app: Router = Router::new().route(
//!     "/services",
//!     post(my_handler).layer(
//!         x402.price("0.01").with_description("service deployment"),
//!     ),
//! );
//!
//! async fn my_handler() -> impl IntoResponse {
//!     (StatusCode::CREATED, "deployed")
//! }
//! ```
//!
//! ## Ordering guarantees
//!
//! For a single request, `verify` happens-before the handler runs, which
//! happens-before `settle`. Verification and settlement are attempted at most
//! once per request and are never retried.
//!
//! ## Dynamic pricing
//!
//! Routes may name a [`price::PriceCalculator`] registered on the middleware
//! instead of a static price. A calculator may read the request body; the
//! middleware buffers the body and replays it to the handler, so body-reading
//! calculators and body-consuming handlers compose.

pub mod config;
pub mod facilitator_client;
pub mod layer;
pub mod paygate;
pub mod price;

pub use config::X402Config;
pub use layer::X402Middleware;
