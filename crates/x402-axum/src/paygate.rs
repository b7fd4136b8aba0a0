//! The payment gate: the state machine wrapped around every protected handler.
//!
//! The gate handles, in order:
//! - price resolution (static tag or registered calculator) and requirement synthesis
//! - extracting and decoding the `X-PAYMENT` header
//! - verifying the payment with the facilitator
//! - running the inner handler with [`PaymentAttributes`] attached to the request
//! - settling the payment once the handler succeeded, and attaching the
//!   `X-PAYMENT-RESPONSE` receipt header
//!
//! Settlement is attempted at most once per request, and only when the
//! handler produced a status below 400. Responses are buffered until the gate
//! returns, so a failed settlement can always rewrite a success response into
//! a 402.

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::Response;
use http::{HeaderValue, StatusCode, Uri, header};
use http_body_util::{BodyExt, Limited};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use url::Url;

use x402_types::facilitator::Facilitator;
use x402_types::proto::{
    PaymentPayload, PaymentRequiredResponse, PaymentRequirements, SettlementResponse,
    SettlementResponseHeader, VerificationResponse,
};
use x402_types::util::MoneyAmount;

use crate::config::X402Config;
use crate::price::{CalculatorRegistry, PriceError};

/// Request header carrying the payment payload (Base64 encoded).
pub const PAYMENT_HEADER: &str = "X-PAYMENT";
/// Response header carrying settlement information (Base64 encoded).
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Largest request body a price calculator is allowed to buffer.
const PRICE_BODY_LIMIT: usize = 1 << 20;

/// Per-route payment metadata, attached where the route is registered.
#[derive(Debug, Clone, Default)]
pub struct PaymentTag {
    /// Static human-readable price, e.g. `"0.01"`.
    pub price: Option<String>,
    /// Name of a registered [`crate::price::PriceCalculator`].
    pub calculator: Option<String>,
    /// Per-route recipient override.
    pub pay_to: Option<String>,
    /// Human-readable description of what the payment grants access to.
    pub description: String,
    /// Explicit resource URL override.
    pub resource: Option<String>,
}

/// Verified payment state carried from the pre-handle phase to settlement,
/// and exposed to handlers through request extensions.
#[derive(Debug, Clone)]
pub struct PaymentAttributes {
    /// The requirements the payment was verified against.
    pub requirements: PaymentRequirements,
    /// The raw `X-PAYMENT` header value.
    pub header: String,
    /// The decoded, verified payload.
    pub payload: PaymentPayload,
    /// The payer address reported by the facilitator.
    pub payer: String,
}

/// The payment gate for one protected route.
pub struct Paygate<F> {
    pub facilitator: F,
    pub config: Arc<X402Config>,
    pub calculators: Arc<CalculatorRegistry>,
    pub base_url: Option<Arc<Url>>,
    pub tag: Arc<PaymentTag>,
}

impl<F> Paygate<F>
where
    F: Facilitator,
{
    /// Runs the full payment flow around `inner`.
    pub async fn handle_request<S>(&self, mut inner: S, req: Request) -> Result<Response, Infallible>
    where
        S: Service<Request, Response = Response, Error = Infallible>,
        S::Future: Send,
    {
        let resource = self.resource_url(req.uri());

        let (mut req, human) = match self.resolve_amount(req).await {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::error!(%err, %resource, "x402 price resolution failed");
                return Ok(internal_error(format!("Price resolution failed: {err}")));
            }
        };
        let atomic = match MoneyAmount::parse(&human)
            .and_then(|amount| amount.atomic_units(self.config.asset_decimals))
        {
            Ok(atomic) => atomic,
            Err(err) => {
                tracing::error!(%err, %resource, %human, "x402 price conversion failed");
                return Ok(internal_error(format!("Price resolution failed: {err}")));
            }
        };
        let requirements = self.build_requirements(resource.clone(), atomic);

        let header = req
            .headers()
            .get(PAYMENT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let Some(header) = header else {
            tracing::info!(%resource, "x402 missing payment header");
            return Ok(payment_required(
                &requirements,
                format!("{PAYMENT_HEADER} header is required"),
            ));
        };

        let payload = match PaymentPayload::from_header(&header) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%err, %resource, "x402 invalid payment header");
                return Ok(payment_required(
                    &requirements,
                    format!("malformed {PAYMENT_HEADER} header"),
                ));
            }
        };

        match self.facilitator.verify(&payload, &requirements).await {
            Err(err) => {
                tracing::error!(%err, %resource, "x402 facilitator communication error");
                return Ok(internal_error(format!("Payment verification failed: {err}")));
            }
            Ok(VerificationResponse::Invalid { reason, .. }) => {
                tracing::info!(%resource, %reason, "x402 payment verification failed");
                return Ok(payment_required(&requirements, reason));
            }
            Ok(VerificationResponse::Valid { payer }) => {
                // Stash verified state for the settlement phase and for handlers.
                req.extensions_mut().insert(PaymentAttributes {
                    requirements: requirements.clone(),
                    header,
                    payload: payload.clone(),
                    payer,
                });
            }
        }

        let response = match inner.call(req).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        };

        // Error responses are never settled.
        if response.status().as_u16() >= 400 {
            return Ok(response);
        }

        match self.facilitator.settle(&payload, &requirements).await {
            Ok(SettlementResponse::Success {
                transaction,
                network,
                payer,
            }) => {
                tracing::info!(%resource, %transaction, "x402 payment settled");
                let receipt = SettlementResponseHeader::new(transaction, network, payer);
                Ok(attach_settlement_header(response, &receipt))
            }
            Ok(SettlementResponse::Failure { reason, .. }) => {
                let reason = reason.unwrap_or_else(|| "settlement failed".to_string());
                tracing::error!(%resource, %reason, "x402 settlement failed");
                Ok(payment_required(&requirements, reason))
            }
            Err(err) => {
                tracing::error!(%err, %resource, "x402 settlement error");
                Ok(payment_required(
                    &requirements,
                    format!("settlement error: {err}"),
                ))
            }
        }
    }

    /// Determines the fully-qualified resource URL for this request.
    ///
    /// Uses the explicit per-route override when present, otherwise combines
    /// the configured base URL with the request's path and query.
    fn resource_url(&self, uri: &Uri) -> String {
        if let Some(resource) = &self.tag.resource {
            return resource.clone();
        }
        let mut url = self
            .base_url
            .as_deref()
            .cloned()
            .unwrap_or_else(|| Url::parse("http://localhost/").expect("valid url"));
        url.set_path(uri.path());
        url.set_query(uri.query());
        url.to_string()
    }

    /// Resolves the human-readable amount for this request.
    ///
    /// When the route names a calculator, the whole body is buffered, handed
    /// to the calculator, and replayed into the returned request so the
    /// downstream handler still sees it.
    async fn resolve_amount(&self, req: Request) -> Result<(Request, String), PriceError> {
        if let Some(price) = self.tag.price.as_deref().filter(|p| !p.trim().is_empty()) {
            return Ok((req, price.to_string()));
        }
        let name = self.tag.calculator.as_deref().ok_or(PriceError::Unpriced)?;
        let calculator = self
            .calculators
            .get(name)
            .cloned()
            .ok_or_else(|| PriceError::UnknownCalculator(name.to_string()))?;

        let (parts, body) = req.into_parts();
        let bytes = Limited::new(body, PRICE_BODY_LIMIT)
            .collect()
            .await
            .map_err(|e| PriceError::BodyRead(e.to_string()))?
            .to_bytes();
        let human = calculator.calculate_price(&parts, &bytes)?;
        if human.trim().is_empty() {
            return Err(PriceError::Unpriced);
        }
        let req = Request::from_parts(parts, Body::from(bytes));
        Ok((req, human))
    }

    fn build_requirements(&self, resource: String, atomic: String) -> PaymentRequirements {
        let config = &self.config;
        PaymentRequirements {
            scheme: config.scheme.clone(),
            network: config.network.clone(),
            max_amount_required: atomic,
            asset: config.asset.clone(),
            pay_to: self
                .tag
                .pay_to
                .clone()
                .or_else(|| config.default_pay_to.clone())
                .unwrap_or_default(),
            resource,
            description: self.tag.description.clone(),
            mime_type: config.mime_type.clone(),
            output_schema: config.output_schema.clone(),
            max_timeout_seconds: config.max_timeout_seconds,
            extra: config.extra.clone(),
        }
    }
}

/// Builds a 402 Payment Required response with a single-entry `accepts` list.
fn payment_required(requirements: &PaymentRequirements, error: impl Into<String>) -> Response {
    let body = PaymentRequiredResponse::new(requirements.clone(), error);
    let bytes = serde_json::to_vec(&body).expect("serialization failed");
    Response::builder()
        .status(StatusCode::PAYMENT_REQUIRED)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("failed to construct response")
}

/// Builds a 500 response with a JSON error body.
fn internal_error(message: impl Into<String>) -> Response {
    let bytes = serde_json::to_vec(&serde_json::json!({ "error": message.into() }))
        .expect("serialization failed");
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("failed to construct response")
}

/// Attaches the settlement receipt and the CORS expose header.
fn attach_settlement_header(mut response: Response, receipt: &SettlementResponseHeader) -> Response {
    let value = receipt
        .to_header()
        .ok()
        .and_then(|h| HeaderValue::from_str(&h).ok());
    let Some(value) = value else {
        tracing::error!("x402 failed to encode settlement response header");
        return internal_error("Failed to create settlement response header");
    };
    response.headers_mut().insert(PAYMENT_RESPONSE_HEADER, value);
    response.headers_mut().insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(PAYMENT_RESPONSE_HEADER),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::X402Middleware;
    use crate::price::PriceCalcError;
    use http::Request;
    use http::request::Parts;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Extension, Router};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use x402_types::proto::{Kind, X402Version1};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct StubError(String);

    /// In-process facilitator with canned responses and call counters.
    struct StubFacilitator {
        verify_response: Result<VerificationResponse, String>,
        settle_response: Result<SettlementResponse, String>,
        verify_calls: AtomicUsize,
        settle_calls: AtomicUsize,
    }

    impl StubFacilitator {
        fn new(
            verify: Result<VerificationResponse, String>,
            settle: Result<SettlementResponse, String>,
        ) -> Arc<Self> {
            Arc::new(Self {
                verify_response: verify,
                settle_response: settle,
                verify_calls: AtomicUsize::new(0),
                settle_calls: AtomicUsize::new(0),
            })
        }

        fn happy() -> Arc<Self> {
            Self::new(
                Ok(VerificationResponse::Valid {
                    payer: "0xPayer".to_string(),
                }),
                Ok(SettlementResponse::Success {
                    transaction: "0xTX".to_string(),
                    network: "base-sepolia".to_string(),
                    payer: "0xPayer".to_string(),
                }),
            )
        }
    }

    impl Facilitator for StubFacilitator {
        type Error = StubError;

        fn verify(
            &self,
            _payload: &PaymentPayload,
            _requirements: &PaymentRequirements,
        ) -> impl Future<Output = Result<VerificationResponse, StubError>> + Send {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.verify_response.clone().map_err(StubError);
            async move { result }
        }

        fn settle(
            &self,
            _payload: &PaymentPayload,
            _requirements: &PaymentRequirements,
        ) -> impl Future<Output = Result<SettlementResponse, StubError>> + Send {
            self.settle_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.settle_response.clone().map_err(StubError);
            async move { result }
        }

        fn supported(&self) -> impl Future<Output = Result<HashSet<Kind>, StubError>> + Send {
            async move { Ok(HashSet::new()) }
        }
    }

    fn gate_config() -> X402Config {
        X402Config {
            enabled: true,
            default_pay_to: Some("0xPayee".to_string()),
            ..X402Config::default()
        }
    }

    fn middleware(facilitator: Arc<StubFacilitator>) -> X402Middleware<Arc<StubFacilitator>> {
        X402Middleware::with_facilitator(facilitator, gate_config())
    }

    fn payment_header() -> String {
        PaymentPayload {
            x402_version: X402Version1,
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            payload: serde_json::json!({"authorization": "0xSig"}),
        }
        .to_header()
        .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_payment_header_yields_402() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price("0.01")),
        );

        let request = Request::builder().uri("/pay").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["x402Version"], 1);
        assert_eq!(body["error"], "X-PAYMENT header is required");
        assert_eq!(body["accepts"].as_array().unwrap().len(), 1);
        assert_eq!(body["accepts"][0]["scheme"], "exact");
        assert_eq!(body["accepts"][0]["network"], "base-sepolia");
        assert_eq!(body["accepts"][0]["maxAmountRequired"], "10000");
        assert_eq!(body["accepts"][0]["payTo"], "0xPayee");
        assert_eq!(body["accepts"][0]["resource"], "http://localhost/pay");
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_payment_header_yields_402() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, "   ")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_payment_header_yields_402() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, "!!!not-base64!!!")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "malformed X-PAYMENT header");
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settled_response_carries_receipt_header() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/services",
            post(|| async { (StatusCode::CREATED, "created").into_response() })
                .layer(x402.price("0.01").with_description("service deployment")),
        );

        let request = Request::builder()
            .method("POST")
            .uri("/services")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let receipt_value = response
            .headers()
            .get(PAYMENT_RESPONSE_HEADER)
            .expect("receipt header present")
            .to_str()
            .unwrap();
        let receipt = SettlementResponseHeader::from_header(receipt_value).unwrap();
        assert_eq!(
            receipt,
            SettlementResponseHeader::new(
                "0xTX".to_string(),
                "base-sepolia".to_string(),
                "0xPayer".to_string()
            )
        );
        let expose = response
            .headers()
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .expect("expose header present")
            .to_str()
            .unwrap();
        assert!(expose.contains(PAYMENT_RESPONSE_HEADER));
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_sees_payment_attributes() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/whoami",
            get(|Extension(attributes): Extension<PaymentAttributes>| async move {
                attributes.payer
            })
            .layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/whoami")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"0xPayer");
    }

    #[tokio::test]
    async fn test_verification_rejection_skips_handler_and_settlement() {
        let facilitator = StubFacilitator::new(
            Ok(VerificationResponse::Invalid {
                reason: "insufficient_funds".to_string(),
                payer: None,
            }),
            Ok(SettlementResponse::Success {
                transaction: "0xTX".to_string(),
                network: "base-sepolia".to_string(),
                payer: "0xPayer".to_string(),
            }),
        );
        let handled = Arc::new(AtomicUsize::new(0));
        let handled_in_route = handled.clone();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(move || {
                let handled = handled_in_route.clone();
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    "paid content"
                }
            })
            .layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "insufficient_funds");
        assert_eq!(handled.load(Ordering::SeqCst), 0);
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verification_transport_error_yields_500() {
        let facilitator = StubFacilitator::new(
            Err("connection refused".to_string()),
            Err("unreachable".to_string()),
        );
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Payment verification failed")
        );
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settlement_failure_rewrites_success_response_to_402() {
        let facilitator = StubFacilitator::new(
            Ok(VerificationResponse::Valid {
                payer: "0xPayer".to_string(),
            }),
            Ok(SettlementResponse::Failure {
                reason: Some("tx_reverted".to_string()),
                network: Some("base-sepolia".to_string()),
                payer: None,
            }),
        );
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/services",
            post(|| async { (StatusCode::CREATED, "created").into_response() })
                .layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .method("POST")
            .uri("/services")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "tx_reverted");
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settlement_transport_error_yields_402() {
        let facilitator = StubFacilitator::new(
            Ok(VerificationResponse::Valid {
                payer: "0xPayer".to_string(),
            }),
            Err("facilitator down".to_string()),
        );
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "settlement error: facilitator down");
    }

    #[tokio::test]
    async fn test_handler_error_status_skips_settlement() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { (StatusCode::BAD_REQUEST, "nope").into_response() })
                .layer(x402.price("0.01")),
        );

        let request = Request::builder()
            .uri("/pay")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(PAYMENT_RESPONSE_HEADER).is_none());
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(facilitator.settle_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_calculator_prices_request_and_preserves_body() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone()).with_calculator(
            "body-price",
            Arc::new(|_: &Parts, body: &[u8]| {
                let json: serde_json::Value = serde_json::from_slice(body)
                    .map_err(|e| PriceCalcError::new(e.to_string()))?;
                Ok(json["price"].as_str().unwrap_or("0.02").to_string())
            }),
        );
        let app = Router::new().route(
            "/bodyPrice",
            post(|body: String| async move { body })
                .layer(x402.price_calculator("body-price")),
        );

        // Without a payment header the 402 quotes the body-derived amount.
        let request = Request::builder()
            .method("POST")
            .uri("/bodyPrice")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"price":"0.03"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["accepts"][0]["maxAmountRequired"], "30000");

        // With a valid payment the handler still receives the buffered body.
        let request = Request::builder()
            .method("POST")
            .uri("/bodyPrice")
            .header(header::CONTENT_TYPE, "application/json")
            .header(PAYMENT_HEADER, payment_header())
            .body(Body::from(r#"{"price":"0.03"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"price":"0.03"}"#.as_slice());
    }

    #[tokio::test]
    async fn test_unknown_calculator_yields_500() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone());
        let app = Router::new().route(
            "/pay",
            get(|| async { "paid content" }).layer(x402.price_calculator("missing")),
        );

        let request = Request::builder().uri("/pay").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(facilitator.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_price_calculator() {
        let facilitator = StubFacilitator::happy();
        let x402 = middleware(facilitator.clone()).with_calculator(
            "param-price",
            Arc::new(|parts: &Parts, _: &[u8]| {
                let amount = match parts.uri.query() {
                    Some(q) if q.contains("param=1") => "0.11",
                    _ => "0.12",
                };
                Ok(amount.to_string())
            }),
        );
        let app = Router::new().route(
            "/paramPrice",
            get(|| async { "priced" }).layer(x402.price_calculator("param-price")),
        );

        let request = Request::builder()
            .uri("/paramPrice?param=1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["accepts"][0]["maxAmountRequired"], "110000");
        assert_eq!(
            body["accepts"][0]["resource"],
            "http://localhost/paramPrice?param=1"
        );
    }
}
