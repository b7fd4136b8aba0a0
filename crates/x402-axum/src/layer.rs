//! Tower layer plumbing for the x402 payment middleware.
//!
//! [`X402Middleware`] is created once per application from an [`X402Config`]
//! and produces per-route layers via [`X402Middleware::price`] and
//! [`X402Middleware::price_calculator`]. The returned [`X402LayerBuilder`]
//! carries the route's payment metadata and can be attached with axum's
//! `.layer(...)`.

use axum_core::extract::Request;
use axum_core::response::Response;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use url::Url;

use x402_types::facilitator::Facilitator;

use crate::config::X402Config;
use crate::facilitator_client::{FacilitatorClient, FacilitatorClientError};
use crate::paygate::{PaymentTag, Paygate};
use crate::price::{CalculatorRegistry, PriceCalculator};

/// Errors constructing the middleware at startup.
#[derive(Debug, thiserror::Error)]
pub enum X402SetupError {
    #[error("x402 is enabled but facilitator_base_url is not configured")]
    MissingFacilitatorUrl,
    #[error(transparent)]
    Facilitator(#[from] FacilitatorClientError),
}

/// The main x402 middleware instance.
///
/// Create a single instance per application and use it to build payment
/// layers for protected routes. Cheap to clone; all shared state is behind
/// `Arc`s.
#[derive(Clone, Debug)]
pub struct X402Middleware<F = Arc<FacilitatorClient>> {
    facilitator: F,
    config: Arc<X402Config>,
    calculators: Arc<CalculatorRegistry>,
    base_url: Option<Arc<Url>>,
}

impl X402Middleware<Arc<FacilitatorClient>> {
    /// Creates a middleware backed by a remote facilitator taken from the
    /// configuration.
    pub fn try_new(config: X402Config) -> Result<Self, X402SetupError> {
        let url = config
            .facilitator_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(X402SetupError::MissingFacilitatorUrl)?;
        let facilitator = FacilitatorClient::try_from(url)?;
        Ok(Self {
            facilitator: Arc::new(facilitator),
            config: Arc::new(config),
            calculators: Arc::new(CalculatorRegistry::new()),
            base_url: None,
        })
    }
}

impl<F> X402Middleware<F> {
    /// Creates a middleware over any [`Facilitator`] implementation.
    ///
    /// This is the seam tests use to substitute an in-process facilitator.
    pub fn with_facilitator(facilitator: F, config: X402Config) -> Self {
        Self {
            facilitator,
            config: Arc::new(config),
            calculators: Arc::new(CalculatorRegistry::new()),
            base_url: None,
        }
    }

    pub fn facilitator(&self) -> &F {
        &self.facilitator
    }

    pub fn config(&self) -> &X402Config {
        &self.config
    }
}

impl<F> X402Middleware<F>
where
    F: Clone,
{
    /// Sets the base URL used to construct fully-qualified resource URLs.
    ///
    /// Defaults to `http://localhost/` when unset; production deployments
    /// should always configure it.
    pub fn with_base_url(&self, base_url: Url) -> Self {
        let mut this = self.clone();
        this.base_url = Some(Arc::new(base_url));
        this
    }

    /// Registers a named price calculator.
    pub fn with_calculator(
        &self,
        name: impl Into<String>,
        calculator: Arc<dyn PriceCalculator>,
    ) -> Self {
        let mut this = self.clone();
        let mut registry = (*this.calculators).clone();
        registry.register(name, calculator);
        this.calculators = Arc::new(registry);
        this
    }

    /// Builds a payment layer with a static human-readable price.
    pub fn price(&self, price: &str) -> X402LayerBuilder<F> {
        self.tagged(PaymentTag {
            price: Some(price.to_string()),
            ..PaymentTag::default()
        })
    }

    /// Builds a payment layer priced by a registered calculator.
    pub fn price_calculator(&self, name: &str) -> X402LayerBuilder<F> {
        self.tagged(PaymentTag {
            calculator: Some(name.to_string()),
            ..PaymentTag::default()
        })
    }

    fn tagged(&self, tag: PaymentTag) -> X402LayerBuilder<F> {
        X402LayerBuilder {
            facilitator: self.facilitator.clone(),
            config: self.config.clone(),
            calculators: self.calculators.clone(),
            base_url: self.base_url.clone(),
            tag,
        }
    }
}

/// Per-route builder for the payment layer.
#[derive(Clone)]
pub struct X402LayerBuilder<F> {
    facilitator: F,
    config: Arc<X402Config>,
    calculators: Arc<CalculatorRegistry>,
    base_url: Option<Arc<Url>>,
    tag: PaymentTag,
}

impl<F> X402LayerBuilder<F> {
    /// Sets a description of what the payment grants access to.
    ///
    /// Included in 402 responses to inform clients what they are paying for.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.tag.description = description.into();
        self
    }

    /// Overrides the recipient address for this route.
    pub fn with_pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.tag.pay_to = Some(pay_to.into());
        self
    }

    /// Sets the full URL of the protected resource explicitly, instead of
    /// deriving it from the base URL and request URI.
    pub fn with_resource(mut self, resource: Url) -> Self {
        self.tag.resource = Some(resource.to_string());
        self
    }
}

impl<S, F> Layer<S> for X402LayerBuilder<F>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    F: Facilitator + Clone,
{
    type Service = X402PaymentService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        X402PaymentService {
            gate: Arc::new(Paygate {
                facilitator: self.facilitator.clone(),
                config: self.config.clone(),
                calculators: self.calculators.clone(),
                base_url: self.base_url.clone(),
                tag: Arc::new(self.tag.clone()),
            }),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Axum service that enforces x402 payments on incoming requests.
#[derive(Clone)]
pub struct X402PaymentService<F> {
    gate: Arc<Paygate<F>>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<F> Service<Request> for X402PaymentService<F>
where
    F: Facilitator + Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = self.gate.clone();
        let inner = self.inner.clone();
        Box::pin(async move { gate.handle_request(inner, req).await })
    }
}
