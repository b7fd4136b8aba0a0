//! Price resolution for protected routes.
//!
//! A route either carries a static human-readable price (`"0.01"`) or names a
//! [`PriceCalculator`] registered on the middleware at wiring time. Either way
//! the resolved human amount is converted to atomic token units with the
//! configured decimals before it enters a [`PaymentRequirements`].
//!
//! Calculators are pure functions of the request. They may inspect the URI,
//! headers, and the buffered request body. They must not hold per-request
//! state.
//!
//! [`PaymentRequirements`]: x402_types::proto::PaymentRequirements

use http::request::Parts;
use std::collections::HashMap;
use std::sync::Arc;

use x402_types::util::MoneyAmountError;

/// A calculator-reported failure. Surfaced to the client as a 500.
#[derive(Debug, thiserror::Error)]
#[error("price calculator failed: {0}")]
pub struct PriceCalcError(pub String);

impl PriceCalcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Computes a human-readable price for one request.
///
/// `body` holds the complete buffered request body; the middleware replays it
/// to the downstream handler afterwards.
pub trait PriceCalculator: Send + Sync {
    fn calculate_price(&self, parts: &Parts, body: &[u8]) -> Result<String, PriceCalcError>;
}

impl<F> PriceCalculator for F
where
    F: Fn(&Parts, &[u8]) -> Result<String, PriceCalcError> + Send + Sync,
{
    fn calculate_price(&self, parts: &Parts, body: &[u8]) -> Result<String, PriceCalcError> {
        self(parts, body)
    }
}

/// Errors resolving a route's price. All of these are server-side
/// misconfiguration or calculator failures and surface as 500.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("route has neither a price nor a price calculator")]
    Unpriced,
    #[error("unknown price calculator: {0}")]
    UnknownCalculator(String),
    #[error("failed to buffer request body: {0}")]
    BodyRead(String),
    #[error(transparent)]
    Calculator(#[from] PriceCalcError),
    #[error("invalid price amount: {0}")]
    Amount(#[from] MoneyAmountError),
}

/// Process-wide registry mapping calculator names to implementations.
///
/// Populated at wiring time; read-only afterwards.
#[derive(Clone, Default)]
pub struct CalculatorRegistry {
    calculators: HashMap<String, Arc<dyn PriceCalculator>>,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a calculator under a symbolic name.
    pub fn register(&mut self, name: impl Into<String>, calculator: Arc<dyn PriceCalculator>) {
        self.calculators.insert(name.into(), calculator);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PriceCalculator>> {
        self.calculators.get(name)
    }
}

impl std::fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("names", &self.calculators.keys().collect::<Vec<_>>())
            .finish()
    }
}
