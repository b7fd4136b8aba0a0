//! Core trait defining the verification and settlement interface for x402
//! facilitators.
//!
//! Implementors validate incoming payment payloads against requirements
//! ([`Facilitator::verify`]) and execute on-chain settlement
//! ([`Facilitator::settle`]). The payment middleware is generic over this
//! trait so that tests can substitute in-process stubs for the remote HTTP
//! facilitator.

use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::proto::{Kind, PaymentPayload, PaymentRequirements, SettlementResponse, VerificationResponse};

/// Asynchronous interface to an x402 payment facilitator.
pub trait Facilitator {
    /// The error type returned by this facilitator.
    type Error: Debug + Display;

    /// Verifies a payment payload against the given requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on transport or protocol failure. A payment
    /// the facilitator *rejects* is not an error; it comes back as
    /// [`VerificationResponse::Invalid`].
    fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<VerificationResponse, Self::Error>> + Send;

    /// Settles a verified payment on-chain.
    ///
    /// Callers must only pass payloads that already passed [`Facilitator::verify`].
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on transport or protocol failure. A settlement
    /// the facilitator *declines* comes back as [`SettlementResponse::Failure`].
    fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<SettlementResponse, Self::Error>> + Send;

    /// Enumerates the `(scheme, network)` pairs this facilitator can process.
    fn supported(&self) -> impl Future<Output = Result<HashSet<Kind>, Self::Error>> + Send;
}

impl<T: Facilitator> Facilitator for Arc<T> {
    type Error = T::Error;

    fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<VerificationResponse, Self::Error>> + Send {
        self.as_ref().verify(payload, requirements)
    }

    fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<SettlementResponse, Self::Error>> + Send {
        self.as_ref().settle(payload, requirements)
    }

    fn supported(&self) -> impl Future<Output = Result<HashSet<Kind>, Self::Error>> + Send {
        self.as_ref().supported()
    }
}
