//! Wire format types for x402 protocol version 1.
//!
//! These types mirror the x402 "PaymentRequirements" / "PaymentPayload" JSON
//! schemas. All types serialize with camelCase field names. The protocol
//! version is pinned by [`X402Version1`], which serializes as the integer `1`
//! and refuses anything else at decode time.
//!
//! # Key Types
//!
//! - [`PaymentRequirements`] - Payment terms offered by the server for one resource
//! - [`PaymentPayload`] - The client's proof-of-payment envelope (`X-PAYMENT` header)
//! - [`VerificationResponse`] / [`SettlementResponse`] - Facilitator results
//! - [`SettlementResponseHeader`] - The `X-PAYMENT-RESPONSE` receipt header
//! - [`PaymentRequiredResponse`] - HTTP 402 response body
//! - [`Kind`] - A `(scheme, network)` capability pair from `GET /supported`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;

use crate::util::Base64Bytes;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1`. Deserialization of any other integer fails,
/// which makes unsupported payload versions a decode error rather than a
/// runtime branch.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl X402Version1 {
    pub const VALUE: u8 = 1;
}

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version1)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Errors decoding or encoding a Base64+JSON protocol header.
#[derive(Debug, thiserror::Error)]
pub enum PaymentHeaderError {
    /// The header value is not valid standard Base64.
    #[error("invalid base64 in payment header: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not valid JSON for the expected shape.
    #[error("invalid payment header payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payment terms set by the server for one protected resource.
///
/// Included in every 402 response and echoed to the facilitator on both
/// `/verify` and `/settle`. `max_amount_required` is a decimal string in
/// atomic token units (e.g. `"30000"` for 0.03 of a 6-decimals token).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The maximum amount required, in atomic token units.
    pub max_amount_required: String,
    /// The token contract address.
    pub asset: String,
    /// The recipient address for payment.
    pub pay_to: String,
    /// The fully-qualified URL of the resource being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the expected response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Optional JSON schema for the resource output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// Maximum time in seconds for payment completion.
    pub max_timeout_seconds: u64,
    /// Scheme-specific extra data, e.g. an EIP-712 domain `{name, version}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// The client's proof-of-payment envelope.
///
/// Carried Base64-encoded in the `X-PAYMENT` request header. The `payload`
/// field is scheme-specific and opaque to this server; only the facilitator
/// interprets it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme; must equal the selected requirement's scheme.
    pub scheme: String,
    /// The network name; must equal the selected requirement's network.
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: serde_json::Value,
}

impl PaymentPayload {
    /// Decodes an `X-PAYMENT` header value: Base64 decode, then JSON decode.
    pub fn from_header(header: &str) -> Result<Self, PaymentHeaderError> {
        let bytes = Base64Bytes::from(header.as_bytes()).decode()?;
        let payload = serde_json::from_slice(&bytes)?;
        Ok(payload)
    }

    /// Encodes this payload as an `X-PAYMENT` header value: JSON, then Base64.
    pub fn to_header(&self) -> Result<String, PaymentHeaderError> {
        let json = serde_json::to_vec(self)?;
        Ok(Base64Bytes::encode(json).to_string())
    }
}

/// Result of a facilitator `POST /verify` call.
///
/// Indicates whether the payment authorization is valid and identifies the
/// payer. If invalid, carries the facilitator-provided reason.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationResponse {
    /// The payload matches the requirements and passes all checks.
    Valid { payer: String },
    /// The payload was well-formed but failed verification.
    Invalid {
        reason: String,
        payer: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationResponseWire {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default)]
    invalid_reason: Option<String>,
}

impl Serialize for VerificationResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            VerificationResponse::Valid { payer } => VerificationResponseWire {
                is_valid: true,
                payer: Some(payer.clone()),
                invalid_reason: None,
            },
            VerificationResponse::Invalid { reason, payer } => VerificationResponseWire {
                is_valid: false,
                payer: payer.clone(),
                invalid_reason: Some(reason.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerificationResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerificationResponseWire::deserialize(deserializer)?;
        match wire.is_valid {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                Ok(VerificationResponse::Valid { payer })
            }
            false => {
                let reason = wire
                    .invalid_reason
                    .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
                Ok(VerificationResponse::Invalid {
                    reason,
                    payer: wire.payer,
                })
            }
        }
    }
}

/// Result of a facilitator `POST /settle` call.
///
/// On success carries the on-chain transaction metadata. Fields the
/// facilitator omits (or sends as null) are normalized to empty strings at
/// decode time, so a [`SettlementResponseHeader`] built from a `Success`
/// never contains nulls.
#[derive(Clone, Debug, PartialEq)]
pub enum SettlementResponse {
    /// Settlement succeeded.
    Success {
        /// The chain transaction hash.
        transaction: String,
        /// The network where settlement occurred.
        network: String,
        /// The address that paid.
        payer: String,
    },
    /// Settlement failed.
    Failure {
        /// The facilitator-provided reason, if any.
        reason: Option<String>,
        /// The network where settlement was attempted.
        network: Option<String>,
        payer: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettlementResponseWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    payer: Option<String>,
}

impl Serialize for SettlementResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            SettlementResponse::Success {
                transaction,
                network,
                payer,
            } => SettlementResponseWire {
                success: true,
                error_reason: None,
                transaction: Some(transaction.clone()),
                network: Some(network.clone()),
                payer: Some(payer.clone()),
            },
            SettlementResponse::Failure {
                reason,
                network,
                payer,
            } => SettlementResponseWire {
                success: false,
                error_reason: reason.clone(),
                transaction: Some(String::new()),
                network: network.clone(),
                payer: payer.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettlementResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettlementResponseWire::deserialize(deserializer)?;
        match wire.success {
            true => Ok(SettlementResponse::Success {
                transaction: wire.transaction.unwrap_or_default(),
                network: wire.network.unwrap_or_default(),
                payer: wire.payer.unwrap_or_default(),
            }),
            false => Ok(SettlementResponse::Failure {
                reason: wire.error_reason,
                network: wire.network,
                payer: wire.payer,
            }),
        }
    }
}

/// The settlement receipt emitted back to the client after a successful
/// settle, carried Base64-encoded in the `X-PAYMENT-RESPONSE` header.
///
/// `transaction` and `network` are never null on the wire: absent values are
/// written as empty strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponseHeader {
    /// Always true when this header is emitted.
    pub success: bool,
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub payer: String,
}

impl SettlementResponseHeader {
    /// Builds the receipt for a successful settlement.
    pub fn new(transaction: String, network: String, payer: String) -> Self {
        Self {
            success: true,
            transaction,
            network,
            payer,
        }
    }

    /// Encodes this receipt as an `X-PAYMENT-RESPONSE` header value.
    pub fn to_header(&self) -> Result<String, PaymentHeaderError> {
        let json = serde_json::to_vec(self)?;
        Ok(Base64Bytes::encode(json).to_string())
    }

    /// Decodes an `X-PAYMENT-RESPONSE` header value.
    pub fn from_header(header: &str) -> Result<Self, PaymentHeaderError> {
        let bytes = Base64Bytes::from(header.as_bytes()).decode()?;
        let decoded = serde_json::from_slice(&bytes)?;
        Ok(decoded)
    }
}

/// HTTP 402 Payment Required response body.
///
/// This server always emits exactly one `accepts` entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// Acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Human-readable explanation of why payment is (still) required.
    pub error: String,
}

impl PaymentRequiredResponse {
    pub fn new(requirements: PaymentRequirements, error: impl Into<String>) -> Self {
        Self {
            x402_version: X402Version1,
            accepts: vec![requirements],
            error: error.into(),
        }
    }
}

/// A payment scheme + network pair a facilitator can process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kind {
    /// Payment scheme identifier (e.g. "exact").
    pub scheme: String,
    /// Network identifier (e.g. "base-sepolia").
    pub network: String,
}

/// Response body of a facilitator `GET /supported` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupportedKindsResponse {
    #[serde(default)]
    pub kinds: Vec<Kind>,
}

/// Request envelope for both `POST /verify` and `POST /settle`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest<'a> {
    pub x402_version: X402Version1,
    pub payment_payload: &'a PaymentPayload,
    pub payment_requirements: &'a PaymentRequirements,
}

impl<'a> FacilitatorRequest<'a> {
    pub fn new(payload: &'a PaymentPayload, requirements: &'a PaymentRequirements) -> Self {
        Self {
            x402_version: X402Version1,
            payment_payload: payload,
            payment_requirements: requirements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(scheme: &str, network: &str, inner: serde_json::Value) -> PaymentPayload {
        PaymentPayload {
            x402_version: X402Version1,
            scheme: scheme.to_string(),
            network: network.to_string(),
            payload: inner,
        }
    }

    #[test]
    fn test_payload_header_roundtrip_ascii() {
        let original = payload("exact", "base-sepolia", json!({"signature": "0xabc"}));
        let header = original.to_header().unwrap();
        let decoded = PaymentPayload::from_header(&header).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_payload_header_roundtrip_non_ascii() {
        let original = payload("exact", "base-sepolia", json!({"memo": "café ☕ 支払い"}));
        let header = original.to_header().unwrap();
        assert!(!header.contains('\n'));
        let decoded = PaymentPayload::from_header(&header).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_payload_header_rejects_bad_base64() {
        let err = PaymentPayload::from_header("not_base64!!!").unwrap_err();
        assert!(matches!(err, PaymentHeaderError::Base64(_)));
    }

    #[test]
    fn test_payload_header_rejects_bad_json() {
        let header = Base64Bytes::encode(b"{\"x402Version\":").to_string();
        let err = PaymentPayload::from_header(&header).unwrap_err();
        assert!(matches!(err, PaymentHeaderError::Json(_)));
    }

    #[test]
    fn test_payload_rejects_unsupported_version() {
        let header = Base64Bytes::encode(
            json!({"x402Version": 2, "scheme": "exact", "network": "base-sepolia", "payload": {}})
                .to_string(),
        )
        .to_string();
        assert!(PaymentPayload::from_header(&header).is_err());
    }

    #[test]
    fn test_verification_response_valid() {
        let decoded: VerificationResponse =
            serde_json::from_value(json!({"isValid": true, "payer": "0xPayer"})).unwrap();
        assert_eq!(
            decoded,
            VerificationResponse::Valid {
                payer: "0xPayer".to_string()
            }
        );
    }

    #[test]
    fn test_verification_response_invalid() {
        let decoded: VerificationResponse = serde_json::from_value(
            json!({"isValid": false, "invalidReason": "insufficient_funds"}),
        )
        .unwrap();
        assert_eq!(
            decoded,
            VerificationResponse::Invalid {
                reason: "insufficient_funds".to_string(),
                payer: None
            }
        );
    }

    #[test]
    fn test_settlement_response_normalizes_null_fields() {
        let decoded: SettlementResponse = serde_json::from_value(
            json!({"success": true, "transaction": null, "network": null, "payer": "0xPayer"}),
        )
        .unwrap();
        let SettlementResponse::Success {
            transaction,
            network,
            payer,
        } = decoded
        else {
            panic!("expected success");
        };
        assert_eq!(transaction, "");
        assert_eq!(network, "");
        assert_eq!(payer, "0xPayer");
    }

    #[test]
    fn test_settlement_response_failure() {
        let decoded: SettlementResponse = serde_json::from_value(
            json!({"success": false, "errorReason": "tx_reverted", "transaction": "", "network": "base-sepolia"}),
        )
        .unwrap();
        assert_eq!(
            decoded,
            SettlementResponse::Failure {
                reason: Some("tx_reverted".to_string()),
                network: Some("base-sepolia".to_string()),
                payer: None,
            }
        );
    }

    #[test]
    fn test_settlement_header_roundtrip() {
        let original = SettlementResponseHeader::new(
            "0xTX".to_string(),
            "base-sepolia".to_string(),
            "0xPayer".to_string(),
        );
        let header = original.to_header().unwrap();
        let decoded = SettlementResponseHeader::from_header(&header).unwrap();
        assert_eq!(original, decoded);
        assert!(decoded.success);
    }

    #[test]
    fn test_settlement_header_empty_fields_survive_roundtrip() {
        let original =
            SettlementResponseHeader::new(String::new(), String::new(), "0xPayer".to_string());
        let decoded =
            SettlementResponseHeader::from_header(&original.to_header().unwrap()).unwrap();
        assert_eq!(decoded.transaction, "");
        assert_eq!(decoded.network, "");
    }

    #[test]
    fn test_payment_required_body_shape() {
        let requirements = PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            max_amount_required: "10000".to_string(),
            asset: "0xAsset".to_string(),
            pay_to: "0xPayee".to_string(),
            resource: "http://localhost/pay".to_string(),
            description: String::new(),
            mime_type: None,
            output_schema: None,
            max_timeout_seconds: 30,
            extra: None,
        };
        let body = PaymentRequiredResponse::new(requirements, "X-PAYMENT header is required");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["x402Version"], 1);
        assert_eq!(value["accepts"].as_array().unwrap().len(), 1);
        assert_eq!(value["accepts"][0]["maxAmountRequired"], "10000");
        assert_eq!(value["error"], "X-PAYMENT header is required");
        // optional fields are omitted, not null
        assert!(value["accepts"][0].get("mimeType").is_none());
    }

    #[test]
    fn test_kind_set_semantics() {
        use std::collections::HashSet;
        let parsed: SupportedKindsResponse = serde_json::from_value(json!({
            "kinds": [
                {"scheme": "exact", "network": "base-sepolia"},
                {"scheme": "exact", "network": "base-sepolia"},
                {"scheme": "exact", "network": "base"}
            ]
        }))
        .unwrap();
        let set: HashSet<Kind> = parsed.kinds.into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_facilitator_request_envelope_shape() {
        let p = payload("exact", "base-sepolia", json!({}));
        let requirements = PaymentRequirements {
            scheme: "exact".to_string(),
            network: "base-sepolia".to_string(),
            max_amount_required: "10000".to_string(),
            asset: "0xAsset".to_string(),
            pay_to: "0xPayee".to_string(),
            resource: "http://localhost/pay".to_string(),
            description: String::new(),
            mime_type: None,
            output_schema: None,
            max_timeout_seconds: 30,
            extra: None,
        };
        let envelope =
            serde_json::to_value(FacilitatorRequest::new(&p, &requirements)).unwrap();
        assert_eq!(envelope["x402Version"], 1);
        assert_eq!(envelope["paymentPayload"]["scheme"], "exact");
        assert_eq!(envelope["paymentRequirements"]["payTo"], "0xPayee");
    }
}
