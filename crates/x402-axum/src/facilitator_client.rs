//! A [`Facilitator`] implementation backed by a remote x402 facilitator over HTTP.
//!
//! The client speaks the facilitator's `/verify`, `/settle`, and `/supported`
//! endpoints. It is cheap to clone and internally shares a connection pool via
//! `reqwest::Client`, so one instance can serve many concurrent requests.
//!
//! ## Construction
//!
//! ```rust
//! use x402_axum::facilitator_client::FacilitatorClient;
//!
//! let facilitator = FacilitatorClient::try_from("https://facilitator.example.com").unwrap();
//! ```
//!
//! Trailing slashes on the base URL are stripped once at construction; the
//! endpoint URLs are computed eagerly. The underlying client uses a 5-second
//! connect timeout. No overall request timeout is applied unless one is set
//! with [`FacilitatorClient::with_timeout`], since the facilitator may
//! legitimately take up to the advertised `maxTimeoutSeconds` to finalize.

use http::StatusCode;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use x402_types::facilitator::Facilitator;
use x402_types::proto::{
    FacilitatorRequest, Kind, PaymentPayload, PaymentRequirements, SettlementResponse,
    SupportedKindsResponse, VerificationResponse,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A client for communicating with a remote x402 facilitator.
#[derive(Clone, Debug)]
pub struct FacilitatorClient {
    /// Base URL of the facilitator (e.g. `https://facilitator.example/`)
    base_url: Url,
    /// Full URL for `POST /verify` requests
    verify_url: Url,
    /// Full URL for `POST /settle` requests
    settle_url: Url,
    /// Full URL for `GET /supported` requests
    supported_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional overall request timeout
    timeout: Option<Duration>,
}

/// Errors that can occur while interacting with a remote facilitator.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorClientError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl FacilitatorClient {
    /// Constructs a new [`FacilitatorClient`] from a base URL.
    pub fn try_new(base_url: Url) -> Result<Self, FacilitatorClientError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| FacilitatorClientError::Http {
                context: "Failed to construct HTTP client",
                source: e,
            })?;
        let verify_url =
            base_url
                .join("./verify")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "Failed to construct ./verify URL",
                    source: e,
                })?;
        let settle_url =
            base_url
                .join("./settle")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "Failed to construct ./settle URL",
                    source: e,
                })?;
        let supported_url =
            base_url
                .join("./supported")
                .map_err(|e| FacilitatorClientError::UrlParse {
                    context: "Failed to construct ./supported URL",
                    source: e,
                })?;
        Ok(Self {
            client,
            base_url,
            verify_url,
            settle_url,
            supported_url,
            timeout: None,
        })
    }

    /// Returns the base URL used by this client.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sets an overall timeout for all future requests.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut this = self.clone();
        this.timeout = Some(timeout);
        this
    }

    /// Sends a `POST /verify` request to the facilitator.
    pub async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<VerificationResponse, FacilitatorClientError> {
        let request = FacilitatorRequest::new(payload, requirements);
        self.post_json(&self.verify_url, "POST /verify", &request)
            .await
    }

    /// Sends a `POST /settle` request to the facilitator.
    pub async fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<SettlementResponse, FacilitatorClientError> {
        let request = FacilitatorRequest::new(payload, requirements);
        self.post_json(&self.settle_url, "POST /settle", &request)
            .await
    }

    /// Sends a `GET /supported` request and collects the kinds into a set.
    pub async fn supported(&self) -> Result<HashSet<Kind>, FacilitatorClientError> {
        let response: SupportedKindsResponse =
            self.get_json(&self.supported_url, "GET /supported").await?;
        Ok(response.kinds.into_iter().collect())
    }

    /// Generic POST helper: JSON body out, status check, JSON body in.
    ///
    /// `context` is a human-readable identifier used in tracing and error
    /// messages (e.g. `"POST /verify"`). Anything other than HTTP 200 is a
    /// failure.
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, FacilitatorClientError>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.post(url.clone()).json(payload);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http { context, source: e })?;

        let result = if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| FacilitatorClientError::ResponseBodyRead { context, source: e })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        };
        if let Err(err) = &result {
            tracing::error!(%err, context, "request to facilitator failed");
        }
        result
    }

    /// Generic GET helper mirroring [`Self::post_json`].
    async fn get_json<R>(
        &self,
        url: &Url,
        context: &'static str,
    ) -> Result<R, FacilitatorClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.get(url.clone());
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| FacilitatorClientError::Http { context, source: e })?;

        let result = if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| FacilitatorClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| FacilitatorClientError::ResponseBodyRead { context, source: e })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        };
        if let Err(err) = &result {
            tracing::error!(%err, context, "request to facilitator failed");
        }
        result
    }
}

impl Facilitator for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<VerificationResponse, Self::Error>> + Send {
        FacilitatorClient::verify(self, payload, requirements)
    }

    fn settle(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> impl Future<Output = Result<SettlementResponse, Self::Error>> + Send {
        FacilitatorClient::settle(self, payload, requirements)
    }

    fn supported(&self) -> impl Future<Output = Result<HashSet<Kind>, Self::Error>> + Send {
        FacilitatorClient::supported(self)
    }
}

/// Parses a string URL into a `FacilitatorClient`, normalizing trailing slashes.
impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, FacilitatorClientError> {
        // Strip trailing slashes, then add a single one so ./ joins append.
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| FacilitatorClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        FacilitatorClient::try_new(url)
    }
}
