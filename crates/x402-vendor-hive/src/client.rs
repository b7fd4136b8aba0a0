//! HTTP client for the Hive API.
//!
//! The client root is `base_url` + `/<account>`; the configured token header
//! is attached to every request. Error-status responses are mapped into
//! [`VendorError`] after attempting to parse Hive's `{errCode, errMessage}`
//! envelope out of the body.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use x402_types::config::LiteralOrEnv;
use x402_vendor::VendorError;

use crate::wire::{HiveResponse, ServiceCreateRequest, ServiceCreateResult, ServiceResult};

/// Hive's code for errors this adapter raises itself.
pub const VENDOR_ERROR: &str = "VENDOR_ERROR";

/// Hive API connection settings, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct HiveConfig {
    /// Gate for the adapter; the server refuses to start a vendor-less
    /// deployment API when false.
    #[serde(default = "hive_defaults::enabled")]
    pub enabled: bool,
    /// API origin, e.g. `https://api.hive.example.com`.
    pub base_url: String,
    /// Account segment appended to the base URL.
    pub account: String,
    /// Name of the header carrying the API token.
    #[serde(default = "hive_defaults::token_header_name")]
    pub token_header_name: String,
    /// The API token; supports `$VAR` / `${VAR}` environment references.
    pub token: LiteralOrEnv<String>,
}

pub mod hive_defaults {
    pub fn enabled() -> bool {
        true
    }

    pub fn token_header_name() -> String {
        "X-Api-Token".to_string()
    }
}

/// Errors constructing a [`HiveClient`] at startup.
#[derive(Debug, thiserror::Error)]
pub enum HiveSetupError {
    #[error("invalid hive base URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid hive token header: {0}")]
    Header(String),
    #[error("failed to construct HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared HTTP client for the Hive API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HiveClient {
    root: Url,
    client: Client,
}

impl HiveClient {
    pub fn try_new(config: &HiveConfig) -> Result<Self, HiveSetupError> {
        let mut normalized = config.base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let base = Url::parse(&normalized)?;
        let root = base.join(&format!("{}/", config.account))?;

        let header_name = HeaderName::from_bytes(config.token_header_name.as_bytes())
            .map_err(|e| HiveSetupError::Header(e.to_string()))?;
        let header_value = HeaderValue::from_str(&config.token)
            .map_err(|e| HiveSetupError::Header(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(header_name, header_value);

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { root, client })
    }

    /// `POST /services`
    pub async fn create_service(
        &self,
        request: &ServiceCreateRequest,
    ) -> Result<HiveResponse<ServiceCreateResult>, VendorError> {
        let url = self.endpoint("services")?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        read_envelope(response).await
    }

    /// `GET /services/{id}`
    pub async fn service_by_id(&self, id: &str) -> Result<HiveResponse<ServiceResult>, VendorError> {
        let url = self.endpoint(&format!("services/{id}"))?;
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        read_envelope(response).await
    }

    /// `GET /services/name/{name}`
    pub async fn service_by_name(
        &self,
        name: &str,
    ) -> Result<HiveResponse<ServiceResult>, VendorError> {
        let url = self.endpoint(&format!("services/name/{name}"))?;
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        read_envelope(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, VendorError> {
        self.root
            .join(path)
            .map_err(|e| VendorError::new(VENDOR_ERROR, format!("invalid hive endpoint: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> VendorError {
    VendorError::new(VENDOR_ERROR, format!("hive request failed: {err}"))
}

/// Parses a Hive response, turning HTTP error statuses into [`VendorError`].
///
/// For error statuses the body is still read and, when it parses as Hive's
/// envelope, its `errCode`/`errMessage` take precedence over the raw status.
async fn read_envelope<T>(response: reqwest::Response) -> Result<HiveResponse<T>, VendorError>
where
    T: DeserializeOwned + Default,
{
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_body(status.as_u16(), &body));
    }
    response
        .json::<HiveResponse<T>>()
        .await
        .map_err(|e| VendorError::new(VENDOR_ERROR, format!("invalid hive response: {e}")))
}

fn error_from_body(status: u16, body: &str) -> VendorError {
    let envelope: Option<HiveResponse<serde_json::Value>> = serde_json::from_str(body).ok();
    let code = envelope
        .as_ref()
        .and_then(|e| e.err_code.clone())
        .unwrap_or_else(|| status.to_string());
    let message = envelope
        .and_then(|e| e.err_message)
        .unwrap_or_else(|| format!("HTTP {status} {body}"));
    VendorError::new(code, message)
}
