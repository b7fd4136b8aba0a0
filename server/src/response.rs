//! Uniform JSON response envelope for the REST API.

use serde::{Deserialize, Serialize};

pub mod error_code {
    pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";

    pub const SYSTEM_ERROR_MESSAGE: &str =
        "An unexpected system error occurred. Please contact support if the issue persists.";
}

/// Envelope wrapping a single data object, or an error code and message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_message: Option<String>,
}

impl<T> SingleResponse<T> {
    pub fn of(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            err_code: None,
            err_message: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            err_code: Some(code.into()),
            err_message: Some(message.into()),
        }
    }
}
