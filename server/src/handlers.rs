//! REST routes for the service-deployment API.
//!
//! - `POST /apis/x402/v1/services`: x402-paid service creation (201 on success)
//! - `GET  /apis/x402/v1/services/{id}`: service status (unpaid)
//!
//! Errors map to the uniform envelope: validation failures become 400
//! `BAD_REQUEST`, vendor failures become 502 with the vendor's error code.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use std::any::Any;
use std::sync::Arc;

use x402_axum::X402Middleware;
use x402_types::facilitator::Facilitator;
use x402_vendor::DeployVendor;

use crate::response::{SingleResponse, error_code};
use crate::service::{ServiceCreation, ServiceCreated, ServiceError, ServiceView, Services};

/// Price of one service deployment, in human-readable token units.
const SERVICE_PRICE: &str = "0.01";

/// Builds the API router. When a payment middleware is given, service
/// creation is placed behind it.
pub fn routes<V, F>(
    services: Arc<Services<V>>,
    x402: Option<X402Middleware<F>>,
) -> Router
where
    V: DeployVendor + 'static,
    F: Facilitator + Clone + Send + Sync + 'static,
{
    let create = post(create_service::<V>);
    let create = match x402 {
        Some(x402) => create.layer(
            x402.price(SERVICE_PRICE)
                .with_description("Service deployment"),
        ),
        None => create,
    };
    Router::new()
        .route("/apis/x402/v1/services", create)
        .route("/apis/x402/v1/services/{id}", get(service_status::<V>))
        .with_state(services)
}

async fn create_service<V>(
    State(services): State<Arc<Services<V>>>,
    Json(cmd): Json<ServiceCreation>,
) -> Result<(StatusCode, Json<SingleResponse<ServiceCreated>>), AppError>
where
    V: DeployVendor,
{
    let created = services.create(cmd).await?;
    Ok((StatusCode::CREATED, Json(SingleResponse::of(created))))
}

async fn service_status<V>(
    State(services): State<Arc<Services<V>>>,
    Path(id): Path<String>,
) -> Result<Json<SingleResponse<ServiceView>>, AppError>
where
    V: DeployVendor,
{
    let view = services.status(&id).await?;
    Ok(Json(SingleResponse::of(view)))
}

/// Catch-all for handler panics: a 500 with the uniform envelope.
pub fn system_error_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(%detail, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SingleResponse::<()>::failure(
            error_code::SYSTEM_ERROR,
            error_code::SYSTEM_ERROR_MESSAGE,
        )),
    )
        .into_response()
}

/// Maps domain errors onto HTTP responses with the uniform envelope.
pub struct AppError(ServiceError);

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Validation(message) => {
                tracing::info!(%message, "request validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(SingleResponse::<()>::failure(error_code::BAD_REQUEST, message)),
                )
                    .into_response()
            }
            ServiceError::Vendor(err) => {
                tracing::error!(code = %err.code, message = %err.message, "vendor call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(SingleResponse::<()>::failure(err.code, err.message)),
                )
                    .into_response()
            }
        }
    }
}
