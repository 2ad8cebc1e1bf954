//! Error-to-response mapping for the console API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::WalletError;

/// A [`WalletError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub WalletError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &WalletError) -> StatusCode {
    match err {
        WalletError::NotConnected => StatusCode::CONFLICT,
        WalletError::Initialization(_) => StatusCode::SERVICE_UNAVAILABLE,
        WalletError::Connection(_) => StatusCode::UNAUTHORIZED,
        WalletError::Transaction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WalletError::Config(_) | WalletError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        WalletError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        WalletError::Sdk(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
