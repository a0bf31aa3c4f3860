//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::PetraderError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

pub fn status_from_error(err: &PetraderError) -> StatusCode {
    match err {
        PetraderError::Validation { .. }
        | PetraderError::ConfigParse { .. }
        | PetraderError::ConfigMissing { .. }
        | PetraderError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        PetraderError::RuleNotFound { .. } => StatusCode::NOT_FOUND,
        PetraderError::Directory { .. }
        | PetraderError::EmptyUniverse
        | PetraderError::CompanyData { .. }
        | PetraderError::PriceUnavailable { .. }
        | PetraderError::Database { .. }
        | PetraderError::DatabaseQuery { .. }
        | PetraderError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PetraderError> for WebError {
    fn from(err: PetraderError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
