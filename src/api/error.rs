use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::api::types::ErrorResponse;
use crate::error::PostCovidError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors surfaced to HTTP clients. Two kinds only.
///
/// A missing required field is the one client error and names the field.
/// Everything else, malformed bodies and bad values included, keeps its
/// detail for the log and answers with a fixed string.
#[derive(Debug)]
pub enum ApiError {
    MissingField(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Missing required feature: {field}"),
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<PostCovidError> for ApiError {
    fn from(err: PostCovidError) -> Self {
        match err {
            PostCovidError::MissingFeature(field) => Self::MissingField(field),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(detail = %detail, "request failed");
        }
        let body = ErrorResponse {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
