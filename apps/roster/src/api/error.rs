//! Mapping of registry failures onto HTTP responses.
//!
//! Every error body has the shape `{ "error": "...", "fields": { ... } }`;
//! `fields` is only present for validation failures.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roster_core::{FieldErrors, RegistryError};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    /// A registry operation failed.
    Registry(RegistryError),
    /// A lookup matched nothing, or a route parameter named nothing known.
    NotFound(String),
    /// The request body was not the JSON the route expects.
    Malformed { status: StatusCode, message: String },
    /// The request budget of the rate limiter is exhausted.
    RateLimited,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(RegistryError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Registry(RegistryError::DuplicateId { .. }) => StatusCode::CONFLICT,
            Self::Registry(RegistryError::NotFound { .. } | RegistryError::EmptyExport) => {
                StatusCode::NOT_FOUND
            }
            Self::Registry(
                RegistryError::Storage(_) | RegistryError::Snapshot(_) | RegistryError::Encode(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Malformed { status, .. } => *status,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        Self::Registry(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Registry(RegistryError::Invalid(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Registry(RegistryError::Invalid(fields)) => ErrorBody {
                error: "invalid input".to_string(),
                fields: Some(fields),
            },
            Self::Registry(error) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %error, "registry failure");
                ErrorBody {
                    error: "internal error".to_string(),
                    fields: None,
                }
            }
            Self::Registry(error) => ErrorBody {
                error: error.to_string(),
                fields: None,
            },
            Self::NotFound(message) | Self::Malformed { message, .. } => ErrorBody {
                error: message.clone(),
                fields: None,
            },
            Self::RateLimited => ErrorBody {
                error: "rate limit exceeded".to_string(),
                fields: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
