use axum::{
    Json,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub const INTERNAL_ERROR_MESSAGE: &str = "Server error";
pub const UPSTREAM_AUTH_MESSAGE: &str = "Invalid or missing API key";
pub const UPSTREAM_QUOTA_MESSAGE: &str = "API quota exceeded";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body exceeds the configured size limit";

/// Every failure the gateway can report to a caller.
///
/// The `Display` text is the human readable `error` field of the response body,
/// `details` carries the underlying cause for diagnostics.
#[derive(Error, Debug, Serialize)]
pub enum GatewayError {
    #[error("{msg}")]
    Validation { msg: String },
    #[error("{}", UPSTREAM_AUTH_MESSAGE)]
    UpstreamAuth { details: Option<String> },
    #[error("{}", UPSTREAM_QUOTA_MESSAGE)]
    UpstreamQuota { details: Option<String> },
    #[error("{msg}")]
    Upstream {
        msg: String,
        details: Option<String>,
    },
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Internal {
        details: Option<String>,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GatewayError::Validation { msg: msg.into() }
    }

    pub fn upstream(msg: impl Into<String>, details: Option<String>) -> Self {
        GatewayError::Upstream {
            msg: msg.into(),
            details,
        }
    }

    pub fn internal(details: Option<String>) -> Self {
        GatewayError::Internal {
            details,
            source: None,
        }
    }

    /// Category name exposed to callers as the `code` field.
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "ValidationError",
            GatewayError::UpstreamAuth { .. } => "UpstreamAuthError",
            GatewayError::UpstreamQuota { .. } => "UpstreamQuotaError",
            GatewayError::Upstream { .. } => "UpstreamError",
            GatewayError::Internal { .. } => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamAuth { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::UpstreamQuota { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream { .. } | GatewayError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            GatewayError::Validation { .. } => None,
            GatewayError::UpstreamAuth { details }
            | GatewayError::UpstreamQuota { details }
            | GatewayError::Upstream { details, .. }
            | GatewayError::Internal { details, .. } => details.as_deref(),
        }
    }

    /// Drops the diagnostic details, for deployments that must not expose them.
    pub fn without_details(self) -> Self {
        match self {
            GatewayError::Validation { msg } => GatewayError::Validation { msg },
            GatewayError::UpstreamAuth { .. } => GatewayError::UpstreamAuth { details: None },
            GatewayError::UpstreamQuota { .. } => GatewayError::UpstreamQuota { details: None },
            GatewayError::Upstream { msg, .. } => GatewayError::Upstream { msg, details: None },
            GatewayError::Internal { source, .. } => GatewayError::Internal {
                details: None,
                source,
            },
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            details: self.details().map(str::to_string),
            code: self.category().to_string(),
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        GatewayError::Internal {
            details: Some(format!("{e:#}")),
            source: Some(e),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return GatewayError::validation(BODY_TOO_LARGE_MESSAGE);
        }
        GatewayError::validation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of the failure.
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Failure category, e.g. `ValidationError`.
    pub code: String,
}
