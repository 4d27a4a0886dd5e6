//! API error codes, error type, and the JSON extractor that reports through it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use esa_runtime::RegistryError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ── Error code constants ────────────────────────────────────────────

/// Invalid or missing parameters.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
/// Orchestrator or other collaborator not available.
pub const NOT_AVAILABLE: &str = "NOT_AVAILABLE";
/// Operation not valid in the current state.
pub const INVALID_OPERATION: &str = "INVALID_OPERATION";
/// Host-applied timeout elapsed.
pub const TIMEOUT: &str = "TIMEOUT";
/// Agent identity is not registered.
pub const AGENT_NOT_FOUND: &str = "AGENT_NOT_FOUND";
/// Workflow identity is unknown.
pub const WORKFLOW_NOT_FOUND: &str = "WORKFLOW_NOT_FOUND";
/// Task template or decision preset is unknown.
pub const TEMPLATE_NOT_FOUND: &str = "TEMPLATE_NOT_FOUND";

/// Wire-format error body, nested under `"error"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g. `AGENT_NOT_FOUND`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Requested resource not found (404).
    #[error("{message}")]
    NotFound {
        /// Specific error code (e.g. `AGENT_NOT_FOUND`).
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Required collaborator missing (503).
    #[error("{message}")]
    NotAvailable {
        /// Description.
        message: String,
    },

    /// Malformed body or path parameter (400).
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Request conflicts with current state (409).
    #[error("{message}")]
    InvalidOperation {
        /// Description.
        message: String,
    },

    /// Generation-backed request exceeded the host timeout (504).
    #[error("{message}")]
    Timeout {
        /// Description.
        message: String,
    },

    /// Internal server error (500).
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for [`ApiError::InvalidParams`].
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { code, .. } => *code,
            Self::NotAvailable { .. } => NOT_AVAILABLE,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::InvalidOperation { .. } => INVALID_OPERATION,
            Self::Timeout { .. } => TIMEOUT,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// HTTP status for this variant.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidOperation { .. } => StatusCode::CONFLICT,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> ApiErrorBody {
        ApiErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::AgentNotFound(_) => Self::NotFound {
                code: AGENT_NOT_FOUND,
                message,
            },
            RegistryError::WorkflowNotFound(_) => Self::NotFound {
                code: WORKFLOW_NOT_FOUND,
                message,
            },
            RegistryError::UnknownTemplate { .. } => Self::NotFound {
                code: TEMPLATE_NOT_FOUND,
                message,
            },
            RegistryError::NoOrchestrator => Self::NotAvailable { message },
            RegistryError::InvalidWorkflowTransition { .. } => Self::InvalidOperation { message },
            RegistryError::ReservedIdentity(_) | RegistryError::UnknownSpecialization(_) => {
                Self::InvalidParams { message }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.code(), error = %self, "request failed");
        }
        let body = serde_json::json!({ "error": self.to_error_body() });
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejection is an [`ApiError`].
///
/// Malformed or mistyped bodies produce the same `INVALID_PARAMS` envelope as
/// every other client error instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ApiError {
    ApiError::invalid_params(rejection.body_text())
}
