//! Gateway results and the normalizer that turns call failures into
//! synthetic HTTP 500 responses.

use std::future::Future;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure raised by a gateway call before a usable HTTP response exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connectivity problems: unreachable host, timeout, broken connection.
    #[error("{0}")]
    Transport(String),

    /// Anything else that went wrong while performing the call.
    #[error("{0}")]
    Unexpected(String),
}

/// HTTP-shaped outcome of a gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: Option<T>,
    pub error_body: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(body: T) -> Self {
        Self { status: StatusCode::OK, body: Some(body), error_body: None }
    }

    /// A successful response that carried no body.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None, error_body: None }
    }

    pub fn error(status: StatusCode, error_body: impl Into<String>) -> Self {
        Self { status, body: None, error_body: Some(error_body.into()) }
    }

    pub fn is_successful(&self) -> bool {
        self.status.is_success()
    }
}

/// Runs `call`, converting a [`GatewayError`] into a 500 response whose
/// error body tells transport failures apart from unexpected ones.
pub async fn api_response<T, F, Fut>(call: F) -> ApiResponse<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ApiResponse<T>, GatewayError>>,
{
    match call().await {
        Ok(response) => response,
        Err(GatewayError::Transport(message)) => {
            tracing::warn!(%message, "gateway call failed: transport");
            ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Network error: {message}"))
        }
        Err(GatewayError::Unexpected(message)) => {
            tracing::warn!(%message, "gateway call failed: unexpected");
            ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, format!("Runtime error: {message}"))
        }
    }
}
