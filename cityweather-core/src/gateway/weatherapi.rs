use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    model::{CityCandidate, WeatherSnapshot},
    response::{ApiResponse, GatewayError},
};

use super::WeatherGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1/";

/// Gateway backed by the weatherapi.com REST API.
#[derive(Debug, Clone)]
pub struct WeatherApiGateway {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiGateway {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, DEFAULT_BASE_URL.to_string(), Client::new())
    }

    pub fn with_client(api_key: String, base_url: String, http: Client) -> Self {
        Self { api_key, base_url, http }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        q: &str,
    ) -> Result<ApiResponse<T>, GatewayError> {
        let res = self
            .http
            .get(self.endpoint(path))
            .query(&[("key", self.api_key.as_str()), ("q", q)])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(path, %status, body = %truncate_body(&body), "weatherapi request rejected");
        }

        decode_response(status, &body)
    }
}

#[async_trait]
impl WeatherGateway for WeatherApiGateway {
    async fn search(&self, query: &str) -> Result<ApiResponse<Vec<CityCandidate>>, GatewayError> {
        self.fetch("search.json", query).await
    }

    async fn current_weather(&self, city: &str) -> Result<ApiResponse<WeatherSnapshot>, GatewayError> {
        self.fetch("current.json", city).await
    }
}

/// Maps a raw HTTP status and body text onto an [`ApiResponse`].
///
/// Non-2xx keeps the body text verbatim as the error body. A 2xx body that is
/// empty or `null` is a successful response without a body.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<T>, GatewayError> {
    if !status.is_success() {
        return Ok(ApiResponse::error(status, body));
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ApiResponse::empty(status));
    }

    let parsed = serde_json::from_str(trimmed).map_err(|e| {
        GatewayError::Unexpected(format!("Failed to parse weatherapi response: {e}"))
    })?;

    Ok(ApiResponse { status, body: Some(parsed), error_body: None })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
