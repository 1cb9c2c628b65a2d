use crate::{
    Config,
    gateway::weatherapi::WeatherApiGateway,
    model::{CityCandidate, WeatherSnapshot},
    response::{ApiResponse, GatewayError},
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// The two remote calls the pipelines depend on.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    /// City search by free-text query.
    async fn search(&self, query: &str) -> Result<ApiResponse<Vec<CityCandidate>>, GatewayError>;

    /// Current conditions for a city name.
    async fn current_weather(&self, city: &str) -> Result<ApiResponse<WeatherSnapshot>, GatewayError>;
}

/// Construct the weatherapi.com gateway from config.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherGateway>> {
    let api_key = config.api_key()?;

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().context("Failed to build HTTP client")?;

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| weatherapi::DEFAULT_BASE_URL.to_string());

    Ok(Arc::new(WeatherApiGateway::with_client(api_key, base_url, http)))
}
