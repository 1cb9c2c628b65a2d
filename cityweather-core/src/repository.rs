use std::sync::Arc;

use crate::{
    gateway::WeatherGateway,
    model::{CityCandidate, WeatherSnapshot},
    response::{ApiResponse, api_response},
};

/// Gateway access with every call routed through [`api_response`], so
/// callers only ever see HTTP-shaped results.
#[derive(Debug, Clone)]
pub struct Repository {
    gateway: Arc<dyn WeatherGateway>,
}

impl Repository {
    pub fn new(gateway: Arc<dyn WeatherGateway>) -> Self {
        Self { gateway }
    }

    pub async fn search_for_city(&self, query: &str) -> ApiResponse<Vec<CityCandidate>> {
        api_response(|| self.gateway.search(query)).await
    }

    pub async fn weather_details(&self, city: &str) -> ApiResponse<WeatherSnapshot> {
        api_response(|| self.gateway.current_weather(city)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::GatewayError;
    use crate::testing::FakeGateway;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn search_forwards_query_and_returns_response() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_search("Paris", ApiResponse::success(vec![CityCandidate {
            name: "Paris".into(),
            ..Default::default()
        }]));

        let repo = Repository::new(gateway.clone());
        let res = repo.search_for_city("Paris").await;

        assert!(res.is_successful());
        assert_eq!(res.body.unwrap()[0].name, "Paris");
        assert_eq!(gateway.search_calls(), vec!["Paris".to_string()]);
    }

    #[tokio::test]
    async fn weather_transport_failure_is_normalized() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather_failure("London", GatewayError::Transport("connection reset".into()));

        let repo = Repository::new(gateway.clone());
        let res = repo.weather_details("London").await;

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.error_body.as_deref(), Some("Network error: connection reset"));
        assert_eq!(gateway.weather_calls(), vec!["London".to_string()]);
    }
}
