//! In-memory gateway for tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    gateway::WeatherGateway,
    model::{CityCandidate, WeatherSnapshot},
    response::{ApiResponse, GatewayError},
};

#[derive(Clone)]
struct Scripted<T> {
    result: Result<ApiResponse<T>, GatewayError>,
    delay: Duration,
}

impl<T> Scripted<T> {
    fn new(result: Result<ApiResponse<T>, GatewayError>) -> Self {
        Self { result, delay: Duration::ZERO }
    }
}

#[derive(Default)]
struct Script {
    search: HashMap<String, Scripted<Vec<CityCandidate>>>,
    weather: HashMap<String, Scripted<WeatherSnapshot>>,
    search_calls: Vec<String>,
    weather_calls: Vec<String>,
}

/// Answers from a per-argument script. Unscripted searches return an empty
/// list, unscripted weather lookups a default snapshot.
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<Script>,
}

impl std::fmt::Debug for FakeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeGateway").finish_non_exhaustive()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn on_search(&self, query: &str, response: ApiResponse<Vec<CityCandidate>>) {
        self.lock().search.insert(query.into(), Scripted::new(Ok(response)));
    }

    pub fn on_search_failure(&self, query: &str, err: GatewayError) {
        self.lock().search.insert(query.into(), Scripted::new(Err(err)));
    }

    pub fn on_weather(&self, city: &str, response: ApiResponse<WeatherSnapshot>) {
        self.lock().weather.insert(city.into(), Scripted::new(Ok(response)));
    }

    pub fn on_weather_failure(&self, city: &str, err: GatewayError) {
        self.lock().weather.insert(city.into(), Scripted::new(Err(err)));
    }

    /// Make the search for `query` take `delay` before answering.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.lock()
            .search
            .entry(query.into())
            .or_insert_with(|| Scripted::new(Ok(ApiResponse::success(vec![]))))
            .delay = delay;
    }

    pub fn delay_weather(&self, city: &str, delay: Duration) {
        self.lock()
            .weather
            .entry(city.into())
            .or_insert_with(|| Scripted::new(Ok(ApiResponse::success(WeatherSnapshot::default()))))
            .delay = delay;
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.lock().search_calls.clone()
    }

    pub fn weather_calls(&self) -> Vec<String> {
        self.lock().weather_calls.clone()
    }
}

#[async_trait]
impl WeatherGateway for FakeGateway {
    async fn search(&self, query: &str) -> Result<ApiResponse<Vec<CityCandidate>>, GatewayError> {
        let scripted = {
            let mut script = self.lock();
            script.search_calls.push(query.to_string());
            script
                .search
                .get(query)
                .cloned()
                .unwrap_or_else(|| Scripted::new(Ok(ApiResponse::success(vec![]))))
        };
        tokio::time::sleep(scripted.delay).await;
        scripted.result
    }

    async fn current_weather(&self, city: &str) -> Result<ApiResponse<WeatherSnapshot>, GatewayError> {
        let scripted = {
            let mut script = self.lock();
            script.weather_calls.push(city.to_string());
            script
                .weather
                .get(city)
                .cloned()
                .unwrap_or_else(|| Scripted::new(Ok(ApiResponse::success(WeatherSnapshot::default()))))
        };
        tokio::time::sleep(scripted.delay).await;
        scripted.result
    }
}

/// Snapshot whose location name is `city`.
pub fn snapshot_for(city: &str) -> WeatherSnapshot {
    let mut snapshot = WeatherSnapshot::default();
    snapshot.location.name = city.to_string();
    snapshot
}

pub fn city(name: &str) -> CityCandidate {
    CityCandidate { name: name.to_string(), ..Default::default() }
}
