//! Current weather for the selected city.
//!
//! Every write of the city name restarts the fetch, even when the value is
//! unchanged; the previous fetch is dropped.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;

use super::{
    Attempt, PipelineSettings, is_blank, poll_attempt, resolve,
    sharing::{Driver, Publisher, StateStream, Subscription},
};
use crate::{model::WeatherSnapshot, repository::Repository, saved_state::SavedState, state::UiState};

/// Saved-state key of the city being shown; set by navigation.
pub const CITY_NAME_KEY: &str = "city_name";

pub struct WeatherDetail {
    saved: SavedState,
    state: StateStream<WeatherSnapshot>,
}

impl WeatherDetail {
    pub fn new(repository: Repository, saved: SavedState, settings: PipelineSettings) -> Self {
        let city = saved.state(CITY_NAME_KEY, "");
        let initial = if is_blank(&city.borrow()) { UiState::Idle } else { UiState::Loading };

        let slots = saved.clone();
        let driver: Driver<WeatherSnapshot> = Arc::new(move |publisher: Publisher<WeatherSnapshot>| {
            let city = slots.state(CITY_NAME_KEY, "");
            drive(repository.clone(), city, publisher).boxed()
        });

        Self { saved, state: StateStream::new(initial, settings.retention, driver) }
    }

    pub fn city_name(&self) -> String {
        self.saved.get(CITY_NAME_KEY).unwrap_or_default()
    }

    pub fn set_city_name(&self, name: impl Into<String>) {
        self.saved.set(CITY_NAME_KEY, name);
    }

    pub fn subscribe(&self) -> Subscription<WeatherSnapshot> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UiState<WeatherSnapshot> {
        self.state.value()
    }
}

async fn drive(
    repository: Repository,
    mut city: watch::Receiver<String>,
    publisher: Publisher<WeatherSnapshot>,
) {
    let name = city.borrow_and_update().clone();
    let mut attempt = start(&repository, name, &publisher);

    loop {
        tokio::select! {
            changed = city.changed() => {
                if changed.is_err() {
                    break;
                }
                let name = city.borrow_and_update().clone();
                attempt = start(&repository, name, &publisher);
            }
            state = poll_attempt(&mut attempt) => {
                attempt = None;
                publisher.publish(state);
            }
        }
    }

    if let Some(pending) = attempt.take() {
        publisher.publish(pending.await);
    }
}

fn start(
    repository: &Repository,
    city: String,
    publisher: &Publisher<WeatherSnapshot>,
) -> Attempt<WeatherSnapshot> {
    if is_blank(&city) {
        publisher.publish(UiState::Idle);
        return None;
    }

    tracing::debug!(%city, "fetching current weather");
    publisher.publish(UiState::Loading);

    let repository = repository.clone();
    Some(
        async move {
            let state = resolve(repository.weather_details(&city).await);
            tracing::info!(%city, ok = state.data().is_some(), "weather lookup finished");
            state
        }
        .boxed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ApiResponse, GatewayError};
    use crate::testing::{FakeGateway, snapshot_for};
    use reqwest::StatusCode;
    use std::time::Duration;

    fn pipeline(gateway: &Arc<FakeGateway>, saved: SavedState) -> WeatherDetail {
        WeatherDetail::new(Repository::new(gateway.clone()), saved, PipelineSettings::default())
    }

    fn saved_with_city(city: &str) -> SavedState {
        let saved = SavedState::new();
        saved.set(CITY_NAME_KEY, city);
        saved
    }

    #[tokio::test(start_paused = true)]
    async fn initial_state_is_loading_when_city_is_set() {
        let gateway = Arc::new(FakeGateway::new());
        let detail = pipeline(&gateway, saved_with_city("London"));

        assert_eq!(detail.state(), UiState::Loading);
        assert_eq!(detail.city_name(), "London");
    }

    #[tokio::test(start_paused = true)]
    async fn initial_state_is_idle_without_city() {
        let gateway = Arc::new(FakeGateway::new());
        let detail = pipeline(&gateway, SavedState::new());
        let sub = detail.subscribe();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(sub.current(), UiState::Idle);
        assert!(gateway.weather_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_state_carries_snapshot() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather("London", ApiResponse::success(snapshot_for("London")));
        let detail = pipeline(&gateway, saved_with_city("London"));
        let mut sub = detail.subscribe();

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(state, Some(UiState::Success(snapshot_for("London"))));
        assert_eq!(gateway.weather_calls(), vec!["London"]);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_body_is_no_data_error() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather("Paris", ApiResponse::empty(StatusCode::OK));
        let detail = pipeline(&gateway, saved_with_city("Paris"));
        let mut sub = detail.subscribe();

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(state, Some(UiState::Error("No data found".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn error_without_body_is_unknown_error() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather("Nowhere", ApiResponse::error(StatusCode::BAD_REQUEST, ""));
        let detail = pipeline(&gateway, saved_with_city("Nowhere"));
        let mut sub = detail.subscribe();

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(state, Some(UiState::Error("Unknown error".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_failure_surfaces_runtime_error() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather_failure("Quito", GatewayError::Unexpected("bad payload".into()));
        let detail = pipeline(&gateway, saved_with_city("Quito"));
        let mut sub = detail.subscribe();

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(state, Some(UiState::Error("Runtime error: bad payload".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn changing_city_discards_previous_fetch() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.on_weather("London", ApiResponse::success(snapshot_for("London")));
        gateway.delay_weather("London", Duration::from_secs(5));
        gateway.on_weather("Madrid", ApiResponse::success(snapshot_for("Madrid")));
        gateway.delay_weather("Madrid", Duration::from_secs(1));
        let detail = pipeline(&gateway, saved_with_city("London"));
        let mut sub = detail.subscribe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        detail.set_city_name("Madrid");

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(state, Some(UiState::Success(snapshot_for("Madrid"))));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sub.current(), UiState::Success(snapshot_for("Madrid")));
        assert_eq!(gateway.weather_calls(), vec!["London", "Madrid"]);
    }

    #[tokio::test(start_paused = true)]
    async fn setting_same_city_refetches() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.delay_weather("Lisbon", Duration::from_millis(100));
        let detail = pipeline(&gateway, saved_with_city("Lisbon"));
        let mut sub = detail.subscribe();
        sub.wait_for(|s| s.is_terminal()).await;

        detail.set_city_name("Lisbon");
        assert_eq!(sub.changed().await, Some(UiState::Loading));
        sub.wait_for(|s| s.is_terminal()).await;

        assert_eq!(gateway.weather_calls(), vec!["Lisbon", "Lisbon"]);
    }

    #[tokio::test(start_paused = true)]
    async fn city_set_after_start_is_fetched() {
        let gateway = Arc::new(FakeGateway::new());
        let detail = pipeline(&gateway, SavedState::new());
        let mut sub = detail.subscribe();

        detail.set_city_name("Cairo");

        let state = sub.wait_for(|s| s.is_terminal()).await;
        assert!(matches!(state, Some(UiState::Success(_))));
        assert_eq!(gateway.weather_calls(), vec!["Cairo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reattach_after_retention_refetches() {
        let gateway = Arc::new(FakeGateway::new());
        let detail = pipeline(&gateway, saved_with_city("Seoul"));

        let mut sub = detail.subscribe();
        sub.wait_for(|s| s.is_terminal()).await;
        drop(sub);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let sub = detail.subscribe();
        assert!(sub.current().is_terminal());
        drop(sub);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(detail.state(), UiState::Loading);

        let mut sub = detail.subscribe();
        sub.wait_for(|s| s.is_terminal()).await;
        assert_eq!(gateway.weather_calls(), vec!["Seoul", "Seoul"]);
    }
}
