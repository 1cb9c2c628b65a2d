//! Query-to-state pipelines.
//!
//! Each pipeline owns one driver task that holds at most one in-flight
//! attempt. Starting a new attempt drops the previous future, so a stale
//! result is never published.

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::{config::PipelineConfig, response::ApiResponse, state::UiState};

pub mod detail;
pub mod search;
pub mod sharing;

pub use detail::WeatherDetail;
pub use search::{CitySearch, SearchAction, SearchEvent};
pub use sharing::{StateStream, Subscription};

const ERROR_NO_DATA: &str = "No data found";
const ERROR_UNKNOWN: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub debounce: Duration,
    pub retention: Duration,
    pub event_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        (&PipelineConfig::default()).into()
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            debounce: cfg.debounce(),
            retention: cfg.retention(),
            event_capacity: cfg.event_capacity.max(1),
        }
    }
}

/// Terminal state for a finished attempt.
pub(crate) fn resolve<T>(response: ApiResponse<T>) -> UiState<T> {
    if response.is_successful() {
        return match response.body {
            Some(body) => UiState::Success(body),
            None => UiState::Error(ERROR_NO_DATA.to_string()),
        };
    }

    let message = response
        .error_body
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| ERROR_UNKNOWN.to_string());
    UiState::Error(message)
}

pub(crate) type Attempt<T> = Option<BoxFuture<'static, UiState<T>>>;

/// Resolves with the in-flight attempt's state, or never when idle.
pub(crate) async fn poll_attempt<T>(attempt: &mut Attempt<T>) -> UiState<T> {
    match attempt {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
