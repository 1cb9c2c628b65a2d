//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather gateway abstraction and its weatherapi.com implementation
//! - The search and detail pipelines that turn user input into [`UiState`]s
//! - Restorable state handed to the pipelines by their host
//!
//! It is used by `cityweather-cli`, but can also drive other front ends.

pub mod config;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod repository;
pub mod response;
pub mod saved_state;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, PipelineConfig};
pub use gateway::{WeatherGateway, gateway_from_config};
pub use model::{CityCandidate, WeatherSnapshot};
pub use pipeline::{CitySearch, PipelineSettings, SearchAction, SearchEvent, WeatherDetail};
pub use repository::Repository;
pub use response::{ApiResponse, GatewayError};
pub use saved_state::SavedState;
pub use state::UiState;
