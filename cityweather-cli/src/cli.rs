use std::fmt;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    CityCandidate, CitySearch, Config, PipelineSettings, Repository, SavedState, SearchEvent,
    UiState, WeatherDetail, gateway_from_config,
};
use inquire::{InquireError, Password, Select, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Search a city and show its current weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weatherapi.com API key.
    Configure {
        /// Key to store; prompted for when absent.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// List cities matching a query.
    Search {
        query: String,
    },

    /// Show current weather for a city.
    Show {
        city: String,
    },

    /// Search interactively, pick a city and see its weather.
    Browse,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { api_key } => configure(api_key),
            Command::Search { query } => search_once(query).await,
            Command::Show { city } => show_once(city).await,
            Command::Browse => browse().await,
        }
    }
}

fn configure(api_key: Option<String>) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("weatherapi.com API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let mut cfg = Config::load()?;
    cfg.set_api_key(api_key.trim().to_string());
    cfg.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

struct Session {
    repository: Repository,
    settings: PipelineSettings,
}

impl Session {
    fn from_config() -> Result<Self> {
        let cfg = Config::load()?;
        let gateway = gateway_from_config(&cfg)?;
        Ok(Self {
            repository: Repository::new(gateway),
            settings: PipelineSettings::from(&cfg.pipeline),
        })
    }

    fn search(&self, saved: SavedState) -> CitySearch {
        CitySearch::new(self.repository.clone(), saved, self.settings)
    }

    fn detail(&self, saved: SavedState) -> WeatherDetail {
        WeatherDetail::new(self.repository.clone(), saved, self.settings)
    }
}

async fn search_once(query: String) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Query must not be empty");
    }

    let session = Session::from_config()?;
    let search = session.search(SavedState::new());
    let mut results = search.subscribe();
    search.set_query(query);

    match results.wait_for(|s| s.is_terminal()).await {
        Some(UiState::Success(cities)) => print!("{}", render::city_list(&cities)),
        Some(UiState::Error(message)) => bail!(message),
        _ => bail!("Search stopped before producing a result"),
    }
    Ok(())
}

async fn show_once(city: String) -> Result<()> {
    if city.trim().is_empty() {
        bail!("City name must not be empty");
    }

    let session = Session::from_config()?;
    let detail = session.detail(SavedState::new());
    let mut weather = detail.subscribe();
    detail.set_city_name(city);

    match weather.wait_for(|s| s.is_terminal()).await {
        Some(UiState::Success(snapshot)) => print!("{}", render::weather(&snapshot)),
        Some(UiState::Error(message)) => bail!(message),
        _ => bail!("Lookup stopped before producing a result"),
    }
    Ok(())
}

/// Select entry for a search result.
struct CityOption(CityCandidate);

impl fmt::Display for CityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display_name())
    }
}

async fn browse() -> Result<()> {
    let session = Session::from_config()?;
    let state_path = Config::state_file_path()?;
    let saved = SavedState::load(&state_path)?;
    tracing::debug!(path = %state_path.display(), "restored browse state");

    let search = session.search(saved.clone());
    let detail = session.detail(saved.clone());
    let mut results = search.subscribe();

    if !search.query().trim().is_empty() {
        println!("Last search: {}", search.query());
        if let Some(state) = results.wait_for(|s| s.is_terminal()).await {
            print_cities_state(&state);
        }
    }

    loop {
        let query = match prompt(
            Text::new("City:")
                .with_initial_value(&search.query())
                .with_help_message("leave empty to quit")
                .prompt_skippable(),
        )? {
            Some(query) if !query.trim().is_empty() => query,
            _ => break,
        };

        let state = if query == search.query() {
            results.wait_for(|s| s.is_terminal()).await
        } else {
            results.mark_seen();
            search.set_query(query);
            results.next_terminal().await
        };

        let Some(state) = state else { break };
        print_cities_state(&state);

        let cities = match state {
            UiState::Success(cities) if !cities.is_empty() => cities,
            _ => continue,
        };

        let options = cities.into_iter().map(CityOption).collect();
        let Some(choice) = prompt(Select::new("Choose a city:", options).prompt_skippable())? else {
            continue;
        };
        search.select_city(choice.0.name);

        let Some(SearchEvent::CitySelected(city)) = search.next_event().await else {
            break;
        };
        show_detail(&detail, city).await;
    }

    drop(results);
    tracing::debug!(path = %state_path.display(), "saving browse state");
    saved
        .save(&state_path)
        .context("Failed to persist browse state")?;
    Ok(())
}

/// Navigation target of a city selection: the detail screen.
async fn show_detail(detail: &WeatherDetail, city: String) {
    let mut weather = detail.subscribe();
    weather.mark_seen();
    detail.set_city_name(city);

    match weather.next_terminal().await {
        Some(UiState::Success(snapshot)) => println!("\n{}", render::weather(&snapshot)),
        Some(UiState::Error(message)) => eprintln!("Error: {message}"),
        _ => {}
    }
}

fn print_cities_state(state: &UiState<Vec<CityCandidate>>) {
    match state {
        UiState::Success(cities) => print!("{}", render::city_list(cities)),
        UiState::Error(message) => eprintln!("Error: {message}"),
        UiState::Idle | UiState::Loading => {}
    }
}

/// Ctrl-C ends the session like an empty answer.
fn prompt<T>(result: Result<Option<T>, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}
