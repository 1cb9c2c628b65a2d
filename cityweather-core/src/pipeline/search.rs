//! Search-as-you-type: query edits in, `UiState<Vec<CityCandidate>>` out.
//!
//! Edits are debounced, consecutive equal queries are dropped, and each new
//! search replaces the one in flight. A blank query shows `Idle` without
//! touching the network.

use std::{sync::Arc, time::Duration};

use futures_util::FutureExt;
use tokio::{
    sync::{Mutex, mpsc, watch},
    time::{Instant, sleep_until},
};

use super::{
    Attempt, PipelineSettings, is_blank, poll_attempt, resolve,
    sharing::{Driver, Publisher, StateStream, Subscription},
};
use crate::{model::CityCandidate, repository::Repository, saved_state::SavedState, state::UiState};

/// Saved-state key of the query text.
pub const QUERY_KEY: &str = "city_query";

pub type CityList = Vec<CityCandidate>;

/// Input from the search screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    QueryChanged(String),
    CitySelected(String),
}

/// One-shot notifications, delivered outside the state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    CitySelected(String),
}

pub struct CitySearch {
    saved: SavedState,
    state: StateStream<CityList>,
    events_tx: mpsc::Sender<SearchEvent>,
    events_rx: Arc<Mutex<mpsc::Receiver<SearchEvent>>>,
}

impl CitySearch {
    pub fn new(repository: Repository, saved: SavedState, settings: PipelineSettings) -> Self {
        let debounce = settings.debounce;
        let slots = saved.clone();
        let driver: Driver<CityList> = Arc::new(move |publisher: Publisher<CityList>| {
            let query = slots.state(QUERY_KEY, "");
            drive(repository.clone(), query, debounce, publisher).boxed()
        });

        let (events_tx, events_rx) = mpsc::channel(settings.event_capacity.max(1));

        // make sure the slot exists so `query()` reads the default
        saved.state(QUERY_KEY, "");

        Self {
            saved,
            state: StateStream::new(UiState::Idle, settings.retention, driver),
            events_tx,
            events_rx: Arc::new(Mutex::new(events_rx)),
        }
    }

    pub fn query(&self) -> String {
        self.saved.get(QUERY_KEY).unwrap_or_default()
    }

    pub fn set_query(&self, text: impl Into<String>) {
        self.saved.set(QUERY_KEY, text);
    }

    /// Queue a "city selected" notification for the navigation layer.
    pub fn select_city(&self, name: impl Into<String>) {
        let event = SearchEvent::CitySelected(name.into());
        if let Err(err) = self.events_tx.try_send(event) {
            tracing::warn!(event = ?err.into_inner(), "notification queue full, dropping event");
        }
    }

    pub fn on_action(&self, action: SearchAction) {
        match action {
            SearchAction::QueryChanged(query) => self.set_query(query),
            SearchAction::CitySelected(name) => self.select_city(name),
        }
    }

    /// Next notification, in the order they were queued.
    pub async fn next_event(&self) -> Option<SearchEvent> {
        self.events_rx.lock().await.recv().await
    }

    pub fn subscribe(&self) -> Subscription<CityList> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UiState<CityList> {
        self.state.value()
    }
}

async fn drive(
    repository: Repository,
    mut query: watch::Receiver<String>,
    debounce: Duration,
    publisher: Publisher<CityList>,
) {
    query.borrow_and_update();
    let mut deadline = Some(Instant::now() + debounce);
    let mut last: Option<String> = None;
    let mut attempt: Attempt<CityList> = None;

    loop {
        tokio::select! {
            changed = query.changed() => {
                if changed.is_err() {
                    break;
                }
                query.borrow_and_update();
                deadline = Some(Instant::now() + debounce);
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                let text = query.borrow().clone();
                if last.as_ref() != Some(&text) {
                    last = Some(text.clone());
                    attempt = start(&repository, text, &publisher);
                }
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

fn start(repository: &Repository, text: String, publisher: &Publisher<CityList>) -> Attempt<CityList> {
    if is_blank(&text) {
        tracing::debug!("blank query, back to idle");
        publisher.publish(UiState::Idle);
        return None;
    }

    tracing::debug!(query = %text, "searching cities");
    publisher.publish(UiState::Loading);

    let repository = repository.clone();
    Some(
        async move {
            let state = resolve(repository.search_for_city(&text).await);
            tracing::info!(query = %text, ok = state.data().is_some(), "city search finished");
            state
        }
        .boxed(),
    )
}
