//! Cached, observable pipeline state that is only produced while observed.
//!
//! The driver task is started by the first [`StateStream::subscribe`]. When
//! the last [`Subscription`] is dropped the driver keeps running for the
//! retention window; after that it is aborted and the state resets to its
//! initial value, so the next subscriber re-derives everything from scratch.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures_util::future::BoxFuture;
use tokio::{runtime::Handle, sync::watch, task::AbortHandle};

use crate::state::UiState;

/// Builds the future that drives a pipeline, publishing through the given
/// [`Publisher`] until it is aborted.
pub type Driver<T> = Arc<dyn Fn(Publisher<T>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Write side handed to a driver.
pub struct Publisher<T> {
    tx: Arc<watch::Sender<UiState<T>>>,
}

impl<T> Publisher<T> {
    pub fn publish(&self, state: UiState<T>) {
        self.tx.send_replace(state);
    }
}

pub struct StateStream<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    tx: Arc<watch::Sender<UiState<T>>>,
    initial: UiState<T>,
    retention: Duration,
    driver: Driver<T>,
    lifecycle: Mutex<Lifecycle>,
}

#[derive(Default)]
struct Lifecycle {
    subscribers: usize,
    running: Option<AbortHandle>,
    stop_timer: Option<AbortHandle>,
}

impl<T> StateStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: UiState<T>, retention: Duration, driver: Driver<T>) -> Self {
        let (tx, _) = watch::channel(initial.clone());
        Self {
            shared: Arc::new(Shared {
                tx: Arc::new(tx),
                initial,
                retention,
                driver,
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    /// Last produced state, without subscribing.
    pub fn value(&self) -> UiState<T> {
        self.shared.tx.borrow().clone()
    }

    /// Attach an observer, starting the driver if it is not running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut life = self.shared.lock();
        life.subscribers += 1;

        if let Some(timer) = life.stop_timer.take() {
            timer.abort();
        }

        if life.running.is_none() {
            tracing::debug!("starting pipeline driver");
            let publisher = Publisher { tx: Arc::clone(&self.shared.tx) };
            let task = tokio::spawn((self.shared.driver)(publisher));
            life.running = Some(task.abort_handle());
        }

        Subscription {
            rx: self.shared.tx.subscribe(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running.is_some()
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(self: &Arc<Self>) {
        let mut life = self.lock();
        life.subscribers = life.subscribers.saturating_sub(1);
        if life.subscribers > 0 {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::clone(self);
                let retention = self.retention;
                let timer = handle.spawn(async move {
                    tokio::time::sleep(retention).await;
                    let mut life = shared.lock();
                    if life.subscribers == 0 {
                        life.stop_timer = None;
                        shared.stop(&mut life);
                    }
                });
                life.stop_timer = Some(timer.abort_handle());
            }
            Err(_) => self.stop(&mut life),
        }
    }

    fn stop(&self, life: &mut Lifecycle) {
        if let Some(running) = life.running.take() {
            tracing::debug!("no observers left, stopping pipeline driver");
            running.abort();
        }
        self.tx.send_replace(self.initial.clone());
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let life = self.lifecycle.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = life.running.take() {
            running.abort();
        }
        if let Some(timer) = life.stop_timer.take() {
            timer.abort();
        }
    }
}

/// An attached observer. Dropping it detaches.
pub struct Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    rx: watch::Receiver<UiState<T>>,
    shared: Arc<Shared<T>>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn current(&self) -> UiState<T> {
        self.rx.borrow().clone()
    }

    /// Treat the current state as seen, so [`Subscription::changed`] only
    /// reports states published from now on.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Wait for the next state that this subscription has not seen yet.
    pub async fn changed(&mut self) -> Option<UiState<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait for the next unseen `Success` or `Error`.
    pub async fn next_terminal(&mut self) -> Option<UiState<T>> {
        loop {
            let state = self.changed().await?;
            if state.is_terminal() {
                return Some(state);
            }
        }
    }

    /// Wait until the state satisfies `predicate`, checking the current one first.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&UiState<T>) -> bool) -> Option<UiState<T>> {
        self.rx.wait_for(predicate).await.ok().map(|state| (*state).clone())
    }
}

impl<T> Drop for Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.shared.release();
    }
}
