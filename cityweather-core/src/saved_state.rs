//! Restorable key-value slots handed to pipelines by their host.
//!
//! Each slot is a `watch` channel: the pipeline observes it, the host writes
//! to it and may snapshot every slot to disk to restore them in a later run.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct SavedState {
    slots: Arc<Mutex<HashMap<String, watch::Sender<String>>>>,
}

impl SavedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(values: BTreeMap<String, String>) -> Self {
        let slots = values
            .into_iter()
            .map(|(key, value)| (key, watch::channel(value).0))
            .collect();
        Self { slots: Arc::new(Mutex::new(slots)) }
    }

    /// Current value of every slot.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(key, tx)| (key.clone(), tx.borrow().clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|tx| tx.borrow().clone())
    }

    /// Replace the value of `key`. Observers are notified even when the
    /// value is unchanged.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut slots = self.lock();
        match slots.get(key) {
            Some(tx) => {
                tx.send_replace(value);
            }
            None => {
                slots.insert(key.to_string(), watch::channel(value).0);
            }
        }
    }

    /// Observe `key`, creating the slot with `default` if it does not exist.
    pub fn state(&self, key: &str, default: &str) -> watch::Receiver<String> {
        self.lock()
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(default.to_string()).0)
            .subscribe()
    }

    /// Load a snapshot written by [`SavedState::save`]; a missing file yields
    /// an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let values: BTreeMap<String, String> = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        Ok(Self::from_snapshot(values))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(&self.snapshot())
            .context("Failed to serialize saved state to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, watch::Sender<String>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
