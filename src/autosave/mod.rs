/*!
 * Periodic autosave of the whole cue store.
 *
 * Snapshots are written under a single fixed key and offered for restore only
 * while they are younger than the configured maximum age. Writes are skipped
 * for empty stores and for content identical to the last write.
 */

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app_config::AutosaveConfig;
use crate::cue::Cue;
use crate::errors::PersistenceError;

pub mod schema;
pub mod store;

pub use store::{SnapshotStore, SqliteSnapshotStore};

/// Key every autosave is written under
pub const AUTOSAVE_KEY: &str = "subtitleEditor_autoSave";

/// Default restore window in hours
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// A persisted copy of the store contents
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSnapshot {
    pub items: Vec<Cue>,
    pub saved_at: DateTime<Utc>,
    /// SHA-256 of the serialized items, hex encoded
    pub digest: String,
}

impl SavedSnapshot {
    pub fn new(items: Vec<Cue>, saved_at: DateTime<Utc>) -> Result<Self, PersistenceError> {
        let digest = digest_cues(&items)?;
        Ok(Self { items, saved_at, digest })
    }

    /// Time elapsed since the snapshot was written
    pub fn age(&self, now: DateTime<Utc>) -> ChronoDuration {
        now - self.saved_at
    }
}

/// Hex SHA-256 of the JSON form of `cues`
pub fn digest_cues(cues: &[Cue]) -> Result<String, PersistenceError> {
    let payload = serde_json::to_vec(cues)?;
    let hash = Sha256::digest(&payload);
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Writes and restores autosave snapshots through a [`SnapshotStore`]
pub struct Autosaver<S: SnapshotStore> {
    store: S,
    key: String,
    max_age: ChronoDuration,
    last_digest: Option<String>,
}

impl<S: SnapshotStore> Autosaver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: AUTOSAVE_KEY.to_string(),
            max_age: ChronoDuration::hours(DEFAULT_MAX_AGE_HOURS),
            last_digest: None,
        }
    }

    /// Autosaver using the configured restore window
    pub fn from_config(store: S, config: &AutosaveConfig) -> Self {
        let max_age = i64::try_from(config.max_age_hours)
            .ok()
            .and_then(ChronoDuration::try_hours)
            .unwrap_or(ChronoDuration::MAX);
        Self::new(store).with_max_age(max_age)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_max_age(mut self, max_age: ChronoDuration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persist `cues` unless the store is empty or unchanged since the last write.
    /// Returns whether a snapshot was written.
    pub fn save(&mut self, cues: &[Cue], now: DateTime<Utc>) -> Result<bool, PersistenceError> {
        if cues.is_empty() {
            debug!("Skipping autosave of empty store");
            return Ok(false);
        }

        let snapshot = SavedSnapshot::new(cues.to_vec(), now)?;
        if self.last_digest.as_deref() == Some(snapshot.digest.as_str()) {
            debug!("Skipping autosave, content unchanged");
            return Ok(false);
        }

        self.store.put(&self.key, &snapshot)?;
        info!("Autosaved {} cues", snapshot.items.len());
        self.last_digest = Some(snapshot.digest);
        Ok(true)
    }

    /// The stored snapshot if it is younger than the restore window
    pub fn restore_candidate(&self, now: DateTime<Utc>) -> Result<Option<SavedSnapshot>, PersistenceError> {
        let Some(snapshot) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        if snapshot.age(now) < self.max_age {
            Ok(Some(snapshot))
        } else {
            debug!("Ignoring autosave from {} (older than {}h)", snapshot.saved_at, self.max_age.num_hours());
            Ok(None)
        }
    }

    /// Delete the stored snapshot
    pub fn discard(&mut self) -> Result<bool, PersistenceError> {
        self.last_digest = None;
        self.store.remove(&self.key)
    }

    /// Save the latest published store contents every `interval` until the
    /// sender is dropped, then save once more.
    pub async fn run(mut self, interval: Duration, mut contents: watch::Receiver<Vec<Cue>>) -> Self {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = contents.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let cues = contents.borrow().clone();
            if let Err(e) = self.save(&cues, Utc::now()) {
                warn!("Autosave failed: {}", e);
            }
        }

        let cues = contents.borrow().clone();
        if let Err(e) = self.save(&cues, Utc::now()) {
            warn!("Final autosave failed: {}", e);
        }
        self
    }
}

/// Start the periodic autosaver described by `config` on the current tokio
/// runtime. Returns `None` when autosave is disabled.
pub fn spawn(
    config: &AutosaveConfig,
    contents: watch::Receiver<Vec<Cue>>,
) -> Result<Option<JoinHandle<Autosaver<SqliteSnapshotStore>>>, PersistenceError> {
    if !config.enabled {
        info!("Autosave disabled");
        return Ok(None);
    }

    let store = SqliteSnapshotStore::from_config(config)?;
    let autosaver = Autosaver::from_config(store, config);
    debug!("Autosaving every {:?}", config.interval());
    Ok(Some(tokio::spawn(autosaver.run(config.interval(), contents))))
}
