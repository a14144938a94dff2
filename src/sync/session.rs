/*!
 * Collaboration session state machine and event loop.
 *
 * A session owns one end of a [`SyncChannel`] and borrows the local store
 * while it runs. Events are handled one at a time:
 * - channel events (open, remote messages, close, errors)
 * - local edits, queued as closures over the store
 * - the debounce deadline for outgoing snapshots
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use super::channel::{ChannelEvent, SyncChannel};
use super::debounce::Debouncer;
use super::message::SyncMessage;
use super::reconciler::{SyncOutcome, SyncReconciler};
use crate::app_config::SyncConfig;
use crate::cue_store::CueStore;
use crate::errors::{SubtitleError, SyncError};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        write!(f, "{}", name)
    }
}

/// Which side of the session this peer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionRole {
    /// Owns the document and pushes its snapshot on connect
    Host,
    /// Joins a room and requests the host's snapshot on connect
    Guest,
}

/// A local edit queued for the session loop
pub type StoreEdit = Box<dyn FnOnce(&mut CueStore) -> Result<(), SubtitleError> + Send>;

/// What handling one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The connection state changed
    StateChanged(ConnectionState),
    /// A remote snapshot was offered to the store
    Remote(SyncOutcome),
    /// A snapshot was sent to the peer
    SnapshotSent { count: usize },
    /// Nothing observable happened
    Idle,
}

enum Step {
    Event(Option<ChannelEvent>),
    Edit(Option<StoreEdit>),
    Flush,
}

/// One peer's end of a collaboration session
pub struct SyncSession<C: SyncChannel> {
    role: SessionRole,
    channel: C,
    state: ConnectionState,
    debouncer: Debouncer,
    room_id: String,
}

impl<C: SyncChannel> SyncSession<C> {
    /// Start a session over `channel`; the state is `Connecting` until the channel opens
    pub fn connect(role: SessionRole, channel: C, debounce: Duration) -> Self {
        let room_id = Uuid::new_v4().to_string();
        info!("Connecting as {:?} to room {}", role, room_id);
        Self {
            role,
            channel,
            state: ConnectionState::Connecting,
            debouncer: Debouncer::new(debounce),
            room_id,
        }
    }

    /// Start a session with the configured debounce, which must lie in 300..=400 ms
    pub fn from_config(role: SessionRole, channel: C, config: &SyncConfig) -> Result<Self, SyncError> {
        let debounce = config.checked_debounce()?;
        Ok(Self::connect(role, channel, debounce))
    }

    /// Use a known room id instead of the generated one
    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = room_id.into();
        self
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether an outgoing snapshot is waiting for its window to pass
    pub fn has_pending_broadcast(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Drop the connection locally. There is no automatic reconnect.
    pub fn disconnect(&mut self) -> SessionUpdate {
        self.debouncer.cancel();
        self.transition(ConnectionState::Disconnected)
    }

    /// Handle a single channel event
    pub async fn handle_event(&mut self, event: ChannelEvent, store: &mut CueStore) -> SessionUpdate {
        match event {
            ChannelEvent::Open => {
                let update = self.transition(ConnectionState::Connected);
                let greeting = match self.role {
                    SessionRole::Host => SyncMessage::update(store.snapshot(), true),
                    SessionRole::Guest => SyncMessage::RequestSubtitles,
                };
                if let Err(e) = self.channel.send(greeting).await {
                    warn!("Failed to greet peer: {}", e);
                    return self.disconnect();
                }
                update
            }
            ChannelEvent::Message(SyncMessage::SubtitleUpdate { items, is_initial }) => {
                let outcome = SyncReconciler::apply(store, items, is_initial);
                debug!("Remote snapshot (initial: {}): {:?}", is_initial, outcome);
                SessionUpdate::Remote(outcome)
            }
            ChannelEvent::Message(SyncMessage::RequestSubtitles) => self.send_snapshot(store, true).await,
            ChannelEvent::Closed => {
                info!("Peer closed the session");
                self.disconnect()
            }
            ChannelEvent::Error(message) => {
                warn!("Sync channel error: {}", message);
                self.disconnect()
            }
        }
    }

    /// Schedule a debounced broadcast after a local edit. Ignored while not connected.
    pub fn notify_local_change(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.debouncer.schedule(now);
        true
    }

    /// Send the store if the debounce window has passed at `now`
    pub async fn flush(&mut self, now: Instant, store: &CueStore) -> SessionUpdate {
        if !self.debouncer.take_due(now) {
            return SessionUpdate::Idle;
        }
        self.send_snapshot(store, false).await
    }

    /// Send a pending broadcast immediately
    pub async fn flush_now(&mut self, store: &CueStore) -> SessionUpdate {
        if !self.debouncer.is_pending() {
            return SessionUpdate::Idle;
        }
        self.debouncer.cancel();
        self.send_snapshot(store, false).await
    }

    /// Drive the session until the channel closes or the edit queue is dropped.
    ///
    /// Dropping the edit sender flushes any pending broadcast before returning.
    pub async fn run(&mut self, store: &mut CueStore, mut edits: mpsc::UnboundedReceiver<StoreEdit>) -> ConnectionState {
        while self.state != ConnectionState::Disconnected {
            let deadline = self.debouncer.deadline();

            let step = tokio::select! {
                event = self.channel.recv() => Step::Event(event),
                edit = edits.recv() => Step::Edit(edit),
                _ = sleep_until(deadline) => Step::Flush,
            };

            match step {
                Step::Event(Some(event)) => {
                    self.handle_event(event, store).await;
                }
                Step::Event(None) => {
                    self.disconnect();
                }
                Step::Edit(Some(edit)) => match edit(store) {
                    Ok(()) => {
                        self.notify_local_change(Instant::now());
                    }
                    Err(e) => warn!("Local edit rejected: {}", e),
                },
                Step::Edit(None) => {
                    debug!("Edit queue closed, flushing and leaving session loop");
                    self.flush_now(store).await;
                    break;
                }
                Step::Flush => {
                    self.flush(Instant::now(), store).await;
                }
            }
        }

        self.state
    }

    async fn send_snapshot(&mut self, store: &CueStore, is_initial: bool) -> SessionUpdate {
        if !self.is_connected() {
            return SessionUpdate::Idle;
        }

        let count = store.len();
        match self.channel.send(SyncMessage::update(store.snapshot(), is_initial)).await {
            Ok(()) => {
                debug!("Sent snapshot with {} cues (initial: {})", count, is_initial);
                SessionUpdate::SnapshotSent { count }
            }
            Err(e) => {
                warn!("Failed to send snapshot: {}", e);
                self.disconnect()
            }
        }
    }

    fn transition(&mut self, next: ConnectionState) -> SessionUpdate {
        if self.state == next {
            return SessionUpdate::Idle;
        }
        info!("Session {} {} -> {}", self.room_id, self.state, next);
        self.state = next;
        SessionUpdate::StateChanged(next)
    }
}

impl<C: SyncChannel> fmt::Debug for SyncSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSession")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("room_id", &self.room_id)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
