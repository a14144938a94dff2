/*!
 * Real-time collaboration.
 *
 * Two peers exchange whole-store snapshots over an opaque message channel.
 * Incoming snapshots are applied only when they differ from the local store
 * (echo suppression), outgoing snapshots are debounced, and the session runs
 * a `Disconnected -> Connecting -> Connected -> Disconnected` state machine.
 */

pub mod channel;
pub mod debounce;
pub mod message;
pub mod reconciler;
pub mod session;

pub use channel::{ChannelEvent, MemoryChannel, SyncChannel};
pub use debounce::Debouncer;
pub use message::SyncMessage;
pub use reconciler::{SyncOutcome, SyncReconciler};
pub use session::{ConnectionState, SessionRole, SessionUpdate, StoreEdit, SyncSession};
