use log::debug;

use crate::cue::Cue;
use crate::cue_store::CueStore;

/// Result of offering a remote snapshot to the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store was replaced with `count` cues
    Applied { count: usize },
    /// The snapshot matched the local store and was dropped
    Ignored,
}

/// Decides whether remote snapshots replace the local store
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReconciler;

impl SyncReconciler {
    /// Initial snapshots always apply; others only when they differ in any field or order
    pub fn should_apply(local: &[Cue], incoming: &[Cue], is_initial: bool) -> bool {
        is_initial || local != incoming
    }

    /// Load `incoming` into the store when [`Self::should_apply`] allows it
    pub fn apply(store: &mut CueStore, incoming: Vec<Cue>, is_initial: bool) -> SyncOutcome {
        if !Self::should_apply(store.cues(), &incoming, is_initial) {
            debug!("Ignoring remote snapshot identical to local store");
            return SyncOutcome::Ignored;
        }

        let count = incoming.len();
        store.load(incoming);
        SyncOutcome::Applied { count }
    }
}
