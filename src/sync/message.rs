use serde::{Deserialize, Serialize};

use crate::cue::Cue;
use crate::errors::SyncError;

/// Message exchanged between peers, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Full snapshot of the sender's store
    SubtitleUpdate {
        items: Vec<Cue>,
        /// Forces the receiver to apply even when nothing changed
        #[serde(default, rename = "isInitial")]
        is_initial: bool,
    },

    /// Ask the peer for its current snapshot
    #[serde(alias = "request_state")]
    RequestSubtitles,
}

impl SyncMessage {
    /// Snapshot message for the given cues
    pub fn update(items: Vec<Cue>, is_initial: bool) -> Self {
        Self::SubtitleUpdate { items, is_initial }
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(raw)?)
    }
}
