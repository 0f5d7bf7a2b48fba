//! Item events emitted by the sharing client.
//!
//! Events are broadcast to list/refresh observers after an item is
//! created or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ItemKind;

/// Wrapper for item events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub change: ItemChange,
}

/// What happened to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemChange {
    /// An item was created and its payload resolved.
    Created {
        /// The allocated short path.
        short_path: String,
        /// The item kind.
        kind: ItemKind,
    },
    /// An item was deleted, explicitly or by upload cleanup.
    Deleted {
        /// The deleted short path.
        short_path: String,
    },
}

impl ItemEvent {
    /// Create a new item event stamped with the current time.
    pub fn new(change: ItemChange) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            change,
        }
    }

    /// The short path the event refers to.
    pub fn short_path(&self) -> &str {
        match &self.change {
            ItemChange::Created { short_path, .. } | ItemChange::Deleted { short_path } => {
                short_path
            }
        }
    }
}
