//! Item wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a shareable item. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A short link redirecting to a target URL.
    Link,
    /// A paste of text content.
    Code,
    /// A binary file, uploaded in a second step.
    File,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Link => write!(f, "link"),
            ItemKind::Code => write!(f, "code"),
            ItemKind::File => write!(f, "file"),
        }
    }
}

/// Body of `POST /api/item/{path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateItemBody {
    /// Kind of the new item.
    pub item_type: ItemKind,
    /// Link target, paste content, or a placeholder for files.
    pub data: String,
    /// Absolute expiry; absent means never.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Cap on successful visits; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_visits: Option<u32>,
    /// Access password; absent means public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Opaque auxiliary data (language, original file name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
}

/// The part of a creation reply this client relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedItem {
    /// The allocated short path.
    pub short_path: String,
    /// Server-assigned identifier, when reported.
    #[serde(default)]
    pub id: Option<String>,
}

/// List entry from `GET /api/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Server-assigned identifier.
    pub id: String,
    /// Short public path.
    pub short_path: String,
    /// Item kind.
    pub item_type: ItemKind,
    /// Number of successful visits so far.
    #[serde(default)]
    pub visits: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Creator id (user id or guest id).
    #[serde(default)]
    pub creator: Option<String>,
}

/// Detailed view from `GET /api/item/{path}?detailed=true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    /// Server-assigned identifier.
    pub id: String,
    /// Short public path.
    pub short_path: String,
    /// Item kind.
    pub item_type: ItemKind,
    /// Link target, or the server-side storage name for code and files.
    pub data: String,
    /// Absolute expiry, if any.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Visit cap, if any.
    #[serde(default)]
    pub max_visits: Option<i64>,
    /// Visits so far.
    #[serde(default)]
    pub visits: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Opaque auxiliary data.
    #[serde(default)]
    pub extra_data: Option<String>,
    /// Creator id.
    #[serde(default)]
    pub creator: Option<String>,
}

impl ItemDetail {
    /// Whether the item can no longer be visited at `now`.
    pub fn is_exhausted(&self, now: DateTime<Utc>) -> bool {
        if self.expires_at.is_some_and(|at| at <= now) {
            return true;
        }
        matches!(self.max_visits, Some(max) if self.visits >= max)
    }
}
