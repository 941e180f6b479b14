//! Messages and notifications exchanged with the hosting application.

use serde::{Deserialize, Serialize};

/// Tag of the background sync that uploads reading progress.
pub const SYNC_READING_PROGRESS: &str = "sync-reading-progress";

/// Tag of the periodic sync that refreshes the library.
pub const PERIODIC_UPDATE_LIBRARY: &str = "update-library";

/// Control message posted by a client.
///
/// Serialized with a `type` discriminator, e.g.
/// `{"type": "CACHE_BOOK", "url": "/media/books/42.epub"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting install immediately.
    SkipWaiting,
    /// Fetch and store one URL for offline use.
    CacheBook { url: String },
    /// Delete every namespace of this application.
    ClearCache,
}

/// Action button shown on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A user-visible notification produced from a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Stable tag, repeated pushes replace the previous notification.
    pub tag: String,
    pub actions: Vec<NotificationAction>,
}

/// What the host should do with its clients after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientAction {
    /// Focus or open a window at the given URL.
    OpenWindow { url: String },
}
