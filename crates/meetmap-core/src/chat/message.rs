//! Message entity and chat entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::{Row, from_row};
use crate::profile::UserProfile;

/// A persisted chat message.
///
/// Immutable once created; `created_at` comes from the store clock. The
/// author display info is not part of the stored row; it is resolved at
/// read time and filled in by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub community_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Client-generated correlation id carried through the insert, used to
    /// match the live echo of a self-send against its pending entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    /// Denormalized author display info, resolved at read time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserProfile>,
}

impl Message {
    /// Coerces a live-feed or history row into a typed message.
    ///
    /// Live payloads are untyped and never trusted as-is; a malformed row
    /// is a `Serialization` error at this boundary.
    pub fn from_row(row: Row) -> Result<Self> {
        from_row(row)
    }
}

/// A locally synthesized, not-yet-persisted send shown optimistically.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    /// Client-generated correlation id, also written into the insert row.
    pub client_ref: String,
    pub community_id: String,
    pub user_id: String,
    pub content: String,
    /// Local wall-clock time; replaced by the store timestamp once the
    /// authoritative row echoes back.
    pub sent_at: DateTime<Utc>,
    pub author: UserProfile,
}

/// One display line in a chat session.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    /// A message confirmed by the store.
    Confirmed(Message),
    /// An optimistic local send awaiting its live echo.
    Pending(PendingMessage),
}

impl ChatEntry {
    pub fn content(&self) -> &str {
        match self {
            ChatEntry::Confirmed(message) => &message.content,
            ChatEntry::Pending(pending) => &pending.content,
        }
    }

    pub fn author_user_id(&self) -> &str {
        match self {
            ChatEntry::Confirmed(message) => &message.user_id,
            ChatEntry::Pending(pending) => &pending.user_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ChatEntry::Pending(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row_ignores_unknown_columns() {
        let row: Row = json!({
            "id": "m-1",
            "community_id": "c-1",
            "user_id": "u-1",
            "content": "hello",
            "created_at": "2025-06-01T12:00:00Z",
            "visibility": "public"
        })
        .as_object()
        .unwrap()
        .clone();

        let message = Message::from_row(row).unwrap();
        assert_eq!(message.content, "hello");
        assert!(message.client_ref.is_none());
        assert!(message.author.is_none());
    }

    #[test]
    fn test_from_row_rejects_missing_content() {
        let row: Row = json!({
            "id": "m-1",
            "community_id": "c-1",
            "user_id": "u-1",
            "created_at": "2025-06-01T12:00:00Z"
        })
        .as_object()
        .unwrap()
        .clone();

        assert!(Message::from_row(row).is_err());
    }
}
