//! Error types for the meetmap client core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole client core.
///
/// Validation and authorization failures are caught before (or instead of)
/// any network call; store failures are carried through as opaque messages.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MeetmapError {
    /// Locally caught input problem (blank message, invalid date range, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The acting user is not allowed to perform the operation.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The community creator tried to leave their own community.
    #[error("The creator cannot leave their own community")]
    CreatorCannotLeave,

    /// The creator tried to remove themselves through the moderation path.
    #[error("Cannot remove yourself from the community")]
    CannotRemoveSelf,

    /// A participation already exists for the (community, user) pair.
    #[error("Already joined community '{community_id}'")]
    AlreadyJoined { community_id: String },

    /// The community is full.
    #[error("Community '{community_id}' is full ({max_participants} participants)")]
    CapacityExceeded {
        community_id: String,
        max_participants: u32,
    },

    /// Chat was opened without an active participation.
    #[error("Not a participant of community '{community_id}'")]
    NotAParticipant { community_id: String },

    /// An optimistic send was rolled back after the store rejected it.
    #[error("Message send failed: {0}")]
    SendFailed(String),

    /// Entity not found error with type information.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (config file access).
    #[error("IO error: {message}")]
    Io { message: String },

    /// Opaque passthrough from the persistence layer.
    #[error("Store error: {0}")]
    Store(String),

    /// The live feed dropped and could not be re-established.
    #[error("Live subscription lost: {0}")]
    SubscriptionLost(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeetmapError {
    /// Creates a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotAuthorized error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized(message.into())
    }

    /// Creates a NotFound error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a CapacityExceeded error.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// Check if this error belongs to the authorization family
    /// (NotAuthorized, CreatorCannotLeave, CannotRemoveSelf).
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotAuthorized(_) | Self::CreatorCannotLeave | Self::CannotRemoveSelf
        )
    }
}

impl From<serde_json::Error> for MeetmapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MeetmapError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for MeetmapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// Result type alias using MeetmapError.
pub type Result<T> = std::result::Result<T, MeetmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_family() {
        assert!(MeetmapError::CreatorCannotLeave.is_authorization());
        assert!(MeetmapError::CannotRemoveSelf.is_authorization());
        assert!(MeetmapError::not_authorized("nope").is_authorization());
        assert!(!MeetmapError::validation("bad").is_authorization());
    }

    #[test]
    fn test_capacity_display() {
        let err = MeetmapError::CapacityExceeded {
            community_id: "c-1".to_string(),
            max_participants: 2,
        };
        assert!(err.is_capacity_exceeded());
        assert_eq!(err.to_string(), "Community 'c-1' is full (2 participants)");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MeetmapError = parse_err.into();
        assert!(matches!(err, MeetmapError::Serialization { .. }));
    }
}
