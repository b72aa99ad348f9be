//! Profile domain model.

use serde::{Deserialize, Serialize};

/// Display info for a user, denormalized onto messages and rosters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Placeholder profile for a user whose row is missing or unreadable.
    ///
    /// Rendering degrades to a generated name instead of failing the
    /// message.
    pub fn placeholder(user_id: &str) -> Self {
        let short: String = user_id.chars().take(8).collect();
        Self {
            username: format!("user-{short}"),
            avatar_url: None,
        }
    }
}
