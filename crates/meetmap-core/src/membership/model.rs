//! Participation domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::{Row, from_row};

/// Membership of one user in one community.
///
/// `joined_at` is assigned by the store's clock on insert and is the
/// inclusive lower bound for the member's message visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub community_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

impl Participation {
    pub fn from_row(row: Row) -> Result<Self> {
        from_row(row)
    }
}
