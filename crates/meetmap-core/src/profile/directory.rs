//! Read-through profile resolution.

use std::sync::Arc;

use crate::gateway::{Filter, PersistenceGateway, Table, from_row};
use crate::profile::UserProfile;

/// Resolves display profiles by user id.
///
/// Store failures and missing rows both degrade to a placeholder profile:
/// a message must still render when its author's profile is unreadable.
#[derive(Clone)]
pub struct ProfileDirectory {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ProfileDirectory {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Fetches the display profile for `user_id`.
    pub async fn resolve(&self, user_id: &str) -> UserProfile {
        let filters = [Filter::eq("id", user_id)];
        match self.gateway.select(Table::Profiles, &filters, None).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(row) => from_row(row).unwrap_or_else(|err| {
                    tracing::warn!("Malformed profile row for {user_id}: {err}");
                    UserProfile::placeholder(user_id)
                }),
                None => UserProfile::placeholder(user_id),
            },
            Err(err) => {
                tracing::warn!("Profile lookup failed for {user_id}: {err}");
                UserProfile::placeholder(user_id)
            }
        }
    }
}
