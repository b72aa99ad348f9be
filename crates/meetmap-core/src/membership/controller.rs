//! Membership controller: join, leave, moderation, roster.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::model::Participation;
use crate::community::Community;
use crate::error::{MeetmapError, Result};
use crate::gateway::{Filter, PersistenceGateway, Row, Table};
use crate::profile::ProfileDirectory;

/// One roster line: a participant with resolved display info.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEntry {
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub username: String,
}

/// Owns join/leave/remove logic and capacity enforcement.
///
/// The capacity check and the participation insert are two separate round
/// trips, so two users racing for the last slot can both pass the check.
/// Closing that window entirely needs an atomic conditional insert at the
/// store; until then the server-side count is the authority and the client
/// check is best-effort.
#[derive(Clone)]
pub struct MembershipController {
    gateway: Arc<dyn PersistenceGateway>,
    profiles: ProfileDirectory,
}

impl MembershipController {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let profiles = ProfileDirectory::new(gateway.clone());
        Self { gateway, profiles }
    }

    /// Joins `user_id` to a community.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the community does not resolve (e.g. after deletion)
    /// - `AlreadyJoined` if a participation already exists for the pair
    /// - `CapacityExceeded` if the community is full
    pub async fn join(&self, community_id: &str, user_id: &str) -> Result<Participation> {
        let community = self.fetch_community(community_id).await?;

        if self.is_participant(community_id, user_id).await? {
            return Err(MeetmapError::AlreadyJoined {
                community_id: community_id.to_string(),
            });
        }

        let members = [Filter::eq("community_id", community_id)];
        let count = self.gateway.count(Table::Participants, &members).await?;
        if count >= u64::from(community.max_participants) {
            return Err(MeetmapError::CapacityExceeded {
                community_id: community_id.to_string(),
                max_participants: community.max_participants,
            });
        }

        // joined_at is assigned by the store clock on insert
        let mut row = Row::new();
        row.insert("community_id".to_string(), json!(community_id));
        row.insert("user_id".to_string(), json!(user_id));
        let stored = self.gateway.insert(Table::Participants, row).await?;

        tracing::debug!("{user_id} joined community {community_id}");
        Participation::from_row(stored)
    }

    /// Removes the caller's own participation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the community does not resolve
    /// - `CreatorCannotLeave` if the caller created the community
    pub async fn leave(&self, community_id: &str, user_id: &str) -> Result<()> {
        let community = self.fetch_community(community_id).await?;
        if community.creator_id == user_id {
            return Err(MeetmapError::CreatorCannotLeave);
        }

        let filters = pair_filters(community_id, user_id);
        self.gateway.delete(Table::Participants, &filters).await?;
        tracing::debug!("{user_id} left community {community_id}");
        Ok(())
    }

    /// Removes another participant. Creator-only moderation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the community does not resolve
    /// - `NotAuthorized` unless the acting user is the creator
    /// - `CannotRemoveSelf` if the target is the acting user
    pub async fn remove_participant(
        &self,
        community_id: &str,
        acting_user_id: &str,
        target_user_id: &str,
    ) -> Result<()> {
        let community = self.fetch_community(community_id).await?;
        if community.creator_id != acting_user_id {
            return Err(MeetmapError::not_authorized(
                "only the creator can remove participants",
            ));
        }
        if target_user_id == acting_user_id {
            return Err(MeetmapError::CannotRemoveSelf);
        }

        let filters = pair_filters(community_id, target_user_id);
        self.gateway.delete(Table::Participants, &filters).await?;
        tracing::debug!("{acting_user_id} removed {target_user_id} from {community_id}");
        Ok(())
    }

    /// Existence check gating chat access and UI affordances.
    pub async fn is_participant(&self, community_id: &str, user_id: &str) -> Result<bool> {
        Ok(self.participation(community_id, user_id).await?.is_some())
    }

    /// Fetches the participation for a (community, user) pair, if any.
    pub async fn participation(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<Participation>> {
        let filters = pair_filters(community_id, user_id);
        let rows = self
            .gateway
            .select(Table::Participants, &filters, None)
            .await?;
        rows.into_iter().next().map(Participation::from_row).transpose()
    }

    /// Current participant count for a community.
    pub async fn participant_count(&self, community_id: &str) -> Result<u64> {
        let filters = [Filter::eq("community_id", community_id)];
        self.gateway.count(Table::Participants, &filters).await
    }

    /// Roster with display names resolved at read time.
    pub async fn participants(&self, community_id: &str) -> Result<Vec<ParticipantEntry>> {
        let filters = [Filter::eq("community_id", community_id)];
        let rows = self
            .gateway
            .select(Table::Participants, &filters, None)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let participation = Participation::from_row(row)?;
            let profile = self.profiles.resolve(&participation.user_id).await;
            entries.push(ParticipantEntry {
                user_id: participation.user_id,
                joined_at: participation.joined_at,
                username: profile.username,
            });
        }
        Ok(entries)
    }

    async fn fetch_community(&self, community_id: &str) -> Result<Community> {
        let filters = [Filter::eq("id", community_id)];
        let rows = self
            .gateway
            .select(Table::Communities, &filters, None)
            .await?;
        match rows.into_iter().next() {
            Some(row) => Community::from_row(row),
            None => Err(MeetmapError::not_found("community", community_id)),
        }
    }
}

fn pair_filters(community_id: &str, user_id: &str) -> [Filter; 2] {
    [
        Filter::eq("community_id", community_id),
        Filter::eq("user_id", user_id),
    ]
}
