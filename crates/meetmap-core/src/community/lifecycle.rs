//! Community lifecycle service.

use std::sync::Arc;

use serde_json::json;

use super::model::{Community, CommunityDraft};
use crate::error::{MeetmapError, Result};
use crate::gateway::{Filter, OrderBy, PersistenceGateway, Row, Table};

/// Creates, updates and deletes communities, coupled to their membership
/// side effects: the creator auto-joins on create, and deletion cascades to
/// all participations.
///
/// The acting user id is always passed in explicitly; the service holds no
/// ambient auth state.
#[derive(Clone)]
pub struct CommunityLifecycle {
    gateway: Arc<dyn PersistenceGateway>,
}

impl CommunityLifecycle {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Creates a community and auto-joins the creator.
    ///
    /// The draft is validated locally before any write. The community
    /// insert and the creator's participation insert are two sequential
    /// writes; the pair is atomic only from the caller's perspective.
    ///
    /// # Errors
    ///
    /// - `Validation` if the draft is invalid
    /// - `Store` if either write fails
    pub async fn create(&self, creator_id: &str, draft: &CommunityDraft) -> Result<Community> {
        draft.validate()?;

        let mut row = draft.to_row()?;
        row.insert("creator_id".to_string(), json!(creator_id));
        let stored = self.gateway.insert(Table::Communities, row).await?;
        let community = Community::from_row(stored)?;

        let mut participation = Row::new();
        participation.insert("community_id".to_string(), json!(community.id));
        participation.insert("user_id".to_string(), json!(creator_id));
        if let Err(err) = self.gateway.insert(Table::Participants, participation).await {
            // Community row exists without its creator participation; the
            // caller sees the failure and the community stays joinable.
            tracing::warn!(
                "Creator auto-join failed for community {}: {err}",
                community.id
            );
            return Err(err);
        }

        tracing::debug!("Created community {} for {creator_id}", community.id);
        Ok(community)
    }

    /// Fetches a single community.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id does not resolve.
    pub async fn get(&self, community_id: &str) -> Result<Community> {
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

    /// Lists all communities, newest first.
    pub async fn list(&self) -> Result<Vec<Community>> {
        let order = OrderBy::descending("created_at");
        let rows = self
            .gateway
            .select(Table::Communities, &[], Some(&order))
            .await?;
        rows.into_iter().map(Community::from_row).collect()
    }

    /// Updates a community's fields. Creator-only.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the community does not resolve
    /// - `NotAuthorized` unless the acting user is the creator
    /// - `Validation` if the new fields are invalid
    pub async fn update(
        &self,
        community_id: &str,
        acting_user_id: &str,
        draft: &CommunityDraft,
    ) -> Result<Community> {
        let community = self.get(community_id).await?;
        if community.creator_id != acting_user_id {
            return Err(MeetmapError::not_authorized(
                "only the creator can edit a community",
            ));
        }
        draft.validate()?;

        let filters = [Filter::eq("id", community_id)];
        self.gateway
            .update(Table::Communities, &filters, draft.to_row()?)
            .await?;
        self.get(community_id).await
    }

    /// Deletes a community and all of its participations. Creator-only.
    ///
    /// Participations are deleted first: if the second write fails, the
    /// leftover community row is a recoverable inconsistency (its roster is
    /// simply empty), whereas orphaned participations would never be
    /// cleaned up.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the community does not resolve
    /// - `NotAuthorized` unless the acting user is the creator
    pub async fn delete(&self, community_id: &str, acting_user_id: &str) -> Result<()> {
        let community = self.get(community_id).await?;
        if community.creator_id != acting_user_id {
            return Err(MeetmapError::not_authorized(
                "only the creator can delete a community",
            ));
        }

        let memberships = [Filter::eq("community_id", community_id)];
        self.gateway.delete(Table::Participants, &memberships).await?;

        let filters = [Filter::eq("id", community_id)];
        self.gateway.delete(Table::Communities, &filters).await?;

        tracing::debug!("Deleted community {community_id}");
        Ok(())
    }
}
