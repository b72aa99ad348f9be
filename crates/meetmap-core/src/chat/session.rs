//! The reconciled chat session state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

use super::message::{ChatEntry, Message, PendingMessage};
use super::visibility;
use crate::config::{ChatSettings, ClientConfig, RealtimeSettings};
use crate::error::{MeetmapError, Result};
use crate::gateway::{Filter, InsertEvent, LiveFeed, OrderBy, PersistenceGateway, Row, Table};
use crate::membership::Participation;
use crate::profile::{ProfileDirectory, UserProfile};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    /// History fetch and subscription setup in progress.
    Loading,
    /// Live: entries are current and the feed is open.
    Ready,
    /// Torn down; the session ignores everything from here on.
    Closed,
}

/// One user's live view of one community's chat.
///
/// Holds the ordered, deduplicated sequence of confirmed messages and
/// optimistic pending sends, merged from three sources: the historical
/// fetch at open, local sends, and the live insert feed.
///
/// The session owns its feed exclusively and must be closed on every exit
/// path; a closed session never applies late events (stale-write guard).
pub struct ChatSession {
    gateway: Arc<dyn PersistenceGateway>,
    profiles: ProfileDirectory,
    realtime: RealtimeSettings,
    chat_settings: ChatSettings,
    community_id: String,
    user_id: String,
    /// Inclusive visibility lower bound: the caller's join timestamp.
    cutoff: DateTime<Utc>,
    self_profile: UserProfile,
    phase: ChatPhase,
    entries: Vec<ChatEntry>,
    feed: Option<LiveFeed>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("community_id", &self.community_id)
            .field("user_id", &self.user_id)
            .field("cutoff", &self.cutoff)
            .field("phase", &self.phase)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Opens a chat session for a (community, user) pair.
    ///
    /// Fetches the caller's participation to establish the visibility
    /// cutoff, loads history at-or-after the cutoff in ascending order with
    /// author profiles resolved, then subscribes to community-scoped
    /// inserts and transitions to `Ready`.
    ///
    /// # Errors
    ///
    /// - `NotAParticipant` if no participation exists; chat must not be
    ///   reachable without one
    /// - `Store` / `Serialization` on fetch or subscribe failure
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        config: &ClientConfig,
        community_id: &str,
        user_id: &str,
    ) -> Result<Self> {
        let profiles = ProfileDirectory::new(gateway.clone());
        let participation = fetch_participation(&gateway, community_id, user_id)
            .await?
            .ok_or_else(|| MeetmapError::NotAParticipant {
                community_id: community_id.to_string(),
            })?;
        let cutoff = visibility::cutoff(&participation);
        let self_profile = profiles.resolve(user_id).await;

        let mut session = Self {
            gateway,
            profiles,
            realtime: config.realtime.clone(),
            chat_settings: config.chat.clone(),
            community_id: community_id.to_string(),
            user_id: user_id.to_string(),
            cutoff,
            self_profile,
            phase: ChatPhase::Loading,
            entries: Vec::new(),
            feed: None,
        };

        session.load_history().await?;

        let filters = [Filter::eq("community_id", community_id)];
        let feed = session
            .gateway
            .subscribe_inserts(Table::Messages, &filters)
            .await?;
        tracing::debug!(
            "Opened chat session for {user_id} in {community_id} ({} historical messages, {})",
            session.entries.len(),
            feed.id
        );
        session.feed = Some(feed);
        session.phase = ChatPhase::Ready;
        Ok(session)
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn community_id(&self) -> &str {
        &self.community_id
    }

    /// The ordered display sequence: confirmed messages ascending by store
    /// timestamp, with live events appended in arrival order and pending
    /// sends at their optimistic positions.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Sends a message.
    ///
    /// Blank or over-long text is rejected locally with no round trip.
    /// Otherwise a pending entry appears immediately (UI responsiveness,
    /// not a correctness requirement), then the authoritative insert is
    /// issued; on failure the pending entry is rolled back so the view
    /// never shows a message that was not persisted.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank or over-long text
    /// - `SendFailed` if the store rejected the insert (already rolled back)
    pub async fn send(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;

        let content = text.trim();
        if content.is_empty() {
            return Err(MeetmapError::validation("message must not be empty"));
        }
        if content.chars().count() > self.chat_settings.max_message_length {
            return Err(MeetmapError::validation(format!(
                "message exceeds {} characters",
                self.chat_settings.max_message_length
            )));
        }

        let client_ref = Uuid::new_v4().to_string();
        self.entries.push(ChatEntry::Pending(PendingMessage {
            client_ref: client_ref.clone(),
            community_id: self.community_id.clone(),
            user_id: self.user_id.clone(),
            content: content.to_string(),
            sent_at: Utc::now(),
            author: self.self_profile.clone(),
        }));

        let mut row = Row::new();
        row.insert("community_id".to_string(), json!(self.community_id));
        row.insert("user_id".to_string(), json!(self.user_id));
        row.insert("content".to_string(), json!(content));
        row.insert("client_ref".to_string(), json!(client_ref));

        if let Err(err) = self.gateway.insert(Table::Messages, row).await {
            self.entries.retain(
                |entry| !matches!(entry, ChatEntry::Pending(p) if p.client_ref == client_ref),
            );
            tracing::warn!("Send failed in {}: {err}", self.community_id);
            return Err(MeetmapError::SendFailed(err.to_string()));
        }
        Ok(())
    }

    /// Drains the live feed, applying every queued insert event.
    ///
    /// Each event is coerced into a typed message, checked against the
    /// visibility cutoff, deduplicated by id, and either matched to its
    /// pending entry (self-send echo) or appended. A disconnected feed is
    /// re-established with bounded retry before giving up.
    ///
    /// Returns the number of entries that changed.
    ///
    /// # Errors
    ///
    /// - `SubscriptionLost` when the feed dropped and could not be
    ///   re-established
    pub async fn pump(&mut self) -> Result<usize> {
        self.ensure_open()?;

        let mut applied = 0;
        loop {
            let polled = match self.feed.as_mut() {
                Some(feed) => feed.receiver.try_recv(),
                None => Err(TryRecvError::Disconnected),
            };
            match polled {
                Ok(event) => {
                    if self.apply_event(event).await {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Live feed for {} dropped, resubscribing", self.community_id);
                    self.resubscribe().await?;
                }
            }
        }
        Ok(applied)
    }

    /// Tears the session down: unsubscribes the live feed and discards the
    /// in-memory sequence. Idempotent; must run on every exit path.
    pub async fn close(&mut self) -> Result<()> {
        if self.phase == ChatPhase::Closed {
            return Ok(());
        }
        self.phase = ChatPhase::Closed;
        self.entries.clear();
        if let Some(feed) = self.feed.take() {
            tracing::debug!("Closing chat session for {} ({})", self.community_id, feed.id);
            self.gateway.unsubscribe(feed.id).await?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase == ChatPhase::Closed {
            return Err(MeetmapError::internal("chat session is closed"));
        }
        Ok(())
    }

    async fn load_history(&mut self) -> Result<()> {
        let filters = [
            Filter::eq("community_id", self.community_id.as_str()),
            Filter::gte("created_at", self.cutoff.to_rfc3339()),
        ];
        let order = OrderBy::ascending("created_at");
        let rows = self
            .gateway
            .select(Table::Messages, &filters, Some(&order))
            .await?;

        let mut resolved: HashMap<String, UserProfile> = HashMap::new();
        for row in rows {
            let mut message = Message::from_row(row)?;
            let author = match resolved.get(&message.user_id) {
                Some(profile) => profile.clone(),
                None => {
                    let profile = self.profiles.resolve(&message.user_id).await;
                    resolved.insert(message.user_id.clone(), profile.clone());
                    profile
                }
            };
            message.author = Some(author);
            self.entries.push(ChatEntry::Confirmed(message));
        }
        Ok(())
    }

    /// Applies one live event. Returns whether the entry sequence changed.
    async fn apply_event(&mut self, event: InsertEvent) -> bool {
        if event.table != Table::Messages {
            tracing::warn!("Unexpected live event table: {}", event.table);
            return false;
        }
        let mut message = match Message::from_row(event.row) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!("Discarding malformed live payload: {err}");
                return false;
            }
        };
        if message.community_id != self.community_id {
            return false;
        }
        // The subscription filter is community-only; the per-viewer
        // join-time predicate is enforced here.
        if !visibility::is_visible(&message, self.cutoff) {
            return false;
        }
        if self.contains(&message.id) {
            return false;
        }

        // Self-send echo: the authoritative row replaces its pending entry
        // in place, so a local send appears exactly once.
        if let Some(client_ref) = message.client_ref.clone() {
            let position = self.entries.iter().position(
                |entry| matches!(entry, ChatEntry::Pending(p) if p.client_ref == client_ref),
            );
            if let Some(position) = position {
                if let ChatEntry::Pending(pending) = &self.entries[position] {
                    message.author = Some(pending.author.clone());
                }
                self.entries[position] = ChatEntry::Confirmed(message);
                return true;
            }
        }

        message.author = Some(self.profiles.resolve(&message.user_id).await);
        self.entries.push(ChatEntry::Confirmed(message));
        true
    }

    async fn resubscribe(&mut self) -> Result<()> {
        let filters = [Filter::eq("community_id", self.community_id.as_str())];
        let max_retries = self.realtime.resubscribe_max_retries;
        let backoff = Duration::from_millis(self.realtime.resubscribe_backoff_ms);

        for attempt in 1..=max_retries {
            match self
                .gateway
                .subscribe_inserts(Table::Messages, &filters)
                .await
            {
                Ok(feed) => {
                    tracing::info!(
                        "Re-established live feed for {} ({}) on attempt {attempt}",
                        self.community_id,
                        feed.id
                    );
                    self.feed = Some(feed);
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        "Resubscribe attempt {attempt}/{max_retries} for {} failed: {err}",
                        self.community_id
                    );
                    if attempt < max_retries {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        self.feed = None;
        Err(MeetmapError::SubscriptionLost(format!(
            "gave up after {max_retries} resubscribe attempts"
        )))
    }

    fn contains(&self, message_id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, ChatEntry::Confirmed(m) if m.id == message_id))
    }
}

async fn fetch_participation(
    gateway: &Arc<dyn PersistenceGateway>,
    community_id: &str,
    user_id: &str,
) -> Result<Option<Participation>> {
    let filters = [
        Filter::eq("community_id", community_id),
        Filter::eq("user_id", user_id),
    ];
    let rows = gateway.select(Table::Participants, &filters, None).await?;
    rows.into_iter().next().map(Participation::from_row).transpose()
}
