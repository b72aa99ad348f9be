//! The persistence gateway trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::row::{Filter, OrderBy, Row, Table};
use crate::error::Result;

/// Identifies a live subscription at the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// An insert notification from the live feed.
///
/// The payload is an untyped row; callers must coerce it into a domain
/// entity before acting on it.
#[derive(Debug, Clone)]
pub struct InsertEvent {
    pub table: Table,
    pub row: Row,
}

/// A live insert feed handle.
///
/// Each open chat session owns its feed exclusively; dropping the receiver
/// without unsubscribing leaves the store-side registration behind, so
/// sessions unsubscribe on every exit path.
#[derive(Debug)]
pub struct LiveFeed {
    pub id: SubscriptionId,
    pub receiver: mpsc::UnboundedReceiver<InsertEvent>,
}

/// An abstract store offering row CRUD with filter predicates and a
/// subscribe-to-insert primitive.
///
/// The store assigns ids and timestamps on insert (see
/// [`Table::timestamp_column`]); assigned timestamps are monotonically
/// non-decreasing per store. All calls suspend at their network round trip
/// and never block the caller's event loop.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns the rows matching all `filters`, optionally sorted.
    async fn select(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>>;

    /// Inserts a row and returns it with server-assigned fields filled in.
    async fn insert(&self, table: Table, row: Row) -> Result<Row>;

    /// Merges `patch` into every row matching all `filters`.
    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> Result<()>;

    /// Deletes every row matching all `filters`.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<()>;

    /// Counts the rows matching all `filters`.
    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64>;

    /// Opens a live feed of inserts into `table` matching all `filters`.
    async fn subscribe_inserts(&self, table: Table, filters: &[Filter]) -> Result<LiveFeed>;

    /// Tears down a live feed. Events are never delivered to an
    /// unsubscribed handle.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}
