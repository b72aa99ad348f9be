//! In-memory PersistenceGateway implementation.
//!
//! Backs the test suite and local/demo runs. Reproduces the store contract
//! the core relies on: server-assigned ids and monotonically non-decreasing
//! timestamps, filtered selects, and insert fan-out to live subscribers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use meetmap_core::error::Result;
use meetmap_core::gateway::{
    Filter, InsertEvent, LiveFeed, OrderBy, PersistenceGateway, Row, SubscriptionId, Table,
    compare_values,
};

struct SubscriptionEntry {
    table: Table,
    filters: Vec<Filter>,
    sender: mpsc::UnboundedSender<InsertEvent>,
}

/// An in-memory store with a live insert feed.
///
/// Interior mutability via std mutexes; no lock is held across an await
/// point. Each subscription owns an unbounded channel; `unsubscribe` drops
/// the sender, so events are never delivered to a closed handle.
pub struct InMemoryGateway {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    subscriptions: Mutex<HashMap<SubscriptionId, SubscriptionEntry>>,
    next_subscription: AtomicU64,
    /// Last timestamp handed out by the store clock.
    clock: Mutex<DateTime<Utc>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Hands out a strictly increasing timestamp, RFC 3339 with
    /// microsecond precision (sub-microsecond differences would be lost in
    /// the serialized row).
    fn next_timestamp(&self) -> String {
        let mut clock = self.clock.lock().unwrap();
        let mut now = Utc::now();
        if now <= *clock {
            now = *clock + TimeDelta::microseconds(1);
        }
        *clock = now;
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Number of live subscriptions, exposed for leak assertions in tests.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    fn fan_out(&self, table: Table, row: &Row) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let mut dead = Vec::new();
        for (id, entry) in subscriptions.iter() {
            if entry.table != table {
                continue;
            }
            if !entry.filters.iter().all(|filter| filter.matches(row)) {
                continue;
            }
            let event = InsertEvent {
                table,
                row: row.clone(),
            };
            if entry.sender.send(event).is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            tracing::debug!("Dropping dead subscription {id}");
            subscriptions.remove(&id);
        }
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn select(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|filter| filter.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(a), Some(b)) => {
                        compare_values(a, b).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    _ => std::cmp::Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row> {
        if !row.contains_key("id") {
            row.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
        }
        if let Some(column) = table.timestamp_column() {
            // Always server-assigned, whatever the caller supplied
            row.insert(column.to_string(), json!(self.next_timestamp()));
        }

        {
            let mut tables = self.tables.lock().unwrap();
            tables.entry(table).or_default().push(row.clone());
        }
        tracing::debug!("Inserted row into {table}");
        self.fan_out(table, &row);
        Ok(row)
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Row) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(&table) {
            for row in rows
                .iter_mut()
                .filter(|row| filters.iter().all(|filter| filter.matches(row)))
            {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(&table) {
            rows.retain(|row| !filters.iter().all(|filter| filter.matches(row)));
        }
        Ok(())
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64> {
        let tables = self.tables.lock().unwrap();
        let count = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|filter| filter.matches(row)))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn subscribe_inserts(&self, table: Table, filters: &[Filter]) -> Result<LiveFeed> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, AtomicOrdering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscriptions.lock().unwrap().insert(
            id,
            SubscriptionEntry {
                table,
                filters: filters.to_vec(),
                sender,
            },
        );
        tracing::debug!("Opened {id} on {table}");
        Ok(LiveFeed { id, receiver })
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        if self.subscriptions.lock().unwrap().remove(&id).is_some() {
            tracing::debug!("Closed {id}");
        }
        Ok(())
    }
}
