//! Shared fixtures for the scenario tests.
#![allow(dead_code)] // not every test binary uses every fixture

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use meetmap_core::community::CommunityDraft;
use meetmap_core::gateway::{PersistenceGateway, Row, Table};
use meetmap_infrastructure::InMemoryGateway;

pub fn gateway() -> Arc<InMemoryGateway> {
    Arc::new(InMemoryGateway::new())
}

pub fn draft(max_participants: u32) -> CommunityDraft {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
    CommunityDraft {
        title: "Evening run".to_string(),
        description: "Easy 5k around the park".to_string(),
        latitude: 35.6586,
        longitude: 139.7454,
        meeting_start: start,
        meeting_end: start + chrono::Duration::hours(2),
        max_participants,
    }
}

pub async fn insert_profile(gateway: &Arc<InMemoryGateway>, user_id: &str, username: &str) {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(user_id));
    row.insert("username".to_string(), json!(username));
    gateway.insert(Table::Profiles, row).await.unwrap();
}

/// Inserts a chat message directly at the store, bypassing any session.
pub async fn insert_message(
    gateway: &Arc<InMemoryGateway>,
    community_id: &str,
    user_id: &str,
    content: &str,
) {
    let mut row = Row::new();
    row.insert("community_id".to_string(), json!(community_id));
    row.insert("user_id".to_string(), json!(user_id));
    row.insert("content".to_string(), json!(content));
    gateway.insert(Table::Messages, row).await.unwrap();
}
