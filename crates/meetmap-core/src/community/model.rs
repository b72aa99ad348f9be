//! Community domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MeetmapError, Result};
use crate::gateway::{Row, from_row, to_row};

/// A time-boxed, location-anchored meetup group.
///
/// `id` and `created_at` are server-assigned; everything else is supplied
/// through a [`CommunityDraft`]. Mutable only by its creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub meeting_start: DateTime<Utc>,
    pub meeting_end: DateTime<Utc>,
    pub max_participants: u32,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn from_row(row: Row) -> Result<Self> {
        from_row(row)
    }
}

/// Caller-supplied community fields for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityDraft {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub meeting_start: DateTime<Utc>,
    pub meeting_end: DateTime<Utc>,
    pub max_participants: u32,
}

impl CommunityDraft {
    /// Validates the draft locally, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MeetmapError::validation("title must not be empty"));
        }
        if self.meeting_end < self.meeting_start {
            return Err(MeetmapError::validation(
                "meeting end time must not be before the start time",
            ));
        }
        if self.max_participants < 1 {
            return Err(MeetmapError::validation(
                "a community needs at least one participant slot",
            ));
        }
        Ok(())
    }

    pub fn to_row(&self) -> Result<Row> {
        to_row(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> CommunityDraft {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        CommunityDraft {
            title: "Evening run".to_string(),
            description: "Easy 5k around the park".to_string(),
            latitude: 35.6586,
            longitude: 139.7454,
            meeting_start: start,
            meeting_end: start + chrono::Duration::hours(2),
            max_participants: 8,
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut d = draft();
        d.meeting_end = d.meeting_start - chrono::Duration::minutes(1);
        assert!(d.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_zero_length_meeting_allowed() {
        // end == start is the inclusive boundary of the invariant
        let mut d = draft();
        d.meeting_end = d.meeting_start;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut d = draft();
        d.max_participants = 0;
        assert!(d.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert!(d.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_community_row_round_trip() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        let community = Community {
            id: "c-1".to_string(),
            creator_id: "u-1".to_string(),
            title: "Evening run".to_string(),
            description: String::new(),
            latitude: 35.0,
            longitude: 139.0,
            meeting_start: start,
            meeting_end: start,
            max_participants: 4,
            created_at: start,
        };
        let row = to_row(&community).unwrap();
        assert_eq!(Community::from_row(row).unwrap(), community);
    }
}
