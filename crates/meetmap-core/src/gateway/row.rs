//! Row and filter vocabulary shared by the gateway trait and its backends.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The tables the core reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Communities,
    Participants,
    Messages,
    Profiles,
}

impl Table {
    /// Stable snake_case name, used for logging and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Communities => "communities",
            Table::Participants => "community_participants",
            Table::Messages => "chat_messages",
            Table::Profiles => "profiles",
        }
    }

    /// The column the store stamps with its own clock on insert.
    ///
    /// The caller never supplies this value; the store overwrites it with a
    /// monotonically non-decreasing timestamp.
    pub fn timestamp_column(&self) -> Option<&'static str> {
        match self {
            Table::Communities | Table::Messages => Some("created_at"),
            Table::Participants => Some("joined_at"),
            Table::Profiles => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An untyped store row.
pub type Row = serde_json::Map<String, Value>;

/// Comparison operator in a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    Gte,
}

/// A single column predicate, ANDed with its siblings by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Equality predicate.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Greater-or-equal predicate (inclusive lower bound).
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a row.
    ///
    /// Rows missing the column never match.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Gte => {
                compare_values(actual, &self.value).is_some_and(|ord| ord != Ordering::Less)
            }
        }
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Orders two JSON values the way the store does.
///
/// RFC 3339 strings compare chronologically, numbers numerically, other
/// strings lexicographically. Mixed or non-orderable types yield `None`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            let ta = a.parse::<DateTime<Utc>>();
            let tb = b.parse::<DateTime<Utc>>();
            match (ta, tb) {
                (Ok(ta), Ok(tb)) => Some(ta.cmp(&tb)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Number(a), Value::Number(b)) => {
            a.as_f64().and_then(|a| b.as_f64().and_then(|b| a.partial_cmp(&b)))
        }
        _ => None,
    }
}

/// Coerces an untyped row into a typed entity.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Serializes a typed entity into a row.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(crate::error::MeetmapError::internal(format!(
            "expected an object row, got {other}"
        ))),
    }
}
