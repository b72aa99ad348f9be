//! Join-time message visibility.
//!
//! A user who joins a community mid-conversation must not see messages sent
//! before they joined; re-joining after leaving resets the cutoff to the
//! new join timestamp, so each membership period exposes a disjoint window
//! of history.
//!
//! The cutoff is applied twice: as a query predicate on the historical
//! fetch, and as a client-side guard on every live event, because the live
//! subscription is filtered only by community id: the store cannot express
//! the per-viewer join-time predicate in its subscription filter.

use chrono::{DateTime, Utc};

use super::message::Message;
use crate::membership::Participation;

/// The inclusive lower bound for message visibility: the join timestamp.
pub fn cutoff(participation: &Participation) -> DateTime<Utc> {
    participation.joined_at
}

/// True iff the message was created at or after the cutoff.
pub fn is_visible(message: &Message, cutoff: DateTime<Utc>) -> bool {
    message.created_at >= cutoff
}
