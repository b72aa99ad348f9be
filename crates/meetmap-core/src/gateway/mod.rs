//! Persistence gateway abstraction.
//!
//! The store behind this module is a hosted backend offering row CRUD with
//! filter predicates and a subscribe-to-insert primitive. The core never
//! talks to a concrete product API; everything goes through the
//! [`PersistenceGateway`] trait so controllers stay pure functions of their
//! inputs and can be tested against an in-memory store.
//!
//! Rows are untyped JSON maps. Typed coercion into domain entities happens
//! at the call sites (and, for live-feed payloads, at the subscription
//! boundary) via [`from_row`] / [`to_row`]; payloads are never trusted
//! as-is.

mod persistence;
mod row;

pub use persistence::{InsertEvent, LiveFeed, PersistenceGateway, SubscriptionId};
pub use row::{Filter, FilterOp, OrderBy, Row, Table, compare_values, from_row, to_row};
