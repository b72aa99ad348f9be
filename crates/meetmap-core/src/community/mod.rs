//! Community domain module.
//!
//! A community is a time-boxed, location-anchored meetup group with a
//! capacity limit. This module contains the domain model and the lifecycle
//! service (create, update, delete, list).

mod lifecycle;
mod model;

pub use lifecycle::CommunityLifecycle;
pub use model::{Community, CommunityDraft};
