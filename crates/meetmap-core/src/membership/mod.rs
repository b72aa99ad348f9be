//! Membership domain module.
//!
//! A participation is the membership relation between a user and a
//! community, timestamped at join. At most one participation exists per
//! (community, user) pair, and the creator's participation survives until
//! the community itself is deleted.

mod controller;
mod model;

pub use controller::{MembershipController, ParticipantEntry};
pub use model::Participation;
