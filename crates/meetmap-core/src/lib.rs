//! meetmap client core.
//!
//! The reconciliation layer between a location-based meetup UI and its
//! hosted store: community lifecycle, capacity-limited membership,
//! join-time message visibility, and the live chat session state.
//!
//! The store is reached exclusively through [`gateway::PersistenceGateway`];
//! every controller call takes the acting user id explicitly, so the whole
//! core is a pure function of its inputs and testable against an in-memory
//! backend.

pub mod chat;
pub mod community;
pub mod config;
pub mod error;
pub mod gateway;
pub mod membership;
pub mod profile;

// Re-export common error type
pub use error::{MeetmapError, Result};
