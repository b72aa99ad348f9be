//! Chat domain module.
//!
//! Combines fetched history, optimistic local sends and live inserts into
//! one ordered, deduplicated sequence per open session.
//!
//! # Module structure
//!
//! - `message`: message entity and chat entry types
//! - `visibility`: join-time cutoff and the visibility predicate
//! - `session`: the reconciled chat session state machine

mod message;
mod session;
pub mod visibility;

pub use message::{ChatEntry, Message, PendingMessage};
pub use session::{ChatPhase, ChatSession};
