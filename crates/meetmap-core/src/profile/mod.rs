//! User profile read-through.
//!
//! Messages and rosters carry denormalized author display info resolved at
//! read time from the profiles table.

mod directory;
mod model;

pub use directory::ProfileDirectory;
pub use model::UserProfile;
