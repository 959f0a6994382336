//! Table adapters
//!
//! This module turns normalized spreadsheet rows into the reconciled model:
//! the dog and trainer registries first, then session records that reference
//! them.

mod avatar;
mod roster;
mod sessions;

pub use avatar::{AvatarSource, InitialsAvatars};
pub use roster::{reconcile_dogs, reconcile_trainers};
pub use sessions::{auto_dog_id, build_sessions, session_id};
