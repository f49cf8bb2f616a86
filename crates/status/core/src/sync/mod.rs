//! Replication messages exchanged between participants.
//!
//! Messages carry relative times only (seconds remaining, seconds until the
//! next periodic fire), so participants never need a shared absolute clock.

#[cfg(feature = "serde")]
mod codec;
mod messages;

#[cfg(feature = "serde")]
pub use codec::{CodecError, decode, encode};
pub use messages::{AddEffect, Outbound, RemoveEffect, SetAllEffects, SyncMessage};
