//! Topic-based event bus for runtime events.
//!
//! Participants publish engine lifecycle entries and presentation signals to
//! specific topics; consumers subscribe only to the topics they need.

mod bus;

pub use bus::{Event, EventBus, Topic};
