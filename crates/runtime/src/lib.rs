//! Runtime orchestration for networked status-effect participants.
//!
//! This crate wires [`status_core::StatusEngine`] instances to a transport,
//! a host world and a topic event bus. Consumers embed [`Participant`] per
//! process, or [`LocalSession`] to run a server and its clients in one
//! process over loopback channels.
//!
//! Modules are organized by responsibility:
//! - [`participant`] drives one engine: inbox, tick, outbox, events
//! - [`transport`] and [`hub`] carry encoded sync messages between endpoints
//! - [`events`] provides the topic-based event bus
//! - [`driver`] runs a fixed-rate tick loop until told to stop
//! - [`world`] is an in-memory host world for simulations and tests
pub mod driver;
pub mod error;
pub mod events;
pub mod hub;
pub mod participant;
pub mod session;
pub mod transport;
pub mod world;

mod config;

pub use config::RuntimeConfig;
pub use driver::{ShutdownHandle, TickDriver};
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, Topic};
pub use hub::SessionHub;
pub use participant::{HostWorld, Participant, StepReport};
pub use session::LocalSession;
pub use transport::{ChannelTransport, Envelope, Transport};
pub use world::{SimCombatant, SimWorld};
