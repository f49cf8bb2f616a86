//! Deterministic status-effect engine shared by every participant.
//!
//! `status-core` defines the effect table ([`definition`]), live instances and
//! their containers, the per-tick scheduler and removal rules, the authority
//! model deciding who enforces and announces what, and the sync messages
//! exchanged between participants. All mutation flows through
//! [`engine::StatusEngine`]; the host provides combatant state through the
//! [`combatant::World`] trait and moves the queued [`sync::Outbound`] messages.
pub mod authority;
pub mod combatant;
pub mod config;
pub mod container;
pub mod definition;
pub mod engine;
pub mod error;
pub mod instance;
pub mod merge;
pub mod removal;
pub mod scheduler;
pub mod signals;
pub mod sync;
pub mod time;

#[cfg(test)]
mod test_helpers;

pub use authority::{Authority, Endpoint, Recipient, SessionMode};
pub use combatant::{
    AbilityId, Combatant, CombatantId, Condition, HotKey, PassiveId, PeerId, Resource, Stat, World,
};
pub use config::EngineConfig;
pub use container::{AddOutcome, EffectContainer, Origin, RejectReason};
pub use definition::{
    ApplyKind, ConstantEffect, DurationKind, EffectDefinition, EffectHooks, EffectKind,
    EffectOutcome, EffectTiming, Eligibility, LimitKind, NoHooks, PeriodicEffect, Registry,
    RemovalRules, RemovalTriggers, SyncField, UiKind, VisualLayers,
};
pub use engine::{CreateRequest, StatusEngine};
pub use error::{EffectError, ErrorSeverity, StatusError};
pub use instance::{EffectInstance, InstanceId, SyncData};
pub use removal::RemovalReason;
pub use scheduler::PeriodicTimers;
pub use signals::{EffectView, EngineEvent, UiSignals};
pub use sync::{AddEffect, Outbound, RemoveEffect, SetAllEffects, SyncMessage};
pub use time::{Expiry, Timestamp};
