//! Common error infrastructure for status-core.
//!
//! Every fallible engine operation returns [`EffectError`]. Errors are split in
//! two families that callers handle differently:
//!
//! - **Configuration**: a definition, request, or payload that does not fit the
//!   registered effect table (unknown kind, undeclared field, bad extra bytes).
//! - **Authority**: a process attempted something only another participant may
//!   do (merging a remote-owned instance, force-syncing a local combatant).
//!
//! The engine logs each error through `tracing` and aborts only the operation
//! that raised it. Nothing in this crate panics on bad input.

use crate::combatant::CombatantId;
use crate::definition::{EffectKind, SyncField};

/// Severity level of an error, used for categorization and handling strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Input does not match the effect table or the wire format.
    ///
    /// Examples: unknown effect kind, field count mismatch, malformed extra bytes
    Configuration,

    /// The calling process lacks authority for the operation.
    ///
    /// Examples: merge by non-owner, force-sync of the local combatant
    Authority,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Authority => "authority",
        }
    }

    /// Returns true if this error indicates a desynchronized or misbehaving peer.
    pub const fn is_authority(&self) -> bool {
        matches!(self, Self::Authority)
    }
}

/// Common trait for all status-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity by who is at fault, not by impact
pub trait StatusError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised by definition registration, creation, merging and sync handling.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EffectError {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("effect kind {0} is not registered")]
    UnknownKind(EffectKind),

    #[error("{kind} cannot target {target}")]
    InvalidTarget {
        kind: EffectKind,
        target: CombatantId,
    },

    #[error("{kind} cannot be owned by {owner}")]
    InvalidOwner { kind: EffectKind, owner: CombatantId },

    #[error("{kind} does not declare synced field {field}")]
    UndeclaredField { kind: EffectKind, field: SyncField },

    #[error("{kind} expects {expected} synced values, got {actual}")]
    FieldCountMismatch {
        kind: EffectKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid definition for {kind}: {reason}")]
    InvalidDefinition {
        kind: EffectKind,
        reason: &'static str,
    },

    #[error("malformed extra payload for {kind}")]
    MalformedExtra { kind: EffectKind },

    #[error("combatant {0} has no effect container")]
    UnknownCombatant(CombatantId),

    // ========================================================================
    // Authority
    // ========================================================================
    #[error("merge of {kind} on {target} attempted by a process that does not own it")]
    MergeByNonOwner {
        kind: EffectKind,
        target: CombatantId,
    },

    #[error("cannot force-sync the effects of local combatant {target}")]
    ForceSyncLocal { target: CombatantId },

    #[error("auto-passive {kind} cannot be added on the server")]
    AutoPassiveOnServer { kind: EffectKind },

    #[error("auto-passive {kind} requires a local combatant, got {combatant}")]
    AutoPassiveNotLocal {
        kind: EffectKind,
        combatant: CombatantId,
    },

    #[error("{kind} is not an auto-passive effect")]
    NotAutoPassive { kind: EffectKind },

    #[error("{kind} on {target} cannot be ended by its target here")]
    EndNotPermitted {
        kind: EffectKind,
        target: CombatantId,
    },
}

impl StatusError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownKind(_)
            | Self::InvalidTarget { .. }
            | Self::InvalidOwner { .. }
            | Self::UndeclaredField { .. }
            | Self::FieldCountMismatch { .. }
            | Self::InvalidDefinition { .. }
            | Self::MalformedExtra { .. }
            | Self::UnknownCombatant(_) => ErrorSeverity::Configuration,
            Self::MergeByNonOwner { .. }
            | Self::ForceSyncLocal { .. }
            | Self::AutoPassiveOnServer { .. }
            | Self::AutoPassiveNotLocal { .. }
            | Self::NotAutoPassive { .. }
            | Self::EndNotPermitted { .. } => ErrorSeverity::Authority,
        }
    }

    fn error_code(&self) -> &'static str {
        self.into()
    }
}
