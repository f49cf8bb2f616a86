//! Outputs for presentation layers: redraw/visual signals, the effect list
//! view and the lifecycle journal.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::combatant::CombatantId;
use crate::definition::{EffectKind, VisualLayers};
use crate::instance::InstanceId;
use crate::removal::RemovalReason;

/// Pending presentation work accumulated since the last drain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiSignals {
    /// The local effect list changed and should be redrawn.
    pub redraw: bool,
    /// Combatants whose effect visuals must be rebuilt, per layer.
    pub visuals: BTreeMap<CombatantId, VisualLayers>,
}

impl UiSignals {
    pub fn rebuild_visuals(&mut self, target: CombatantId, layers: VisualLayers) {
        if layers.is_empty() {
            return;
        }
        *self.visuals.entry(target).or_insert(VisualLayers::empty()) |= layers;
    }

    pub fn is_empty(&self) -> bool {
        !self.redraw && self.visuals.is_empty()
    }
}

/// One entry of a combatant's effect list.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectView {
    pub kind: EffectKind,
    pub instance_id: InstanceId,
    pub name: String,
    pub description: String,
    pub icon: Option<u16>,
    pub remaining: Option<Duration>,
    pub remaining_label: String,
    pub right_click_end: bool,
}

/// Lifecycle journal entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Started {
        target: CombatantId,
        owner: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    },
    /// An instant effect ran.
    Executed {
        target: CombatantId,
        owner: CombatantId,
        kind: EffectKind,
    },
    Merged {
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    },
    Replaced {
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    },
    Ended {
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        reason: RemovalReason,
    },
}

impl EngineEvent {
    pub fn target(&self) -> CombatantId {
        match *self {
            Self::Started { target, .. }
            | Self::Executed { target, .. }
            | Self::Merged { target, .. }
            | Self::Replaced { target, .. }
            | Self::Ended { target, .. } => target,
        }
    }

    pub fn kind(&self) -> EffectKind {
        match *self {
            Self::Started { kind, .. }
            | Self::Executed { kind, .. }
            | Self::Merged { kind, .. }
            | Self::Replaced { kind, .. }
            | Self::Ended { kind, .. } => kind,
        }
    }
}
