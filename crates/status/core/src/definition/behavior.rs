//! Data-driven effect behaviors.
//!
//! Most kinds only differ in what they do while applied, so that part is
//! expressed as closed enums rather than per-kind code. Resource changes only
//! run where the affected combatant is simulated; stat bonuses run on every
//! participant so mirrored combatants show the same derived stats.

use crate::authority::SessionMode;
use crate::combatant::{Resource, Stat, World};
use crate::definition::SyncField;
use crate::instance::EffectInstance;

/// Whether the instance survives its behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    Continue,
    /// The owner could not sustain the effect; remove it on every participant.
    RemoveEverywhere,
}

/// Runs every tick while the instance is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstantEffect {
    StatBonus { stat: Stat, field: SyncField },
    RestoreResource { resource: Resource, field: SyncField },
}

impl ConstantEffect {
    pub fn field(&self) -> Option<SyncField> {
        match self {
            Self::StatBonus { field, .. } | Self::RestoreResource { field, .. } => Some(*field),
        }
    }

    pub(crate) fn run(&self, instance: &EffectInstance, session: SessionMode, world: &mut dyn World) {
        match *self {
            Self::StatBonus { stat, field } => {
                world.apply_stat_delta(instance.target, stat, instance.value(field));
            }
            Self::RestoreResource { resource, field } => {
                if session.is_local(instance.target) {
                    world.restore_resource(instance.target, resource, instance.value(field));
                }
            }
        }
    }
}

/// Runs when the kind's shared periodic timer fires.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PeriodicEffect {
    /// Upkeep paid by the owner. Failing to pay ends the effect everywhere.
    DrainOwnerResource { resource: Resource, amount: f32 },
    RestoreResource { resource: Resource, field: SyncField },
    DamageOverTime { field: SyncField, scale_by_stacks: bool },
}

impl PeriodicEffect {
    pub fn field(&self) -> Option<SyncField> {
        match self {
            Self::DrainOwnerResource { .. } => None,
            Self::RestoreResource { field, .. } | Self::DamageOverTime { field, .. } => Some(*field),
        }
    }

    pub(crate) fn run(
        &self,
        instance: &EffectInstance,
        session: SessionMode,
        world: &mut dyn World,
    ) -> EffectOutcome {
        match *self {
            Self::DrainOwnerResource { resource, amount } => {
                if session.is_local(instance.owner)
                    && !world.spend_resource(instance.owner, resource, amount)
                {
                    return EffectOutcome::RemoveEverywhere;
                }
            }
            Self::RestoreResource { resource, field } => {
                if session.is_local(instance.target) {
                    world.restore_resource(instance.target, resource, instance.value(field));
                }
            }
            Self::DamageOverTime {
                field,
                scale_by_stacks,
            } => {
                if session.is_local(instance.target) {
                    let mut amount = instance.value(field);
                    if scale_by_stacks {
                        amount *= instance.value(SyncField::Stacks).max(1.0);
                    }
                    world.apply_damage(instance.target, amount);
                }
            }
        }
        EffectOutcome::Continue
    }
}
