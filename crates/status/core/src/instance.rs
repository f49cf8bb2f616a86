//! A single live effect attached to a target.

use arrayvec::ArrayVec;
use strum::EnumCount;

use crate::combatant::CombatantId;
use crate::definition::{EffectKind, SyncField};
use crate::error::EffectError;
use crate::time::{Expiry, Timestamp};

/// Identifier of an instance within its target's container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceId(pub u8);

impl InstanceId {
    /// Sentinel carried by candidates that have not been attached yet.
    pub const UNASSIGNED: Self = Self(u8::MAX);

    pub const fn is_assigned(self) -> bool {
        self.0 != Self::UNASSIGNED.0
    }
}

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Synced values of one instance, in the kind's declared order.
///
/// Holds at most one value per [`SyncField`]. Fields the kind did not declare
/// are absent, never zero-filled.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncData {
    values: ArrayVec<(SyncField, f32), { SyncField::COUNT }>,
}

impl SyncData {
    /// Every declared field set to zero.
    pub fn zeroed(fields: &[SyncField]) -> Self {
        let mut values = ArrayVec::new();
        for field in fields {
            if !values.iter().any(|(declared, _)| declared == field) {
                values.push((*field, 0.0));
            }
        }
        Self { values }
    }

    /// Declared fields filled, in order, from `raw` (the wire layout).
    pub fn from_values(
        kind: EffectKind,
        fields: &[SyncField],
        raw: &[f32],
    ) -> Result<Self, EffectError> {
        if fields.len() != raw.len() {
            return Err(EffectError::FieldCountMismatch {
                kind,
                expected: fields.len(),
                actual: raw.len(),
            });
        }
        let mut data = Self::zeroed(fields);
        for (slot, value) in data.values.iter_mut().zip(raw) {
            slot.1 = *value;
        }
        Ok(data)
    }

    pub fn get(&self, field: SyncField) -> Option<f32> {
        self.values
            .iter()
            .find(|(declared, _)| *declared == field)
            .map(|(_, value)| *value)
    }

    /// Returns false when `field` is not declared.
    pub fn set(&mut self, field: SyncField, value: f32) -> bool {
        match self.values.iter_mut().find(|(declared, _)| *declared == field) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SyncField, f32)> + '_ {
        self.values.iter().copied()
    }

    /// Values in declared order.
    pub fn to_values(&self) -> Vec<f32> {
        self.values.iter().map(|(_, value)| *value).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One live effect.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectInstance {
    pub kind: EffectKind,
    /// Local handle, unique within the target's container.
    pub instance_id: InstanceId,
    /// Id the owner's process announced. Together with kind and owner it names
    /// the instance in sync messages; equals `instance_id` on the owner.
    pub sync_id: InstanceId,
    pub owner: CombatantId,
    pub target: CombatantId,
    pub expiry: Expiry,
    pub fields: SyncData,
    pub applied_this_tick: bool,
    pub applied_last_tick: bool,
    /// This process checks `expiry` for the instance; other participants wait
    /// for the removal message.
    pub locally_enforces_expiry: bool,
    /// Had a UI entry the last time the effect list was rendered.
    pub was_in_ui: bool,
    /// Kind-specific state carried in the sync extra payload.
    pub extra: Vec<u8>,
    /// Values changed by a merge and have not been re-announced yet.
    pub needs_resync: bool,
}

impl EffectInstance {
    pub fn new(
        kind: EffectKind,
        owner: CombatantId,
        target: CombatantId,
        expiry: Expiry,
        fields: SyncData,
    ) -> Self {
        Self {
            kind,
            instance_id: InstanceId::UNASSIGNED,
            sync_id: InstanceId::UNASSIGNED,
            owner,
            target,
            expiry,
            fields,
            applied_this_tick: false,
            applied_last_tick: false,
            locally_enforces_expiry: false,
            was_in_ui: false,
            extra: Vec::new(),
            needs_resync: false,
        }
    }

    pub fn field(&self, field: SyncField) -> Result<f32, EffectError> {
        self.fields.get(field).ok_or(EffectError::UndeclaredField {
            kind: self.kind,
            field,
        })
    }

    pub fn set_field(&mut self, field: SyncField, value: f32) -> Result<(), EffectError> {
        if self.fields.set(field, value) {
            Ok(())
        } else {
            Err(EffectError::UndeclaredField {
                kind: self.kind,
                field,
            })
        }
    }

    /// Value of a declared field, zero for undeclared ones.
    pub fn value(&self, field: SyncField) -> f32 {
        self.fields.get(field).unwrap_or(0.0)
    }

    /// Strict "better" ordering used by apply selection and merging.
    ///
    /// Compares declared fields in [`SyncField::COMPARE_ORDER`]; the first
    /// strict difference decides. Timed instances then compare end times.
    /// Equal instances are not better than each other.
    pub fn is_better_than(&self, other: &EffectInstance) -> bool {
        for field in SyncField::COMPARE_ORDER {
            if let (Some(mine), Some(theirs)) = (self.fields.get(field), other.fields.get(field)) {
                if mine > theirs {
                    return true;
                }
                if mine < theirs {
                    return false;
                }
            }
        }
        match (self.expiry, other.expiry) {
            (Expiry::At(mine), Expiry::At(theirs)) => mine > theirs,
            _ => false,
        }
    }

    /// Icon label for the remaining time: `"N m"` while at least a minute
    /// remains, otherwise `"N s"`. Empty for non-timed instances.
    pub fn remaining_label(&self, now: Timestamp) -> String {
        let Some(remaining) = self.expiry.remaining(now) else {
            return String::new();
        };
        let secs = remaining.as_secs();
        let minutes = secs / 60;
        if minutes > 0 {
            format!("{minutes} m")
        } else {
            format!("{secs} s")
        }
    }

    pub(crate) fn handle(&self) -> (EffectKind, InstanceId) {
        (self.kind, self.instance_id)
    }
}
