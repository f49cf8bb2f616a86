use crate::authority::Recipient;
use crate::combatant::CombatantId;
use crate::definition::EffectKind;
use crate::instance::InstanceId;

/// Announces a new or updated instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddEffect {
    pub kind: EffectKind,
    pub target: CombatantId,
    pub owner: CombatantId,
    /// The owner's id for the instance.
    pub instance_id: InstanceId,
    /// Declared synced fields, in the kind's declared order.
    pub fields: Vec<f32>,
    /// Zero means "use the kind's default duration".
    pub remaining_secs: f32,
    /// Zero means "fire immediately".
    pub secs_until_periodic: f32,
    pub extra: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveEffect {
    pub kind: EffectKind,
    pub target: CombatantId,
    pub owner: CombatantId,
    /// The owner's id for the instance.
    pub instance_id: InstanceId,
    pub extra: Vec<u8>,
}

/// Full resync of one combatant's synced effects.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetAllEffects {
    pub target: CombatantId,
    pub effects: Vec<AddEffect>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyncMessage {
    Add(AddEffect),
    Remove(RemoveEffect),
    SetAll(SetAllEffects),
}

impl SyncMessage {
    pub fn target(&self) -> CombatantId {
        match self {
            Self::Add(add) => add.target,
            Self::Remove(remove) => remove.target,
            Self::SetAll(set) => set.target,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::SetAll(_) => "set_all",
        }
    }
}

/// A message queued by the engine for the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: SyncMessage,
}
