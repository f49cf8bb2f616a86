//! Combatant identity and the host-world collaborator interface.
//!
//! The engine does not own combatant state. Hosts implement [`World`] over
//! their own player/NPC storage, and the engine queries or mutates it through
//! that trait while ticking, creating and removing effects.

use std::collections::BTreeMap;
use std::fmt;

use crate::authority::SessionMode;
use crate::container::EffectContainer;
use crate::definition::EffectKind;

/// Network slot of a connected player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId(pub u8);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Anything that can own or carry status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatantId {
    Player(PeerId),
    Npc(u16),
}

impl CombatantId {
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player(_))
    }

    pub const fn is_npc(self) -> bool {
        matches!(self, Self::Npc(_))
    }

    /// Network slot for players, `None` for NPCs.
    pub const fn peer(self) -> Option<PeerId> {
        match self {
            Self::Player(peer) => Some(peer),
            Self::Npc(_) => None,
        }
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(peer) => write!(f, "player#{}", peer.0),
            Self::Npc(index) => write!(f, "npc#{index}"),
        }
    }
}

/// Impairments that can end an owner's effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Condition {
    Immobilized,
    Silenced,
}

/// Stats that constant effects adjust every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Stat {
    Defense,
    Attack,
    MoveSpeed,
    UseSpeed,
}

/// Pools that periodic effects drain or restore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Life,
    Mana,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassiveId(pub u16);

/// Input binding polled for "hold to channel" effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HotKey(pub u16);

/// Host-side combatant storage.
///
/// Query methods must be side-effect free. Mutations are only invoked from
/// effect behaviors and hooks; the engine never writes combatant state itself.
pub trait World {
    /// False once the combatant has left the session or despawned.
    fn is_active(&self, id: CombatantId) -> bool;

    fn is_dead(&self, id: CombatantId) -> bool;

    fn has_condition(&self, id: CombatantId, condition: Condition) -> bool;

    fn has_ability(&self, id: CombatantId, ability: AbilityId) -> bool;

    fn has_passive(&self, id: CombatantId, passive: PassiveId) -> bool;

    /// Whether the local input device currently holds `key`.
    fn key_held(&self, key: HotKey) -> bool;

    /// Current / maximum of `resource`, in `0.0..=1.0`.
    fn resource_ratio(&self, id: CombatantId, resource: Resource) -> f32;

    fn apply_stat_delta(&mut self, id: CombatantId, stat: Stat, amount: f32);

    /// Pays `amount` if the combatant can afford it. Returns false and leaves
    /// the pool untouched otherwise.
    fn spend_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) -> bool;

    fn restore_resource(&mut self, id: CombatantId, resource: Resource, amount: f32);

    fn apply_damage(&mut self, id: CombatantId, amount: f32);

    /// Marks the combatant as channelling for the current tick.
    fn set_channelling(&mut self, id: CombatantId);
}

/// Read-only view joining a combatant's identity, the host world and the
/// effects currently attached to it.
#[derive(Clone, Copy)]
pub struct Combatant<'a> {
    id: CombatantId,
    session: SessionMode,
    world: &'a dyn World,
    containers: &'a BTreeMap<CombatantId, EffectContainer>,
}

impl<'a> Combatant<'a> {
    pub fn new(
        id: CombatantId,
        session: SessionMode,
        world: &'a dyn World,
        containers: &'a BTreeMap<CombatantId, EffectContainer>,
    ) -> Self {
        Self {
            id,
            session,
            world,
            containers,
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn is_player(&self) -> bool {
        self.id.is_player()
    }

    /// Whether this process is authoritative for the combatant.
    pub fn is_local(&self) -> bool {
        self.session.is_local(self.id)
    }

    pub fn is_active(&self) -> bool {
        self.world.is_active(self.id)
    }

    pub fn is_dead(&self) -> bool {
        self.world.is_dead(self.id)
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.world.has_condition(self.id, condition)
    }

    pub fn has_ability(&self, ability: AbilityId) -> bool {
        self.world.has_ability(self.id, ability)
    }

    pub fn has_passive(&self, passive: PassiveId) -> bool {
        self.world.has_passive(self.id, passive)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.containers
            .get(&self.id)
            .is_some_and(|container| container.has_effect(kind))
    }

    pub fn world(&self) -> &'a dyn World {
        self.world
    }
}

impl fmt::Debug for Combatant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant")
            .field("id", &self.id)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
