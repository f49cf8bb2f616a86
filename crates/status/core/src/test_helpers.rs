//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;

use crate::combatant::{
    AbilityId, CombatantId, Condition, HotKey, PassiveId, PeerId, Resource, Stat, World,
};
use crate::definition::{
    ApplyKind, ConstantEffect, EffectDefinition, EffectKind, EffectTiming, LimitKind,
    PeriodicEffect, Registry, SyncField,
};

pub const BLOCK_ABILITY: AbilityId = AbilityId(1);
pub const BLOCK_KEY: HotKey = HotKey(1);
pub const P1: CombatantId = CombatantId::Player(PeerId(1));
pub const P2: CombatantId = CombatantId::Player(PeerId(2));
pub const NPC: CombatantId = CombatantId::Npc(0);

#[derive(Debug, Default)]
pub struct TestWorld {
    pub inactive: Vec<CombatantId>,
    pub dead: Vec<CombatantId>,
    pub conditions: Vec<(CombatantId, Condition)>,
    pub abilities: Vec<(CombatantId, AbilityId)>,
    pub passives: Vec<(CombatantId, PassiveId)>,
    pub held_keys: Vec<HotKey>,
    pub pools: HashMap<(CombatantId, Resource), f32>,
    pub stat_deltas: Vec<(CombatantId, Stat, f32)>,
    pub restored: Vec<(CombatantId, Resource, f32)>,
    pub damage: Vec<(CombatantId, f32)>,
    pub channelling: Vec<CombatantId>,
}

impl TestWorld {
    pub fn defense_of(&self, id: CombatantId) -> f32 {
        self.stat_deltas
            .iter()
            .filter(|(who, stat, _)| *who == id && *stat == Stat::Defense)
            .map(|(_, _, amount)| amount)
            .sum()
    }
}

impl World for TestWorld {
    fn is_active(&self, id: CombatantId) -> bool {
        !self.inactive.contains(&id)
    }

    fn is_dead(&self, id: CombatantId) -> bool {
        self.dead.contains(&id)
    }

    fn has_condition(&self, id: CombatantId, condition: Condition) -> bool {
        self.conditions.contains(&(id, condition))
    }

    fn has_ability(&self, id: CombatantId, ability: AbilityId) -> bool {
        self.abilities.contains(&(id, ability))
    }

    fn has_passive(&self, id: CombatantId, passive: PassiveId) -> bool {
        self.passives.contains(&(id, passive))
    }

    fn key_held(&self, key: HotKey) -> bool {
        self.held_keys.contains(&key)
    }

    fn resource_ratio(&self, id: CombatantId, resource: Resource) -> f32 {
        self.pools.get(&(id, resource)).copied().unwrap_or(100.0) / 100.0
    }

    fn apply_stat_delta(&mut self, id: CombatantId, stat: Stat, amount: f32) {
        self.stat_deltas.push((id, stat, amount));
    }

    fn spend_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) -> bool {
        let pool = self.pools.entry((id, resource)).or_insert(100.0);
        if *pool < amount {
            return false;
        }
        *pool -= amount;
        true
    }

    fn restore_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) {
        self.restored.push((id, resource, amount));
    }

    fn apply_damage(&mut self, id: CombatantId, amount: f32) {
        self.damage.push((id, amount));
    }

    fn set_channelling(&mut self, id: CombatantId) {
        self.channelling.push(id);
    }
}

pub fn block() -> EffectDefinition {
    EffectDefinition::channel_toggle(
        EffectKind::WarriorBlock,
        BLOCK_ABILITY,
        BLOCK_KEY,
        Resource::Mana,
        5.0,
        0.1,
    )
    .fields(&[SyncField::Magnitude1])
    .constant(ConstantEffect::StatBonus {
        stat: Stat::Defense,
        field: SyncField::Magnitude1,
    })
}

pub fn regeneration() -> EffectDefinition {
    EffectDefinition::new(EffectKind::Regeneration)
        .timed(8.0)
        .timing(EffectTiming::Periodic, 1.0)
        .limit(LimitKind::OnePerOwner)
        .apply(ApplyKind::BestPerOwner)
        .fields(&[SyncField::Magnitude1])
        .periodic(PeriodicEffect::RestoreResource {
            resource: Resource::Life,
            field: SyncField::Magnitude1,
        })
}

pub fn venom() -> EffectDefinition {
    EffectDefinition::new(EffectKind::Venom)
        .timed(6.0)
        .timing(EffectTiming::Periodic, 1.0)
        .limit(LimitKind::One)
        .apply(ApplyKind::Best)
        .fields(&[SyncField::Magnitude1, SyncField::Stacks])
        .autostack(5)
        .periodic(PeriodicEffect::DamageOverTime {
            field: SyncField::Magnitude1,
            scale_by_stacks: true,
        })
}

pub fn rally() -> EffectDefinition {
    EffectDefinition::timed_constant(EffectKind::Rally, 10.0)
        .limit(LimitKind::Many)
        .apply(ApplyKind::BestPerOwner)
        .fields(&[SyncField::Magnitude1])
        .constant(ConstantEffect::StatBonus {
            stat: Stat::Defense,
            field: SyncField::Magnitude1,
        })
}

pub fn mend() -> EffectDefinition {
    EffectDefinition::new(EffectKind::Mend)
        .instant()
        .timing(EffectTiming::Periodic, 1.0)
        .fields(&[SyncField::Magnitude1])
        .periodic(PeriodicEffect::RestoreResource {
            resource: Resource::Life,
            field: SyncField::Magnitude1,
        })
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    for definition in [block(), regeneration(), venom(), rally(), mend()] {
        registry
            .register(definition)
            .expect("test definitions are valid");
    }
    registry
}
