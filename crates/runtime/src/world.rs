//! In-memory host world.
//!
//! Stat deltas from constant effects are re-applied every tick, so they are
//! collected per tick and cleared by [`SimWorld::begin_tick`].

use std::collections::{BTreeMap, HashMap, HashSet};

use status_core::combatant::{AbilityId, Condition, HotKey, PassiveId};
use status_core::{CombatantId, Resource, Stat, World};

/// One combatant's state as the host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimCombatant {
    pub active: bool,
    pub life: f32,
    pub max_life: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub conditions: Vec<Condition>,
    pub abilities: Vec<AbilityId>,
    pub passives: Vec<PassiveId>,
    /// Stat deltas applied during the current tick.
    pub bonuses: HashMap<Stat, f32>,
    pub channelling: bool,
}

impl SimCombatant {
    pub fn new(max_life: f32, max_mana: f32) -> Self {
        Self {
            active: true,
            life: max_life,
            max_life,
            mana: max_mana,
            max_mana,
            conditions: Vec::new(),
            abilities: Vec::new(),
            passives: Vec::new(),
            bonuses: HashMap::new(),
            channelling: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    pub fn bonus(&self, stat: Stat) -> f32 {
        self.bonuses.get(&stat).copied().unwrap_or(0.0)
    }

    fn pool(&mut self, resource: Resource) -> (&mut f32, f32) {
        match resource {
            Resource::Life => (&mut self.life, self.max_life),
            Resource::Mana => (&mut self.mana, self.max_mana),
        }
    }
}

impl Default for SimCombatant {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    combatants: BTreeMap<CombatantId, SimCombatant>,
    held_keys: HashSet<HotKey>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or resets) a combatant with full pools.
    pub fn spawn(&mut self, id: CombatantId) -> &mut SimCombatant {
        let combatant = self.combatants.entry(id).or_default();
        *combatant = SimCombatant::default();
        combatant
    }

    pub fn despawn(&mut self, id: CombatantId) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.active = false;
        }
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&SimCombatant> {
        self.combatants.get(&id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut SimCombatant> {
        self.combatants.get_mut(&id)
    }

    pub fn hold_key(&mut self, key: HotKey) {
        self.held_keys.insert(key);
    }

    pub fn release_key(&mut self, key: HotKey) {
        self.held_keys.remove(&key);
    }

    /// Clears the per-tick stat bonuses and channelling flags.
    pub fn begin_tick(&mut self) {
        for combatant in self.combatants.values_mut() {
            combatant.bonuses.clear();
            combatant.channelling = false;
        }
    }
}

impl World for SimWorld {
    fn is_active(&self, id: CombatantId) -> bool {
        self.combatants.get(&id).is_some_and(|c| c.active)
    }

    fn is_dead(&self, id: CombatantId) -> bool {
        self.combatants.get(&id).is_some_and(SimCombatant::is_dead)
    }

    fn has_condition(&self, id: CombatantId, condition: Condition) -> bool {
        self.combatants
            .get(&id)
            .is_some_and(|c| c.conditions.contains(&condition))
    }

    fn has_ability(&self, id: CombatantId, ability: AbilityId) -> bool {
        self.combatants
            .get(&id)
            .is_some_and(|c| c.abilities.contains(&ability))
    }

    fn has_passive(&self, id: CombatantId, passive: PassiveId) -> bool {
        self.combatants
            .get(&id)
            .is_some_and(|c| c.passives.contains(&passive))
    }

    fn key_held(&self, key: HotKey) -> bool {
        self.held_keys.contains(&key)
    }

    fn resource_ratio(&self, id: CombatantId, resource: Resource) -> f32 {
        let Some(combatant) = self.combatants.get(&id) else {
            return 0.0;
        };
        let (current, max) = match resource {
            Resource::Life => (combatant.life, combatant.max_life),
            Resource::Mana => (combatant.mana, combatant.max_mana),
        };
        if max > 0.0 { current / max } else { 0.0 }
    }

    fn apply_stat_delta(&mut self, id: CombatantId, stat: Stat, amount: f32) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            *combatant.bonuses.entry(stat).or_insert(0.0) += amount;
        }
    }

    fn spend_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) -> bool {
        let Some(combatant) = self.combatants.get_mut(&id) else {
            return false;
        };
        let (pool, _) = combatant.pool(resource);
        if *pool < amount {
            return false;
        }
        *pool -= amount;
        true
    }

    fn restore_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            let (pool, max) = combatant.pool(resource);
            *pool = (*pool + amount).min(max);
        }
    }

    fn apply_damage(&mut self, id: CombatantId, amount: f32) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.life = (combatant.life - amount).max(0.0);
        }
    }

    fn set_channelling(&mut self, id: CombatantId) {
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.channelling = true;
        }
    }
}
