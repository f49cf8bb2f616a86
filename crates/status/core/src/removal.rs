//! Per-tick removal state machine.
//!
//! Preconditions are evaluated in a fixed order and the first one that fires
//! names the [`RemovalReason`]. Checks that depend on the owner's private
//! state (status list, unlocks, input) only run on the owner's own process;
//! other participants wait for its removal message.

use crate::combatant::{Combatant, Condition};
use crate::definition::{DurationKind, EffectDefinition, EffectHooks, RemovalTriggers};
use crate::instance::EffectInstance;
use crate::time::Timestamp;

/// Why an instance left its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    // Tick preconditions, in evaluation order.
    Instant,
    Expired,
    OwnerLeft,
    OwnerDied,
    TargetDied,
    OwnerImmobilized,
    OwnerSilenced,
    TargetMissingRequired,
    TargetHasForbidden,
    OwnerMissingStatus,
    OwnerMissingPassive,
    OwnerMissingAbility,
    LocalSpecific,
    KeyReleased,
    Specific,

    // Explicit removals.
    /// Host asked for the removal.
    Requested,
    /// The owner could not pay a periodic upkeep.
    UpkeepFailed,
    /// A channel was broken by the owner taking a hit.
    ChannelInterrupted,
    /// The target dismissed the effect from its effect list.
    EndedByTarget,
    /// The owning participant announced the removal.
    Remote,
    /// Dropped while rebuilding a combatant from a full resync.
    Resync,
    /// The target left the session and its container was discarded.
    TargetLeft,
}

impl RemovalReason {
    /// Removals decided by the target's side rather than the owner's.
    pub const fn decided_by_target(self) -> bool {
        matches!(self, Self::Expired | Self::EndedByTarget)
    }
}

/// Evaluates the removal preconditions for one instance.
pub fn check_removal(
    instance: &EffectInstance,
    definition: &EffectDefinition,
    hooks: &dyn EffectHooks,
    owner: &Combatant<'_>,
    target: &Combatant<'_>,
    now: Timestamp,
) -> Option<RemovalReason> {
    let triggers = definition.removal.triggers;
    let channelling = definition.channelling;

    if definition.duration == DurationKind::Instant {
        return Some(RemovalReason::Instant);
    }
    if instance.locally_enforces_expiry && instance.expiry.has_passed(now) {
        return Some(RemovalReason::Expired);
    }
    if (triggers.contains(RemovalTriggers::OWNER_LEAVES) || definition.duration == DurationKind::Toggle)
        && owner.is_player()
        && !owner.is_active()
    {
        return Some(RemovalReason::OwnerLeft);
    }
    if (triggers.contains(RemovalTriggers::OWNER_DEATH) || channelling) && owner.is_dead() {
        return Some(RemovalReason::OwnerDied);
    }
    if triggers.contains(RemovalTriggers::TARGET_DEATH) && target.is_dead() {
        return Some(RemovalReason::TargetDied);
    }
    if (triggers.contains(RemovalTriggers::OWNER_IMMOBILIZED) || channelling)
        && owner.has_condition(Condition::Immobilized)
    {
        return Some(RemovalReason::OwnerImmobilized);
    }
    if (triggers.contains(RemovalTriggers::OWNER_SILENCED) || channelling)
        && owner.has_condition(Condition::Silenced)
    {
        return Some(RemovalReason::OwnerSilenced);
    }

    if owner.is_player() && owner.is_local() {
        if let Some(reason) = check_owner_local(instance, definition, hooks, owner, target) {
            return Some(reason);
        }
    }

    if hooks.should_remove(instance, owner.world()) {
        return Some(RemovalReason::Specific);
    }
    None
}

fn check_owner_local(
    instance: &EffectInstance,
    definition: &EffectDefinition,
    hooks: &dyn EffectHooks,
    owner: &Combatant<'_>,
    target: &Combatant<'_>,
) -> Option<RemovalReason> {
    let rules = &definition.removal;

    if rules.target_requires.is_some_and(|kind| !target.has_effect(kind)) {
        return Some(RemovalReason::TargetMissingRequired);
    }
    if rules.target_forbids.is_some_and(|kind| target.has_effect(kind)) {
        return Some(RemovalReason::TargetHasForbidden);
    }
    if rules.owner_requires_status.is_some_and(|kind| !owner.has_effect(kind)) {
        return Some(RemovalReason::OwnerMissingStatus);
    }
    if rules.owner_requires_passive.is_some_and(|passive| !owner.has_passive(passive)) {
        return Some(RemovalReason::OwnerMissingPassive);
    }
    if rules.owner_requires_ability.is_some_and(|ability| !owner.has_ability(ability)) {
        return Some(RemovalReason::OwnerMissingAbility);
    }
    if hooks.should_remove_local(instance, owner.world()) {
        return Some(RemovalReason::LocalSpecific);
    }
    if rules.release_key.is_some_and(|key| !owner.world().key_held(key)) {
        return Some(RemovalReason::KeyReleased);
    }
    None
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::authority::SessionMode;
    use crate::combatant::PeerId;
    use crate::container::EffectContainer;
    use crate::definition::{EffectKind, NoHooks, SyncField};
    use crate::instance::SyncData;
    use crate::test_helpers::{self, BLOCK_ABILITY, BLOCK_KEY, NPC, P1, P2, TestWorld};
    use crate::time::Expiry;

    const CLIENT: SessionMode = SessionMode::Client { local: PeerId(1) };

    fn block_instance() -> EffectInstance {
        EffectInstance::new(
            EffectKind::WarriorBlock,
            P1,
            P1,
            Expiry::Never,
            SyncData::zeroed(&[SyncField::Magnitude1]),
        )
    }

    fn check(
        instance: &EffectInstance,
        definition: &EffectDefinition,
        session: SessionMode,
        world: &TestWorld,
    ) -> Option<RemovalReason> {
        let containers = BTreeMap::<_, EffectContainer>::new();
        let owner = Combatant::new(instance.owner, session, world, &containers);
        let target = Combatant::new(instance.target, session, world, &containers);
        check_removal(instance, definition, &NoHooks, &owner, &target, Timestamp(1_000))
    }

    fn blocking_world() -> TestWorld {
        TestWorld {
            abilities: vec![(P1, BLOCK_ABILITY)],
            held_keys: vec![BLOCK_KEY],
            ..TestWorld::default()
        }
    }

    #[test]
    fn held_block_survives() {
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &blocking_world()),
            None
        );
    }

    #[test]
    fn released_key_removes_on_owner() {
        let mut world = blocking_world();
        world.held_keys.clear();
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &world),
            Some(RemovalReason::KeyReleased)
        );
    }

    #[test]
    fn observers_skip_owner_local_checks() {
        let world = TestWorld::default();
        let observer = SessionMode::Client { local: PeerId(2) };
        assert_eq!(check(&block_instance(), &test_helpers::block(), observer, &world), None);
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), SessionMode::Server, &world),
            None
        );
    }

    #[test]
    fn channelling_ends_on_impairment_in_order() {
        let mut world = blocking_world();
        world.conditions.push((P1, Condition::Silenced));
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &world),
            Some(RemovalReason::OwnerSilenced)
        );
        world.conditions.push((P1, Condition::Immobilized));
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &world),
            Some(RemovalReason::OwnerImmobilized)
        );
        world.dead.push(P1);
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &world),
            Some(RemovalReason::OwnerDied)
        );
        world.inactive.push(P1);
        assert_eq!(
            check(&block_instance(), &test_helpers::block(), CLIENT, &world),
            Some(RemovalReason::OwnerLeft)
        );
    }

    #[test]
    fn expiry_only_where_enforced() {
        let mut fields = SyncData::zeroed(&[SyncField::Magnitude1]);
        fields.set(SyncField::Magnitude1, 2.0);
        let mut rally = EffectInstance::new(
            EffectKind::Rally,
            P2,
            NPC,
            Expiry::At(Timestamp(900)),
            fields,
        );
        let world = TestWorld::default();
        assert_eq!(check(&rally, &test_helpers::rally(), CLIENT, &world), None);
        rally.locally_enforces_expiry = true;
        assert_eq!(
            check(&rally, &test_helpers::rally(), CLIENT, &world),
            Some(RemovalReason::Expired)
        );
    }

    #[test]
    fn target_death_and_instant() {
        let mut world = TestWorld::default();
        world.dead.push(NPC);
        let instance = EffectInstance::new(
            EffectKind::Rally,
            P2,
            NPC,
            Expiry::At(Timestamp(5_000)),
            SyncData::zeroed(&[SyncField::Magnitude1]),
        );
        assert_eq!(
            check(&instance, &test_helpers::rally(), SessionMode::Server, &world),
            Some(RemovalReason::TargetDied)
        );
        assert_eq!(
            check(&instance, &test_helpers::mend(), SessionMode::Server, &world),
            Some(RemovalReason::Instant)
        );
    }
}
