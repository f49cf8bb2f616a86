//! Per-tick processing: removal checks, apply selection, behaviors and the
//! shared periodic timers.

use std::sync::Arc;

use tracing::trace;

use super::StatusEngine;
use crate::combatant::{Combatant, CombatantId, World};
use crate::definition::{EffectDefinition, EffectOutcome, Registry};
use crate::instance::InstanceId;
use crate::removal::{RemovalReason, check_removal};
use crate::scheduler::select_appliers;
use crate::time::Timestamp;

impl StatusEngine {
    /// Advances every container by one tick.
    ///
    /// A kind's periodic timer is checked by each applier in turn. An applier
    /// that finds it elapsed fires and moves it forward by one interval, so
    /// one interval yields one fire unless the timer has fallen more than a
    /// period behind.
    pub fn tick(&mut self, now: Timestamp, world: &mut dyn World) {
        let registry = Arc::clone(&self.registry);
        let targets: Vec<CombatantId> = self.containers.keys().copied().collect();

        for target in targets {
            self.update_instances(&registry, target, now, world);
            self.apply_instances(&registry, target, now, world);
        }
    }

    fn update_instances(
        &mut self,
        registry: &Registry,
        target: CombatantId,
        now: Timestamp,
        world: &mut dyn World,
    ) {
        let Some(handles) = self.containers.get(&target).map(|c| c.handles()) else {
            return;
        };

        for (kind, instance_id) in handles {
            let Ok((definition, hooks)) = registry.get(kind) else {
                continue;
            };

            let reason = {
                let Some(instance) = self.instance(target, kind, instance_id) else {
                    continue;
                };
                let owner = Combatant::new(instance.owner, self.session, &*world, &self.containers);
                let holder = Combatant::new(target, self.session, &*world, &self.containers);
                check_removal(instance, definition, hooks, &owner, &holder, now)
            };
            if let Some(reason) = reason {
                self.remove_everywhere(target, kind, instance_id, reason, world);
                continue;
            }

            let Some(instance) = self.instance_mut(target, kind, instance_id) else {
                continue;
            };
            hooks.on_update(instance, world);
            instance.applied_last_tick = instance.applied_this_tick;
            instance.applied_this_tick = false;
            if definition.channelling && target.is_player() {
                world.set_channelling(target);
            }
        }
    }

    fn apply_instances(
        &mut self,
        registry: &Registry,
        target: CombatantId,
        now: Timestamp,
        world: &mut dyn World,
    ) {
        let Some(kinds) = self.containers.get(&target).map(|c| c.kinds()) else {
            return;
        };

        for kind in kinds {
            let Ok(definition) = registry.definition(kind) else {
                continue;
            };
            let Some(container) = self.containers.get(&target) else {
                return;
            };
            let appliers = select_appliers(container.query(kind), definition.apply);

            for instance_id in appliers {
                let outcome = self.apply_instance(definition, target, instance_id, now, world);
                if outcome == EffectOutcome::RemoveEverywhere {
                    self.remove_everywhere(target, kind, instance_id, RemovalReason::UpkeepFailed, world);
                }
            }
        }
    }

    fn apply_instance(
        &mut self,
        definition: &EffectDefinition,
        target: CombatantId,
        instance_id: InstanceId,
        now: Timestamp,
        world: &mut dyn World,
    ) -> EffectOutcome {
        let session = self.session;
        let Some(instance) = self
            .containers
            .get_mut(&target)
            .and_then(|c| c.get_mut(definition.kind, instance_id))
        else {
            return EffectOutcome::Continue;
        };

        instance.applied_this_tick = true;
        if !instance.applied_last_tick {
            self.signals.redraw = true;
            if !session.is_server() {
                self.signals.rebuild_visuals(target, definition.visuals);
            }
        }

        let instance = &*instance;
        if definition.timing.has_constant() {
            if let Some(constant) = &definition.constant {
                constant.run(instance, session, world);
            }
        }
        let Some(periodic) = definition.periodic.as_ref().filter(|_| definition.timing.has_periodic()) else {
            return EffectOutcome::Continue;
        };
        if !self.timers.is_due(definition.kind, now) {
            return EffectOutcome::Continue;
        }
        trace!(%target, kind = %definition.kind, instance = %instance_id, "periodic effect fired");
        let outcome = periodic.run(instance, session, world);
        self.timers.advance(definition.kind, definition.period());
        outcome
    }
}
