//! The engine context: every container, the shared periodic timers and the
//! queues a host drains after each call.
//!
//! All state lives in [`StatusEngine`]; the host world is borrowed per call.
//! Outgoing sync messages, presentation signals and lifecycle events are
//! buffered and drained with [`StatusEngine::take_outbound`],
//! [`StatusEngine::take_signals`] and [`StatusEngine::take_events`].

mod create;
mod network;
mod tick;

pub use create::CreateRequest;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::authority::{Authority, Endpoint, Recipient, SessionMode};
use crate::combatant::{Combatant, CombatantId, World};
use crate::config::EngineConfig;
use crate::container::EffectContainer;
use crate::definition::{DurationKind, EffectDefinition, EffectKind, Registry, UiKind};
use crate::error::{EffectError, StatusError};
use crate::instance::{EffectInstance, InstanceId};
use crate::removal::RemovalReason;
use crate::scheduler::PeriodicTimers;
use crate::signals::{EffectView, EngineEvent, UiSignals};
use crate::sync::{Outbound, RemoveEffect, SyncMessage};
use crate::time::Timestamp;

/// Status-effect engine of one participant.
#[derive(Debug)]
pub struct StatusEngine {
    registry: Arc<Registry>,
    config: EngineConfig,
    session: SessionMode,
    containers: BTreeMap<CombatantId, EffectContainer>,
    timers: PeriodicTimers,
    signals: UiSignals,
    outbound: Vec<Outbound>,
    events: Vec<EngineEvent>,
}

impl StatusEngine {
    pub fn new(registry: Arc<Registry>, config: EngineConfig, session: SessionMode) -> Self {
        Self {
            registry,
            config,
            session,
            containers: BTreeMap::new(),
            timers: PeriodicTimers::new(),
            signals: UiSignals::default(),
            outbound: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn session(&self) -> SessionMode {
        self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn timers(&self) -> &PeriodicTimers {
        &self.timers
    }

    pub fn container(&self, id: CombatantId) -> Option<&EffectContainer> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &EffectContainer> {
        self.containers.values()
    }

    pub fn has_effect(&self, id: CombatantId, kind: EffectKind) -> bool {
        self.containers
            .get(&id)
            .is_some_and(|container| container.has_effect(kind))
    }

    /// Query handle for a combatant, joining the host world with its effects.
    pub fn combatant<'a>(&'a self, id: CombatantId, world: &'a dyn World) -> Combatant<'a> {
        Combatant::new(id, self.session, world, &self.containers)
    }

    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn take_signals(&mut self) -> UiSignals {
        std::mem::take(&mut self.signals)
    }

    fn authority(&self, definition: &EffectDefinition, owner: CombatantId, target: CombatantId) -> Authority {
        Authority::resolve(self.session, owner, target, definition.synced, definition.duration)
    }

    /// Route for a change this process is about to announce. Clients never
    /// echo changes they just received.
    fn route_for(
        &self,
        authority: &Authority,
        received_from: Option<Endpoint>,
    ) -> Option<Recipient> {
        if received_from.is_some() && !self.session.is_server() {
            return None;
        }
        authority.route(received_from.and_then(Endpoint::peer))
    }

    fn any_instance_of(&self, kind: EffectKind) -> bool {
        self.containers.values().any(|container| container.has_effect(kind))
    }

    fn report(&self, operation: &'static str, err: &EffectError) {
        warn!(
            operation,
            error = %err,
            severity = err.severity().as_str(),
            code = err.error_code(),
            "status effect operation failed"
        );
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Detaches an instance on this participant only.
    ///
    /// Raises redraw/visual signals if the instance was applied, clears the
    /// kind's periodic timer once no instance of the kind remains anywhere,
    /// then runs the kind's end hook. Absent instances are ignored.
    pub fn remove_locally(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        reason: RemovalReason,
        world: &mut dyn World,
    ) -> Option<EffectInstance> {
        let registry = Arc::clone(&self.registry);
        let (definition, hooks) = match registry.get(kind) {
            Ok(entry) => entry,
            Err(err) => {
                self.report("remove", &err);
                return None;
            }
        };
        let instance = self.containers.get_mut(&target)?.remove(kind, instance_id)?;

        if instance.applied_this_tick {
            if instance.was_in_ui {
                self.signals.redraw = true;
            }
            if !self.session.is_server() {
                self.signals.rebuild_visuals(target, definition.visuals);
            }
        }
        if definition.timing.has_periodic() && !self.any_instance_of(kind) {
            self.timers.clear(kind);
        }
        if definition.duration != DurationKind::Instant {
            hooks.on_end(&instance, world);
        }

        debug!(%target, %kind, instance = %instance_id, %reason, "effect removed");
        self.events.push(EngineEvent::Ended {
            target,
            kind,
            instance_id,
            reason,
        });
        Some(instance)
    }

    /// Removes the instance here and tells the other participants when this
    /// process is authoritative for the decision.
    pub fn remove_everywhere(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        reason: RemovalReason,
        world: &mut dyn World,
    ) -> Option<EffectInstance> {
        self.remove_and_propagate(target, kind, instance_id, reason, None, world)
    }

    fn remove_and_propagate(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        reason: RemovalReason,
        received_from: Option<Endpoint>,
        world: &mut dyn World,
    ) -> Option<EffectInstance> {
        let instance = self.remove_locally(target, kind, instance_id, reason, world)?;
        let registry = Arc::clone(&self.registry);
        let (definition, hooks) = registry.get(kind).ok()?;

        let authority = self.authority(definition, instance.owner, target);
        // Removals the target's side decided reach every participant, the
        // owner included.
        let route = if received_from.is_none() && reason.decided_by_target() {
            authority
                .target_route()
                .or_else(|| self.route_for(&authority, None))
        } else {
            self.route_for(&authority, received_from)
        };
        if let Some(recipient) = route {
            self.outbound.push(Outbound {
                recipient,
                message: SyncMessage::Remove(RemoveEffect {
                    kind,
                    target,
                    owner: instance.owner,
                    instance_id: instance.sync_id,
                    extra: hooks.encode_remove_extra(&instance),
                }),
            });
        }
        Some(instance)
    }

    /// Host-requested cancellation.
    pub fn remove(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        world: &mut dyn World,
    ) -> Option<EffectInstance> {
        self.remove_everywhere(target, kind, instance_id, RemovalReason::Requested, world)
    }

    /// The combatant took a hit: every channelled effect on it breaks.
    /// Returns whether anything was removed.
    pub fn remove_channelling_on_hurt(&mut self, combatant: CombatantId, world: &mut dyn World) -> bool {
        let Some(container) = self.containers.get(&combatant) else {
            return false;
        };
        let channels: Vec<_> = container
            .iter()
            .filter(|instance| {
                self.registry
                    .definition(instance.kind)
                    .is_ok_and(|definition| definition.channelling)
            })
            .map(|instance| (instance.kind, instance.instance_id))
            .collect();

        let mut removed = false;
        for (kind, instance_id) in channels {
            removed |= self
                .remove_everywhere(combatant, kind, instance_id, RemovalReason::ChannelInterrupted, world)
                .is_some();
        }
        removed
    }

    /// The target dismisses an effect from its list. Only kinds that allow it,
    /// and only on the process simulating the target.
    pub fn end_by_target(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        world: &mut dyn World,
    ) -> Result<bool, EffectError> {
        let definition = self.registry.definition(kind)?;
        if !definition.right_click_end || !self.session.is_local(target) {
            let err = EffectError::EndNotPermitted { kind, target };
            self.report("end_by_target", &err);
            return Err(err);
        }
        Ok(self
            .remove_everywhere(target, kind, instance_id, RemovalReason::EndedByTarget, world)
            .is_some())
    }

    /// Drops a departed combatant's container. Other participants do the same
    /// on their own when the combatant leaves, so nothing is announced.
    pub fn remove_combatant(&mut self, id: CombatantId, world: &mut dyn World) -> usize {
        let handles = self
            .containers
            .get(&id)
            .map(EffectContainer::handles)
            .unwrap_or_default();
        let mut removed = 0;
        for (kind, instance_id) in handles {
            if self
                .remove_locally(id, kind, instance_id, RemovalReason::TargetLeft, world)
                .is_some()
            {
                removed += 1;
            }
        }
        self.containers.remove(&id);
        removed
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Effect list of `target` as the UI should show it.
    ///
    /// `UiKind::One` shows only the applied instance with the lowest id per
    /// kind, `AllApplying` every applied instance. Records `was_in_ui` on each
    /// applied instance.
    pub fn ui_view(&mut self, target: CombatantId, now: Timestamp) -> Vec<EffectView> {
        let registry = Arc::clone(&self.registry);
        let Some(container) = self.containers.get_mut(&target) else {
            return Vec::new();
        };

        let mut lowest: BTreeMap<EffectKind, InstanceId> = BTreeMap::new();
        for instance in container.iter().filter(|i| i.applied_this_tick) {
            let entry = lowest.entry(instance.kind).or_insert(instance.instance_id);
            *entry = (*entry).min(instance.instance_id);
        }

        let mut views = Vec::new();
        for instance in container.iter_mut() {
            let Ok(definition) = registry.definition(instance.kind) else {
                continue;
            };
            if !instance.applied_this_tick {
                continue;
            }
            let shown = match definition.ui {
                UiKind::None => false,
                UiKind::AllApplying => true,
                UiKind::One => lowest.get(&instance.kind) == Some(&instance.instance_id),
            };
            instance.was_in_ui = shown;
            if shown {
                views.push(EffectView {
                    kind: instance.kind,
                    instance_id: instance.instance_id,
                    name: definition.name.clone(),
                    description: definition.description.clone(),
                    icon: definition.icon,
                    remaining: instance.expiry.remaining(now),
                    remaining_label: instance.remaining_label(now),
                    right_click_end: definition.right_click_end,
                });
            }
        }
        views
    }
}
