//! Creating instances: validation, container admission, start-up side effects
//! and announcement.

use std::sync::Arc;

use tracing::debug;

use super::StatusEngine;
use crate::authority::Endpoint;
use crate::combatant::{CombatantId, World};
use crate::container::{AddOutcome, EffectContainer, Origin};
use crate::definition::{DurationKind, EffectDefinition, EffectKind, EffectOutcome, SyncField};
use crate::error::EffectError;
use crate::instance::{EffectInstance, InstanceId, SyncData};
use crate::removal::RemovalReason;
use crate::signals::EngineEvent;
use crate::sync::{Outbound, SyncMessage};
use crate::time::{Expiry, Timestamp};

/// Parameters of a creation. Everything but kind, target and owner is
/// optional and falls back to the kind's defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateRequest {
    pub kind: EffectKind,
    pub target: CombatantId,
    pub owner: CombatantId,
    /// Declared fields to set; the rest start at zero.
    pub fields: Vec<(SyncField, f32)>,
    /// Timed duration override. Non-positive means "use the default".
    pub remaining_secs: Option<f32>,
    /// Delay before the kind's first periodic fire, if this creation starts
    /// its timer. Defaults to firing immediately.
    pub secs_until_periodic: Option<f32>,
    /// Id announced by the owner; only used for received instances.
    pub instance_id: Option<InstanceId>,
    pub extra: Option<Vec<u8>>,
    /// Skips the add announcement.
    pub suppress_events: bool,
}

impl CreateRequest {
    pub fn new(kind: EffectKind, target: CombatantId, owner: CombatantId) -> Self {
        Self {
            kind,
            target,
            owner,
            fields: Vec::new(),
            remaining_secs: None,
            secs_until_periodic: None,
            instance_id: None,
            extra: None,
            suppress_events: false,
        }
    }

    pub fn with_field(mut self, field: SyncField, value: f32) -> Self {
        self.fields.push((field, value));
        self
    }

    pub fn with_remaining_secs(mut self, secs: f32) -> Self {
        self.remaining_secs = Some(secs);
        self
    }

    pub fn with_first_periodic_in(mut self, secs: f32) -> Self {
        self.secs_until_periodic = Some(secs);
        self
    }

    pub fn with_instance_id(mut self, instance_id: InstanceId) -> Self {
        self.instance_id = Some(instance_id);
        self
    }

    pub fn with_extra(mut self, extra: Vec<u8>) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn suppressed(mut self) -> Self {
        self.suppress_events = true;
        self
    }
}

/// How a creation reached the engine.
#[derive(Clone, Copy, Debug)]
pub(super) struct Provenance {
    pub origin: Origin,
    pub received_from: Option<Endpoint>,
    /// Part of a full resync: start hooks are skipped.
    pub bulk: bool,
}

impl Provenance {
    pub const LOCAL: Self = Self {
        origin: Origin::Local,
        received_from: None,
        bulk: false,
    };

    pub fn received(from: Endpoint, bulk: bool) -> Self {
        Self {
            origin: Origin::Remote,
            received_from: Some(from),
            bulk,
        }
    }
}

impl StatusEngine {
    /// Creates (or merges) an effect on this participant.
    ///
    /// Errors leave every container untouched. A rejection by the kind's limit
    /// is not an error; it is reported as [`AddOutcome::Rejected`].
    pub fn create(
        &mut self,
        request: CreateRequest,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<AddOutcome, EffectError> {
        self.create_from(request, Provenance::LOCAL, now, world)
            .inspect_err(|err| self.report("create", err))
    }

    /// Starts an auto-passive effect on the local player itself.
    pub fn add_auto_passive(
        &mut self,
        kind: EffectKind,
        combatant: CombatantId,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<AddOutcome, EffectError> {
        let definition = self.registry.definition(kind)?;
        let refusal = if self.session.is_server() {
            Some(EffectError::AutoPassiveOnServer { kind })
        } else if !definition.auto_passive {
            Some(EffectError::NotAutoPassive { kind })
        } else if !combatant.is_player() || !self.session.is_local(combatant) {
            Some(EffectError::AutoPassiveNotLocal { kind, combatant })
        } else {
            None
        };
        if let Some(err) = refusal {
            self.report("add_auto_passive", &err);
            return Err(err);
        }
        self.create(CreateRequest::new(kind, combatant, combatant), now, world)
    }

    pub(super) fn create_from(
        &mut self,
        request: CreateRequest,
        provenance: Provenance,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<AddOutcome, EffectError> {
        let registry = Arc::clone(&self.registry);
        let (definition, hooks) = registry.get(request.kind)?;
        let CreateRequest {
            kind,
            target,
            owner,
            ..
        } = request;

        if !definition.eligibility.allows_target(target) {
            return Err(EffectError::InvalidTarget { kind, target });
        }
        if !definition.eligibility.allows_owner(owner) {
            return Err(EffectError::InvalidOwner { kind, owner });
        }

        let mut fields = SyncData::zeroed(&definition.fields);
        for (field, value) in &request.fields {
            if !fields.set(*field, *value) {
                return Err(EffectError::UndeclaredField {
                    kind,
                    field: *field,
                });
            }
        }

        let mut candidate = EffectInstance::new(
            kind,
            owner,
            target,
            initial_expiry(definition, request.remaining_secs, now),
            fields,
        );
        if let Some(instance_id) = request.instance_id {
            candidate.sync_id = instance_id;
        }
        if let Some(extra) = request.extra {
            match provenance.origin {
                Origin::Remote => hooks.decode_add_extra(&mut candidate, &extra)?,
                Origin::Local => candidate.extra = extra,
            }
        }

        let authority = self.authority(definition, owner, target);
        let capacity = self.config.effective_capacity();
        let container = self
            .containers
            .entry(target)
            .or_insert_with(|| EffectContainer::new(target, capacity));
        let outcome = container.add(candidate, definition, hooks, provenance.origin, self.session)?;

        let instance_id = match outcome {
            AddOutcome::Rejected(reason) => {
                debug!(%target, %kind, %reason, "effect rejected");
                return Ok(outcome);
            }
            AddOutcome::Merged {
                instance_id,
                improved,
            } => {
                if improved {
                    self.events.push(EngineEvent::Merged {
                        target,
                        kind,
                        instance_id,
                    });
                    if !request.suppress_events {
                        self.announce(target, kind, instance_id, provenance.received_from, now);
                    }
                    if let Some(instance) = self.instance_mut(target, kind, instance_id) {
                        instance.needs_resync = false;
                    }
                }
                return Ok(outcome);
            }
            AddOutcome::Replaced(instance_id) => {
                if let Some(instance) = self.instance_mut(target, kind, instance_id) {
                    instance.locally_enforces_expiry = authority.enforces_expiry;
                }
                debug!(%target, %kind, instance = %instance_id, "effect replaced by owner update");
                self.events.push(EngineEvent::Replaced {
                    target,
                    kind,
                    instance_id,
                });
                if !request.suppress_events {
                    self.announce(target, kind, instance_id, provenance.received_from, now);
                }
                return Ok(outcome);
            }
            AddOutcome::Attached(instance_id) => instance_id,
        };

        let instant = definition.duration == DurationKind::Instant;
        if let Some(instance) = self.instance_mut(target, kind, instance_id) {
            instance.locally_enforces_expiry = authority.enforces_expiry;
        }
        if !instant && definition.timing.has_periodic() {
            let first_fire = now.after_secs(request.secs_until_periodic.unwrap_or(0.0));
            self.timers.ensure(kind, first_fire);
        }
        if !instant && !provenance.bulk {
            if let Some(instance) = self.instance(target, kind, instance_id) {
                hooks.on_start(instance, world);
            }
        }
        if !self.session.is_server() {
            self.signals.rebuild_visuals(target, definition.visuals);
        }
        debug!(%target, %owner, %kind, instance = %instance_id, "effect attached");
        self.events.push(EngineEvent::Started {
            target,
            owner,
            kind,
            instance_id,
        });

        let announcement = if request.suppress_events {
            None
        } else {
            self.route_for(&authority, provenance.received_from)
                .zip(self.add_message(target, kind, instance_id, now))
        };

        if instant {
            self.execute_instant(definition, target, kind, instance_id, world);
            self.remove_locally(target, kind, instance_id, RemovalReason::Instant, world);
        }

        if let Some((recipient, add)) = announcement {
            self.outbound.push(Outbound {
                recipient,
                message: SyncMessage::Add(add),
            });
        }
        Ok(outcome)
    }

    /// Runs the constant and periodic behaviors of an instant effect once.
    fn execute_instant(
        &mut self,
        definition: &EffectDefinition,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        world: &mut dyn World,
    ) {
        let session = self.session;
        let Some(instance) = self.instance(target, kind, instance_id) else {
            return;
        };
        let owner = instance.owner;
        if let Some(constant) = &definition.constant {
            constant.run(instance, session, world);
        }
        if let Some(periodic) = &definition.periodic {
            if periodic.run(instance, session, world) == EffectOutcome::RemoveEverywhere {
                debug!(%target, %kind, "instant effect could not be paid for");
            }
        }
        self.events.push(EngineEvent::Executed {
            target,
            owner,
            kind,
        });
    }

    /// Re-announces an instance whose values changed.
    fn announce(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        received_from: Option<Endpoint>,
        now: Timestamp,
    ) {
        let Some(add) = self.add_message(target, kind, instance_id, now) else {
            return;
        };
        let Ok(definition) = self.registry.definition(kind) else {
            return;
        };
        let authority = self.authority(definition, add.owner, target);
        if let Some(recipient) = self.route_for(&authority, received_from) {
            self.outbound.push(Outbound {
                recipient,
                message: SyncMessage::Add(add),
            });
        }
    }

    pub(super) fn instance(
        &self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    ) -> Option<&EffectInstance> {
        self.containers.get(&target)?.get(kind, instance_id)
    }

    pub(super) fn instance_mut(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    ) -> Option<&mut EffectInstance> {
        self.containers.get_mut(&target)?.get_mut(kind, instance_id)
    }
}

fn initial_expiry(definition: &EffectDefinition, remaining_secs: Option<f32>, now: Timestamp) -> Expiry {
    match definition.duration {
        DurationKind::Instant => Expiry::Immediate,
        DurationKind::Toggle => Expiry::Never,
        DurationKind::Timed => {
            let secs = remaining_secs
                .filter(|secs| *secs > 0.0)
                .unwrap_or(definition.duration_secs);
            Expiry::At(now.after_secs(secs))
        }
    }
}
