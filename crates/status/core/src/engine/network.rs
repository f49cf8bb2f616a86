//! Applying received sync messages and building outgoing payloads.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::StatusEngine;
use super::create::{CreateRequest, Provenance};
use crate::authority::{Endpoint, Recipient};
use crate::combatant::{CombatantId, World};
use crate::container::AddOutcome;
use crate::definition::EffectKind;
use crate::error::EffectError;
use crate::instance::{InstanceId, SyncData};
use crate::removal::RemovalReason;
use crate::sync::{AddEffect, Outbound, RemoveEffect, SetAllEffects, SyncMessage};
use crate::time::{Expiry, Timestamp};

impl StatusEngine {
    /// Applies a message received from `from`.
    ///
    /// On the server, accepted changes are relayed to every other client.
    pub fn handle_message(
        &mut self,
        from: Endpoint,
        message: SyncMessage,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<(), EffectError> {
        trace!(?from, message = message.kind_name(), target = %message.target(), "sync message received");
        let result = match message {
            SyncMessage::Add(add) => self.receive_add(from, add, false, now, world).map(|_| ()),
            SyncMessage::Remove(remove) => self.receive_remove(from, remove, world),
            SyncMessage::SetAll(set) => self.receive_set_all(Some(from), set, now, world),
        };
        result.inspect_err(|err| self.report("handle_message", err))
    }

    /// Rebuilds a remote combatant's synced effects from a full snapshot
    /// without going through the network.
    pub fn force_sync(
        &mut self,
        snapshot: SetAllEffects,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<(), EffectError> {
        self.receive_set_all(None, snapshot, now, world)
            .inspect_err(|err| self.report("force_sync", err))
    }

    fn receive_add(
        &mut self,
        from: Endpoint,
        add: AddEffect,
        bulk: bool,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<AddOutcome, EffectError> {
        let definition = self.registry.definition(add.kind)?;
        let fields = SyncData::from_values(add.kind, &definition.fields, &add.fields)?;
        let request = CreateRequest {
            kind: add.kind,
            target: add.target,
            owner: add.owner,
            fields: fields.iter().collect(),
            remaining_secs: Some(add.remaining_secs),
            secs_until_periodic: Some(add.secs_until_periodic),
            instance_id: Some(add.instance_id),
            extra: Some(add.extra),
            suppress_events: bulk,
        };
        self.create_from(request, Provenance::received(from, bulk), now, world)
    }

    fn receive_remove(
        &mut self,
        from: Endpoint,
        remove: RemoveEffect,
        world: &mut dyn World,
    ) -> Result<(), EffectError> {
        let registry = Arc::clone(&self.registry);
        let (_, hooks) = registry.get(remove.kind)?;
        let Some(instance) = self
            .containers
            .get(&remove.target)
            .and_then(|c| c.get_synced(remove.kind, remove.owner, remove.instance_id))
        else {
            trace!(
                target = %remove.target,
                owner = %remove.owner,
                kind = %remove.kind,
                instance = %remove.instance_id,
                "remove for unknown instance ignored"
            );
            return Ok(());
        };
        hooks.decode_remove_extra(instance, &remove.extra)?;
        let instance_id = instance.instance_id;
        self.remove_and_propagate(
            remove.target,
            remove.kind,
            instance_id,
            RemovalReason::Remote,
            Some(from),
            world,
        );
        Ok(())
    }

    fn receive_set_all(
        &mut self,
        from: Option<Endpoint>,
        set: SetAllEffects,
        now: Timestamp,
        world: &mut dyn World,
    ) -> Result<(), EffectError> {
        let target = set.target;
        if self.session.is_local(target) {
            return Err(EffectError::ForceSyncLocal { target });
        }

        let stale: Vec<(EffectKind, InstanceId)> = self
            .containers
            .get(&target)
            .map(|container| {
                container
                    .iter()
                    .filter(|instance| !self.session.is_local(instance.owner))
                    .filter(|instance| {
                        self.registry
                            .definition(instance.kind)
                            .is_ok_and(|definition| definition.synced)
                    })
                    .map(|instance| (instance.kind, instance.instance_id))
                    .collect()
            })
            .unwrap_or_default();
        for (kind, instance_id) in stale {
            self.remove_locally(target, kind, instance_id, RemovalReason::Resync, world);
        }

        let sender = from.unwrap_or(Endpoint::Server);
        for add in &set.effects {
            if add.target != target {
                warn!(%target, entry = %add.target, "resync entry for another combatant skipped");
                continue;
            }
            if let Err(err) = self.receive_add(sender, add.clone(), true, now, world) {
                self.report("set_all", &err);
            }
        }
        debug!(%target, effects = set.effects.len(), "combatant effects resynced");

        if self.session.is_server() && from.is_some() {
            self.outbound.push(Outbound {
                recipient: Recipient::Broadcast {
                    except: from.and_then(Endpoint::peer),
                },
                message: SyncMessage::SetAll(set),
            });
        }
        Ok(())
    }

    /// Add payloads for every synced instance on `target`, in container order.
    pub fn snapshot(&self, target: CombatantId, now: Timestamp) -> SetAllEffects {
        let effects = self
            .containers
            .get(&target)
            .map(|container| {
                container
                    .iter()
                    .filter(|instance| {
                        self.registry
                            .definition(instance.kind)
                            .is_ok_and(|definition| definition.synced)
                    })
                    .filter_map(|instance| self.add_message(target, instance.kind, instance.instance_id, now))
                    .collect()
            })
            .unwrap_or_default();
        SetAllEffects { target, effects }
    }

    /// Queues a full resync of a local combatant for the other participants.
    /// Returns false when there is nobody to send it to.
    pub fn publish_snapshot(&mut self, target: CombatantId, now: Timestamp) -> bool {
        if !self.session.is_multiplayer() || !self.session.is_local(target) {
            return false;
        }
        let recipient = if self.session.is_server() {
            Recipient::Broadcast { except: None }
        } else {
            Recipient::Server
        };
        let snapshot = self.snapshot(target, now);
        self.outbound.push(Outbound {
            recipient,
            message: SyncMessage::SetAll(snapshot),
        });
        true
    }

    /// Encodes one instance as an add payload with times relative to `now`.
    pub(super) fn add_message(
        &self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
        now: Timestamp,
    ) -> Option<AddEffect> {
        let (_, hooks) = self.registry.get(kind).ok()?;
        let instance = self.instance(target, kind, instance_id)?;
        let remaining_secs = match instance.expiry {
            Expiry::At(end) => now
                .secs_until(end)
                .max(self.config.min_sync_remaining_secs),
            Expiry::Immediate | Expiry::Never => 0.0,
        };
        let secs_until_periodic = self
            .timers
            .next_fire(kind)
            .map_or(0.0, |fire| now.secs_until(fire));

        Some(AddEffect {
            kind,
            target,
            owner: instance.owner,
            instance_id: instance.sync_id,
            fields: instance.fields.to_values(),
            remaining_secs,
            secs_until_periodic,
            extra: hooks.encode_add_extra(instance),
        })
    }
}
