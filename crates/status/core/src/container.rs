//! Per-target collection of live instances.

use tracing::debug;

use crate::authority::SessionMode;
use crate::combatant::CombatantId;
use crate::definition::{EffectDefinition, EffectHooks, EffectKind, LimitKind};
use crate::error::EffectError;
use crate::instance::{EffectInstance, InstanceId};
use crate::merge::merge;

/// Where a candidate instance comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Created on this process; limit and merge policy apply.
    Local,
    /// Announced by the owning process; its values are authoritative.
    Remote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    /// The kind's limit is reached and it does not merge.
    LimitReached,
    /// The container holds its maximum number of instances.
    Full,
}

/// Result of offering a candidate to a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The candidate is now attached under this id.
    Attached(InstanceId),
    /// The candidate was folded into an existing instance.
    Merged { instance_id: InstanceId, improved: bool },
    /// A remote update overwrote an existing instance.
    Replaced(InstanceId),
    Rejected(RejectReason),
}

impl AddOutcome {
    pub fn is_attached(self) -> bool {
        matches!(self, Self::Attached(_))
    }

    pub fn instance_id(self) -> Option<InstanceId> {
        match self {
            Self::Attached(id) | Self::Replaced(id) | Self::Merged { instance_id: id, .. } => Some(id),
            Self::Rejected(_) => None,
        }
    }
}

/// Instances attached to one combatant, in insertion order.
#[derive(Clone, Debug)]
pub struct EffectContainer {
    target: CombatantId,
    capacity: usize,
    instances: Vec<EffectInstance>,
    next_id: u8,
}

impl EffectContainer {
    pub fn new(target: CombatantId, capacity: usize) -> Self {
        Self {
            target,
            capacity: capacity.min(usize::from(InstanceId::UNASSIGNED.0)),
            instances: Vec::new(),
            next_id: 0,
        }
    }

    pub fn target(&self) -> CombatantId {
        self.target
    }

    /// Offers `candidate` to the container.
    ///
    /// Local candidates follow the kind's limit: a colliding instance is merged
    /// when the kind is mergeable, otherwise the candidate is rejected. Remote
    /// candidates overwrite the instance with the same kind, owner and sync id,
    /// or the instance occupying their limit slot, and attach otherwise. A
    /// remote candidate keeps the announced id as its local id when that id is
    /// free here, and gets a fresh one when it is not.
    pub fn add(
        &mut self,
        mut candidate: EffectInstance,
        definition: &EffectDefinition,
        hooks: &dyn EffectHooks,
        origin: Origin,
        session: SessionMode,
    ) -> Result<AddOutcome, EffectError> {
        match origin {
            Origin::Local => {
                if let Some(index) = self.limit_conflict(&candidate, definition.limit) {
                    if !definition.mergeable {
                        debug!(kind = %candidate.kind, target = %self.target, "effect limit reached");
                        return Ok(AddOutcome::Rejected(RejectReason::LimitReached));
                    }
                    let existing = &mut self.instances[index];
                    let improved = merge(&mut candidate, existing, definition, hooks, session)?;
                    if improved {
                        existing.owner = candidate.owner;
                        existing.fields = candidate.fields;
                        existing.expiry = candidate.expiry;
                        existing.extra = candidate.extra;
                        existing.needs_resync = true;
                    }
                    return Ok(AddOutcome::Merged {
                        instance_id: existing.instance_id,
                        improved,
                    });
                }
                candidate.sync_id = InstanceId::UNASSIGNED;
                self.attach(candidate, None)
            }
            Origin::Remote => {
                let announced = candidate.sync_id;
                let same_instance = announced
                    .is_assigned()
                    .then(|| self.position_synced(candidate.kind, candidate.owner, announced))
                    .flatten();
                let slot = same_instance.or_else(|| self.limit_conflict(&candidate, definition.limit));
                match slot {
                    Some(index) => {
                        let existing = &mut self.instances[index];
                        if announced.is_assigned() {
                            existing.sync_id = announced;
                        }
                        existing.owner = candidate.owner;
                        existing.fields = candidate.fields;
                        existing.expiry = candidate.expiry;
                        existing.extra = candidate.extra;
                        Ok(AddOutcome::Replaced(existing.instance_id))
                    }
                    None => self.attach(candidate, announced.is_assigned().then_some(announced)),
                }
            }
        }
    }

    fn attach(
        &mut self,
        mut candidate: EffectInstance,
        requested: Option<InstanceId>,
    ) -> Result<AddOutcome, EffectError> {
        if self.instances.len() >= self.capacity {
            debug!(kind = %candidate.kind, target = %self.target, "effect container full");
            return Ok(AddOutcome::Rejected(RejectReason::Full));
        }
        let free = requested.filter(|id| !self.instances.iter().any(|i| i.instance_id == *id));
        let id = match free.or_else(|| self.allocate_id()) {
            Some(id) => id,
            None => return Ok(AddOutcome::Rejected(RejectReason::Full)),
        };
        if requested.is_some_and(|requested| requested != id) {
            debug!(kind = %candidate.kind, target = %self.target, local = %id, "announced id taken, instance re-keyed");
        }
        candidate.instance_id = id;
        if !candidate.sync_id.is_assigned() {
            candidate.sync_id = id;
        }
        candidate.target = self.target;
        self.instances.push(candidate);
        Ok(AddOutcome::Attached(id))
    }

    /// Next id not used by any attached instance, scanning from the last one
    /// handed out.
    fn allocate_id(&mut self) -> Option<InstanceId> {
        let limit = u16::try_from(self.capacity).unwrap_or(u16::from(InstanceId::UNASSIGNED.0));
        for offset in 0..limit {
            let raw = (u16::from(self.next_id) + offset) % limit;
            let candidate = InstanceId(u8::try_from(raw).ok()?);
            if !self.instances.iter().any(|i| i.instance_id == candidate) {
                self.next_id = u8::try_from((raw + 1) % limit).ok()?;
                return Some(candidate);
            }
        }
        None
    }

    fn limit_conflict(&self, candidate: &EffectInstance, limit: LimitKind) -> Option<usize> {
        match limit {
            LimitKind::Many => None,
            LimitKind::OnePerOwner => self
                .instances
                .iter()
                .position(|i| i.kind == candidate.kind && i.owner == candidate.owner),
            LimitKind::One => self.instances.iter().position(|i| i.kind == candidate.kind),
        }
    }

    fn position_synced(&self, kind: EffectKind, owner: CombatantId, sync_id: InstanceId) -> Option<usize> {
        self.instances
            .iter()
            .position(|i| i.kind == kind && i.owner == owner && i.sync_id == sync_id)
    }

    fn position(&self, kind: EffectKind, id: InstanceId) -> Option<usize> {
        self.instances
            .iter()
            .position(|i| i.kind == kind && i.instance_id == id)
    }

    /// Detaches and returns the instance. Removing an absent instance is a no-op.
    pub fn remove(&mut self, kind: EffectKind, id: InstanceId) -> Option<EffectInstance> {
        self.position(kind, id).map(|index| self.instances.remove(index))
    }

    pub fn get(&self, kind: EffectKind, id: InstanceId) -> Option<&EffectInstance> {
        self.position(kind, id).map(|index| &self.instances[index])
    }

    /// Looks an instance up by the identity sync messages carry.
    pub fn get_synced(
        &self,
        kind: EffectKind,
        owner: CombatantId,
        sync_id: InstanceId,
    ) -> Option<&EffectInstance> {
        self.position_synced(kind, owner, sync_id)
            .map(|index| &self.instances[index])
    }

    pub fn get_mut(&mut self, kind: EffectKind, id: InstanceId) -> Option<&mut EffectInstance> {
        self.position(kind, id).map(|index| &mut self.instances[index])
    }

    /// Instances of `kind` in insertion order.
    pub fn query(&self, kind: EffectKind) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter().filter(move |i| i.kind == kind)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.instances.iter().any(|i| i.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EffectInstance> {
        self.instances.iter_mut()
    }

    /// Snapshot of (kind, id) pairs so callers can mutate while walking.
    pub fn handles(&self) -> Vec<(EffectKind, InstanceId)> {
        self.instances.iter().map(EffectInstance::handle).collect()
    }

    /// Distinct kinds in order of first insertion.
    pub fn kinds(&self) -> Vec<EffectKind> {
        let mut kinds: Vec<EffectKind> = Vec::new();
        for instance in &self.instances {
            if !kinds.contains(&instance.kind) {
                kinds.push(instance.kind);
            }
        }
        kinds
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
