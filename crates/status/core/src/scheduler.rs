//! Shared periodic timers and per-tick apply selection.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::combatant::CombatantId;
use crate::definition::{ApplyKind, EffectKind};
use crate::instance::{EffectInstance, InstanceId};
use crate::time::Timestamp;

/// Next periodic fire time per effect kind, shared by every instance of that
/// kind on this participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeriodicTimers {
    next: BTreeMap<EffectKind, Timestamp>,
}

impl PeriodicTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the kind's timer unless one already runs. Returns true when
    /// a timer was created.
    pub fn ensure(&mut self, kind: EffectKind, first_fire: Timestamp) -> bool {
        if self.next.contains_key(&kind) {
            return false;
        }
        self.next.insert(kind, first_fire);
        true
    }

    pub fn next_fire(&self, kind: EffectKind) -> Option<Timestamp> {
        self.next.get(&kind).copied()
    }

    /// True when the kind's timer has elapsed at `now`.
    pub fn is_due(&self, kind: EffectKind, now: Timestamp) -> bool {
        self.next_fire(kind).is_some_and(|fire| fire <= now)
    }

    /// Moves the kind's timer forward by exactly one interval.
    pub fn advance(&mut self, kind: EffectKind, period: Duration) {
        if let Some(fire) = self.next.get_mut(&kind) {
            *fire = *fire + period;
        }
    }

    pub fn clear(&mut self, kind: EffectKind) -> bool {
        self.next.remove(&kind).is_some()
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.next.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}

/// Instances of one kind that take effect this tick.
///
/// `instances` must be in insertion order; among equally good instances the
/// earliest one wins.
pub fn select_appliers<'a>(
    instances: impl IntoIterator<Item = &'a EffectInstance>,
    apply: ApplyKind,
) -> Vec<InstanceId> {
    match apply {
        ApplyKind::All => instances.into_iter().map(|i| i.instance_id).collect(),
        ApplyKind::Best => best_of(instances).into_iter().map(|i| i.instance_id).collect(),
        ApplyKind::BestPerOwner => {
            let mut best: Vec<(CombatantId, &EffectInstance)> = Vec::new();
            for instance in instances {
                match best.iter_mut().find(|(owner, _)| *owner == instance.owner) {
                    Some((_, current)) => {
                        if instance.is_better_than(*current) {
                            *current = instance;
                        }
                    }
                    None => best.push((instance.owner, instance)),
                }
            }
            best.into_iter().map(|(_, i)| i.instance_id).collect()
        }
    }
}

fn best_of<'a>(instances: impl IntoIterator<Item = &'a EffectInstance>) -> Option<&'a EffectInstance> {
    instances.into_iter().fold(None, |best, instance| match best {
        Some(current) if !instance.is_better_than(current) => Some(current),
        _ => Some(instance),
    })
}
