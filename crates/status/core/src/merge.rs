//! Combining a new candidate with an instance already on the target.

use tracing::debug;

use crate::authority::SessionMode;
use crate::definition::{DurationKind, EffectDefinition, EffectHooks, SyncField};
use crate::error::EffectError;
use crate::instance::EffectInstance;

/// Merges `existing` into `candidate` and reports whether the candidate
/// improved on it.
///
/// Each declared field keeps the candidate's value only when strictly greater;
/// otherwise the existing value is imposed. With `merge_duration`, timed
/// candidates likewise keep the later end time. After the result is
/// `candidate` is never worse than `existing` in any field.
///
/// Only the process that owns `existing` may merge.
pub fn merge(
    candidate: &mut EffectInstance,
    existing: &EffectInstance,
    definition: &EffectDefinition,
    hooks: &dyn EffectHooks,
    session: SessionMode,
) -> Result<bool, EffectError> {
    if !session.is_local(existing.owner) {
        return Err(EffectError::MergeByNonOwner {
            kind: existing.kind,
            target: existing.target,
        });
    }

    let mut improved = false;
    for (field, current) in existing.fields.iter() {
        match candidate.fields.get(field) {
            Some(offered) if offered > current => improved = true,
            _ => {
                candidate.fields.set(field, current);
            }
        }
    }

    if definition.merge_duration && definition.duration == DurationKind::Timed {
        if candidate.expiry > existing.expiry {
            improved = true;
        } else {
            candidate.expiry = existing.expiry;
        }
    }

    improved |= hooks.merge_check(candidate, existing);

    if improved {
        if definition.autostack {
            let stacks = candidate.value(SyncField::Stacks);
            if stacks < f32::from(definition.max_stacks) {
                candidate.fields.set(SyncField::Stacks, stacks + 1.0);
            }
        }
        hooks.on_merge(candidate);
    }

    debug!(
        kind = %existing.kind,
        target = %existing.target,
        improved,
        "merged effect candidate"
    );
    Ok(improved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantId, PeerId};
    use crate::definition::{EffectKind, LimitKind, NoHooks};
    use crate::instance::SyncData;
    use crate::time::{Expiry, Timestamp};

    const OWNER: CombatantId = CombatantId::Player(PeerId(1));
    const TARGET: CombatantId = CombatantId::Npc(9);
    const SESSION: SessionMode = SessionMode::Client { local: PeerId(1) };

    fn venom_definition() -> EffectDefinition {
        EffectDefinition::new(EffectKind::Venom)
            .timed(6.0)
            .limit(LimitKind::One)
            .fields(&[SyncField::Magnitude1, SyncField::Stacks])
            .autostack(3)
    }

    fn venom(magnitude: f32, stacks: f32, end: u64) -> EffectInstance {
        let mut fields = SyncData::zeroed(&[SyncField::Magnitude1, SyncField::Stacks]);
        fields.set(SyncField::Magnitude1, magnitude);
        fields.set(SyncField::Stacks, stacks);
        EffectInstance::new(EffectKind::Venom, OWNER, TARGET, Expiry::At(Timestamp(end)), fields)
    }

    #[test]
    fn weaker_candidate_takes_existing_values() {
        let existing = venom(5.0, 2.0, 8_000);
        let mut candidate = venom(3.0, 1.0, 4_000);
        let improved = merge(&mut candidate, &existing, &venom_definition(), &NoHooks, SESSION).unwrap();
        assert!(!improved);
        assert_eq!(candidate.value(SyncField::Magnitude1), 5.0);
        assert_eq!(candidate.value(SyncField::Stacks), 2.0);
        assert_eq!(candidate.expiry, Expiry::At(Timestamp(8_000)));
    }

    #[test]
    fn later_end_improves_and_autostacks() {
        let existing = venom(5.0, 2.0, 8_000);
        let mut candidate = venom(5.0, 1.0, 9_000);
        let improved = merge(&mut candidate, &existing, &venom_definition(), &NoHooks, SESSION).unwrap();
        assert!(improved);
        assert_eq!(candidate.value(SyncField::Stacks), 3.0);
        assert_eq!(candidate.expiry, Expiry::At(Timestamp(9_000)));
    }

    #[test]
    fn stacks_never_exceed_limit() {
        let existing = venom(5.0, 3.0, 8_000);
        let mut candidate = venom(6.0, 1.0, 8_000);
        assert!(merge(&mut candidate, &existing, &venom_definition(), &NoHooks, SESSION).unwrap());
        assert_eq!(candidate.value(SyncField::Stacks), 3.0);
    }

    #[test]
    fn duration_is_ignored_without_merge_duration() {
        let definition = venom_definition().merging(true, false);
        let existing = venom(5.0, 1.0, 8_000);
        let mut candidate = venom(5.0, 1.0, 9_000);
        assert!(!merge(&mut candidate, &existing, &definition, &NoHooks, SESSION).unwrap());
        assert_eq!(candidate.expiry, Expiry::At(Timestamp(9_000)));
    }

    #[test]
    fn merge_check_can_force_improvement() {
        struct AlwaysBetter;
        impl EffectHooks for AlwaysBetter {
            fn merge_check(&self, _: &EffectInstance, _: &EffectInstance) -> bool {
                true
            }
            fn on_merge(&self, candidate: &mut EffectInstance) {
                candidate.extra = vec![1];
            }
        }

        let existing = venom(5.0, 1.0, 8_000);
        let mut candidate = venom(1.0, 1.0, 1_000);
        assert!(merge(&mut candidate, &existing, &venom_definition(), &AlwaysBetter, SESSION).unwrap());
        assert_eq!(candidate.extra, vec![1]);
    }

    #[test]
    fn only_the_owner_may_merge() {
        let mut existing = venom(5.0, 1.0, 8_000);
        existing.owner = CombatantId::Player(PeerId(4));
        let mut candidate = venom(9.0, 1.0, 9_000);
        assert_eq!(
            merge(&mut candidate, &existing, &venom_definition(), &NoHooks, SESSION),
            Err(EffectError::MergeByNonOwner {
                kind: EffectKind::Venom,
                target: TARGET,
            })
        );
    }
}
