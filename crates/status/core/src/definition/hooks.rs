//! Per-kind custom behavior.
//!
//! Kinds whose behavior cannot be expressed by [`super::ConstantEffect`] /
//! [`super::PeriodicEffect`] register an [`EffectHooks`] implementation next
//! to their definition. Every method has a no-op default, so implementations
//! only override the points they care about.

use crate::combatant::World;
use crate::error::EffectError;
use crate::instance::EffectInstance;

/// Custom code attached to one effect kind.
///
/// Hooks must be deterministic: every participant runs them on its own copy of
/// the instance and they may not consult anything but their arguments.
pub trait EffectHooks: Send + Sync {
    /// Runs once when a new instance attaches (not on merges, not on bulk sync).
    fn on_start(&self, _instance: &EffectInstance, _world: &mut dyn World) {}

    /// Runs once after an instance has been detached.
    fn on_end(&self, _instance: &EffectInstance, _world: &mut dyn World) {}

    /// Runs every tick for instances that survived the removal check.
    fn on_update(&self, _instance: &mut EffectInstance, _world: &mut dyn World) {}

    /// Extra improvement test consulted after field-wise merging.
    fn merge_check(&self, _candidate: &EffectInstance, _existing: &EffectInstance) -> bool {
        false
    }

    /// Runs on the candidate after a merge improved it.
    fn on_merge(&self, _candidate: &mut EffectInstance) {}

    /// Kind-specific removal, checked on every participant.
    fn should_remove(&self, _instance: &EffectInstance, _world: &dyn World) -> bool {
        false
    }

    /// Kind-specific removal, checked only where the owner is the local player.
    fn should_remove_local(&self, _instance: &EffectInstance, _world: &dyn World) -> bool {
        false
    }

    fn encode_add_extra(&self, instance: &EffectInstance) -> Vec<u8> {
        instance.extra.clone()
    }

    fn decode_add_extra(
        &self,
        instance: &mut EffectInstance,
        bytes: &[u8],
    ) -> Result<(), EffectError> {
        instance.extra = bytes.to_vec();
        Ok(())
    }

    fn encode_remove_extra(&self, _instance: &EffectInstance) -> Vec<u8> {
        Vec::new()
    }

    fn decode_remove_extra(
        &self,
        _instance: &EffectInstance,
        _bytes: &[u8],
    ) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Hooks for kinds fully described by their definition.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl EffectHooks for NoHooks {}
