//! Custom hooks for kinds whose behavior is not pure data.

use std::sync::Arc;

use status_core::{
    AbilityId, EffectError, EffectHooks, EffectInstance, EffectKind, Registry, Resource, World,
};

/// Hunter's mark remembers which ability applied it and fades once the hunter
/// no longer has that ability.
///
/// The ability travels in the add payload as two little-endian bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HuntersMarkHooks;

impl HuntersMarkHooks {
    pub fn extra(ability: AbilityId) -> Vec<u8> {
        ability.0.to_le_bytes().to_vec()
    }

    pub fn ability(instance: &EffectInstance) -> Option<AbilityId> {
        let bytes: [u8; 2] = instance.extra.as_slice().try_into().ok()?;
        Some(AbilityId(u16::from_le_bytes(bytes)))
    }
}

impl EffectHooks for HuntersMarkHooks {
    fn should_remove_local(&self, instance: &EffectInstance, world: &dyn World) -> bool {
        match Self::ability(instance) {
            Some(ability) => !world.has_ability(instance.owner, ability),
            None => true,
        }
    }

    fn decode_add_extra(
        &self,
        instance: &mut EffectInstance,
        bytes: &[u8],
    ) -> Result<(), EffectError> {
        if bytes.len() != 2 {
            return Err(EffectError::MalformedExtra {
                kind: instance.kind,
            });
        }
        instance.extra = bytes.to_vec();
        Ok(())
    }
}

/// Bloodlust only holds while the bearer is badly hurt.
#[derive(Clone, Copy, Debug)]
pub struct BloodlustHooks {
    pub life_threshold: f32,
}

impl Default for BloodlustHooks {
    fn default() -> Self {
        Self {
            life_threshold: 0.5,
        }
    }
}

impl EffectHooks for BloodlustHooks {
    fn should_remove(&self, instance: &EffectInstance, world: &dyn World) -> bool {
        world.resource_ratio(instance.target, Resource::Life) > self.life_threshold
    }
}

/// Hooks shipped for `kind`, if it has any.
pub fn hooks_for(kind: EffectKind) -> Option<Arc<dyn EffectHooks>> {
    match kind {
        EffectKind::HuntersMark => Some(Arc::new(HuntersMarkHooks)),
        EffectKind::Bloodlust => Some(Arc::new(BloodlustHooks::default())),
        _ => None,
    }
}

/// Attaches the shipped hooks to every registered kind that has some.
pub fn install_hooks(registry: &mut Registry) -> Result<usize, EffectError> {
    let kinds: Vec<EffectKind> = registry.definitions().map(|d| d.kind).collect();
    let mut installed = 0;
    for kind in kinds {
        if let Some(hooks) = hooks_for(kind) {
            registry.set_hooks(kind, hooks)?;
            installed += 1;
        }
    }
    Ok(installed)
}
