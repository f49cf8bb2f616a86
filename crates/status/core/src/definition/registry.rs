use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{EffectDefinition, EffectHooks, EffectKind, NoHooks};
use crate::error::EffectError;

struct Entry {
    definition: EffectDefinition,
    hooks: Arc<dyn EffectHooks>,
}

/// Kind → definition table, built once at startup and shared read-only.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<EffectKind, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition without custom hooks.
    pub fn register(&mut self, definition: EffectDefinition) -> Result<(), EffectError> {
        self.register_with_hooks(definition, Arc::new(NoHooks))
    }

    pub fn register_with_hooks(
        &mut self,
        definition: EffectDefinition,
        hooks: Arc<dyn EffectHooks>,
    ) -> Result<(), EffectError> {
        definition.validate()?;
        let kind = definition.kind;
        if self.entries.contains_key(&kind) {
            return Err(EffectError::InvalidDefinition {
                kind,
                reason: "kind registered twice",
            });
        }
        self.entries.insert(kind, Entry { definition, hooks });
        Ok(())
    }

    /// Replaces the hooks of an already registered kind.
    pub fn set_hooks(
        &mut self,
        kind: EffectKind,
        hooks: Arc<dyn EffectHooks>,
    ) -> Result<(), EffectError> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or(EffectError::UnknownKind(kind))?;
        entry.hooks = hooks;
        Ok(())
    }

    pub fn definition(&self, kind: EffectKind) -> Result<&EffectDefinition, EffectError> {
        self.entries
            .get(&kind)
            .map(|entry| &entry.definition)
            .ok_or(EffectError::UnknownKind(kind))
    }

    /// Definition and hooks of `kind`.
    pub fn get(&self, kind: EffectKind) -> Result<(&EffectDefinition, &dyn EffectHooks), EffectError> {
        self.entries
            .get(&kind)
            .map(|entry| (&entry.definition, entry.hooks.as_ref()))
            .ok_or(EffectError::UnknownKind(kind))
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.entries.values().map(|entry| &entry.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
