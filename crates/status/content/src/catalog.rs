//! The built-in effect table, embedded at compile time.

use status_core::{EffectDefinition, Registry};

use crate::loaders::{DefinitionLoader, LoadResult, build_registry};

/// RON source of the built-in effects.
pub const BUILTIN_EFFECTS: &str = include_str!("../data/effects.ron");

pub fn builtin_definitions() -> LoadResult<Vec<EffectDefinition>> {
    DefinitionLoader::parse(BUILTIN_EFFECTS)
}

/// Registry of every built-in effect with its hooks installed.
pub fn builtin_registry() -> LoadResult<Registry> {
    build_registry(builtin_definitions()?)
}
