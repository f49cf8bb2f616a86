//! Content loaders for reading effect data from files.
//!
//! Definition tables are RON ([`DefinitionLoader`]), engine configuration is
//! TOML ([`ConfigLoader`]). [`ContentFactory`] ties both to a data directory.

pub mod config;
pub mod definitions;
pub mod factory;

pub use config::ConfigLoader;
pub use definitions::{
    DefinitionLoader, DurationSpec, EffectCatalog, EffectSpec, TemplateSpec, build_registry,
};
pub use factory::ContentFactory;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
