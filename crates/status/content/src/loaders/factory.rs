//! Content factory for building the effect registry from data files.

use std::path::{Path, PathBuf};

use status_core::{EffectDefinition, EngineConfig, Registry};

use crate::loaders::{ConfigLoader, DefinitionLoader, LoadResult, build_registry};

/// Content factory that loads all effect content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── engine.toml
/// └── effects.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory over the data directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load engine configuration from `engine.toml`.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("engine.toml");
        ConfigLoader::load(&path)
    }

    /// Load effect definitions from `effects.ron`.
    pub fn load_definitions(&self) -> LoadResult<Vec<EffectDefinition>> {
        let path = self.data_dir.join("effects.ron");
        DefinitionLoader::load(&path)
    }

    /// Load, validate and register every definition, with hooks installed.
    pub fn load_registry(&self) -> LoadResult<Registry> {
        let registry = build_registry(self.load_definitions()?)?;
        tracing::info!(
            data_dir = %self.data_dir.display(),
            effects = registry.len(),
            "effect content loaded"
        );
        Ok(registry)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
