//! Engine configuration loader.

use std::path::Path;

use status_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load engine config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse engine config TOML: {}", e))?;

        if config.container_capacity > EngineConfig::MAX_CONTAINER_CAPACITY {
            tracing::warn!(
                requested = config.container_capacity,
                max = EngineConfig::MAX_CONTAINER_CAPACITY,
                "container capacity clamped"
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "container_capacity = 12").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.container_capacity, 12);
        assert_eq!(
            config.min_sync_remaining_secs,
            EngineConfig::DEFAULT_MIN_SYNC_REMAINING_SECS
        );
    }

    #[test]
    fn malformed_file_is_reported() {
        let err = ConfigLoader::parse("container_capacity = \"many\"").unwrap_err();
        assert!(err.to_string().contains("engine config TOML"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("engine.toml"));
    }
}
