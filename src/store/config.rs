//! Where the registry document lives and how the store reconciles it.

use crate::error::{RegistryError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Config folder relative to the user's home directory
pub const DEFAULT_CONFIG_SUBDIR: &str = ".config/sidechain-cli";

/// Registry document file name inside the config folder
pub const CONFIG_FILE_NAME: &str = "config.json";

/// How liveness probes are scheduled during load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// One probe at a time, in document order
    #[default]
    Sequential,
    /// Probes fanned out over the rayon pool; results kept in document order
    Parallel,
}

/// Settings threaded into [`ConfigStore::load`](super::ConfigStore::load)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub config_dir: PathBuf,
    pub probe_mode: ProbeMode,
}

impl StoreConfig {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            probe_mode: ProbeMode::default(),
        }
    }

    /// `~/.config/sidechain-cli`
    pub fn from_home() -> Result<Self> {
        let home = env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| RegistryError::NoHomeDir)?;
        Ok(Self::new(home.join(DEFAULT_CONFIG_SUBDIR)))
    }

    pub fn with_probe_mode(mut self, mode: ProbeMode) -> Self {
        self.probe_mode = mode;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_location() {
        let config = StoreConfig::new("/tmp/registry");
        assert_eq!(config.config_file(), PathBuf::from("/tmp/registry/config.json"));
        assert_eq!(config.probe_mode, ProbeMode::Sequential);
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("/tmp/registry").with_probe_mode(ProbeMode::Parallel);
        assert_eq!(config.probe_mode, ProbeMode::Parallel);
    }

    #[test]
    fn test_from_home_uses_config_subdir() {
        if env::var("HOME").is_err() {
            return;
        }
        let config = StoreConfig::from_home().unwrap();
        assert!(config.config_dir().ends_with(".config/sidechain-cli"));
    }
}
