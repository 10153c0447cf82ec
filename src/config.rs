//! Configuration management for descfs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default attribute/entry TTL handed to the kernel, in seconds
pub const DEFAULT_ATTR_TTL_SECS: u64 = 1;

/// Default filesystem name shown in the mount table
pub const DEFAULT_FS_NAME: &str = "descfs";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Description store configuration
    pub store: StoreConfig,

    /// Archive tool configuration
    pub archive: ArchiveConfig,

    /// Mount configuration
    pub mount: MountConfig,
}

/// Description store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one sub-directory per description
    pub base_path: PathBuf,
}

/// Archive tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Program used to list and extract `.tgz` archives
    pub tar_program: PathBuf,
}

/// Mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Allow other users to access the mount
    pub allow_other: bool,

    /// Ask the kernel to unmount when the process exits (needs `allow_other`)
    pub auto_unmount: bool,

    /// Filesystem name reported to the mount table
    pub fs_name: String,

    /// Attribute and entry cache TTL in seconds
    pub attr_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreConfig::default(),
            archive: ArchiveConfig::default(),
            mount: MountConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let base_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".descfs");

        StoreConfig { base_path }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            tar_program: PathBuf::from("tar"),
        }
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        MountConfig {
            allow_other: false,
            auto_unmount: false,
            fs_name: DEFAULT_FS_NAME.to_string(),
            attr_ttl_secs: DEFAULT_ATTR_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Load configuration if the file exists, otherwise start from defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(store) = std::env::var("DESCFS_STORE") {
            let store = store.trim();
            if !store.is_empty() {
                self.store.base_path = PathBuf::from(store);
            }
        }

        if let Ok(tar) = std::env::var("DESCFS_TAR") {
            let tar = tar.trim();
            if !tar.is_empty() {
                self.archive.tar_program = PathBuf::from(tar);
            }
        }

        if let Ok(ttl) = std::env::var("DESCFS_ATTR_TTL") {
            if let Ok(secs) = ttl.trim().parse::<u64>() {
                self.mount.attr_ttl_secs = secs;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.base_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "Description store path is required".to_string(),
            ));
        }

        if self.archive.tar_program.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "Archive program is required".to_string(),
            ));
        }

        if self.mount.fs_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "Filesystem name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
