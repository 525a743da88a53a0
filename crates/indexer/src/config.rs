use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use voicetree_graph::DEFAULT_CONTEXT_MAX_DISTANCE;

/// Directory inside the vault holding tool state
pub const CONFIG_DIR: &str = ".voicetree";
pub const CONFIG_FILE: &str = "config.toml";
pub const MAX_DISTANCE_ENV: &str = "VOICETREE_CONTEXT_MAX_DISTANCE";

/// Vault configuration, read from `<vault>/.voicetree/config.toml`
///
/// ```toml
/// [vault]
/// exclude = ["archive/**", "*.draft.md"]
///
/// [watch]
/// poll_interval_ms = 2000
///
/// [context]
/// max_distance = 7.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault directory; set by the loader, never read from the file
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub vault: VaultSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub context: ContextSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultSection {
    /// Globs relative to the vault root whose files are not loaded
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSection {
    /// Poll interval for watcher backends that poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSection {
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
        }
    }
}

fn default_max_distance() -> f64 {
    DEFAULT_CONTEXT_MAX_DISTANCE
}

impl VaultConfig {
    /// Defaults for `root`, without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            vault: VaultSection::default(),
            watch: WatchSection::default(),
            context: ContextSection::default(),
        }
    }

    /// Load the vault's config file when present, then apply the environment.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(root.display().to_string()));
        }

        let path = config_path(&root);
        let mut config = if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            let mut parsed: Self = toml::from_str(&raw)?;
            log::debug!("Loaded vault config from {}", path.display());
            parsed.root = root;
            parsed
        } else {
            Self::new(root)
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let Ok(raw) = std::env::var(MAX_DISTANCE_ENV) else {
            return;
        };
        match raw.trim().parse::<f64>() {
            Ok(value) => self.context.max_distance = value,
            Err(err) => log::warn!("Ignoring {MAX_DISTANCE_ENV}={raw}: {err}"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.context.max_distance > 0.0) {
            return Err(IndexerError::Config(format!(
                "context.max_distance must be positive, got {}",
                self.context.max_distance
            )));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(IndexerError::Config(
                "watch.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    #[must_use]
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.context.max_distance = max_distance;
        self
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_config_file() {
        let temp = tempdir().unwrap();
        let config = VaultConfig::load(temp.path()).unwrap();
        assert!(config.vault.exclude.is_empty());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.root, temp.path());
    }

    #[test]
    fn reads_sections_from_toml() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            config_path(temp.path()),
            "[vault]\nexclude = [\"archive/**\"]\n\n[watch]\npoll_interval_ms = 250\n",
        )
        .unwrap();

        let config = VaultConfig::load(temp.path()).unwrap();
        assert_eq!(config.vault.exclude, vec!["archive/**".to_string()]);
        assert_eq!(config.watch.poll_interval_ms, 250);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();
        fs::write(config_path(temp.path()), "[vault\nexclude = 3").unwrap();

        let err = VaultConfig::load(temp.path()).unwrap_err();
        assert!(matches!(err, IndexerError::Config(_)));
    }

    #[test]
    fn missing_vault_is_rejected() {
        let temp = tempdir().unwrap();
        let err = VaultConfig::load(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, IndexerError::InvalidPath(_)));
    }

    #[test]
    fn non_positive_distance_fails_validation() {
        let config = VaultConfig::new("/vault").with_max_distance(0.0);
        assert!(config.validate().is_err());
    }
}
