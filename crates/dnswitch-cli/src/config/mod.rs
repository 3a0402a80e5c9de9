//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;
use dnswitch::Settings;

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,

    /// Always show explanations (as if --explain was passed).
    #[serde(default)]
    pub explain_by_default: bool,

    /// Probe and rule preferences.
    #[serde(default)]
    pub settings: Settings,
}

/// Where configuration and data files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Directory holding `config.toml`
    pub config_dir: PathBuf,
    /// Directory holding `servers.json` and `dns_rules.json`
    pub data_dir: PathBuf,
}

impl Paths {
    /// Everything under one directory
    pub fn under(home: &Path) -> Self {
        Self {
            config_dir: home.to_path_buf(),
            data_dir: home.to_path_buf(),
        }
    }

    /// `home` if given, otherwise the platform's per-user directories
    pub fn resolve(home: Option<&Path>) -> Result<Self> {
        if let Some(home) = home {
            return Ok(Self::under(home));
        }
        let dirs = ProjectDirs::from("dev", "dnswitch", "dnswitch")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// The config file path.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnswitch::ServerKey;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings.test_domain, "youtube.com");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config {
            output_format: Some(OutputFormat::Json),
            ..Config::default()
        };
        config.settings.set_test_domain("example.org").unwrap();
        config.settings.bootstrap_resolver = Some(ServerKey::new("GOOGLE_DNS"));
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[settings]"));
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_settings_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[settings]\ntest_domain = \"example.net\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.settings.test_domain, "example.net");
        assert_eq!(config.settings.predefined_ips.len(), 2);
        assert!(config.output_format.is_none());
    }

    #[test]
    fn test_home_overrides_project_dirs() {
        let paths = Paths::resolve(Some(Path::new("/tmp/dnswitch-home"))).unwrap();
        assert_eq!(paths.config_file(), Path::new("/tmp/dnswitch-home/config.toml"));
        assert_eq!(paths.data_dir, Path::new("/tmp/dnswitch-home"));
    }
}
