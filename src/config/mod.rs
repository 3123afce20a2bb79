pub mod schema;

pub use schema::{AgentixConfig, ScanConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default agentix home directory (~/.agentix).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".agentix"))
        .unwrap_or_else(|| PathBuf::from(".agentix"))
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("agentix.toml")
}

/// Expand a leading `~` in a user-supplied path.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<AgentixConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read agentix config file")?;
        let config: AgentixConfig =
            toml::from_str(&contents).context("Failed to parse agentix config (TOML)")?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    } else {
        Ok(AgentixConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &AgentixConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnresolvedDefaults;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, AgentixConfig::default());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.extract.description_limit, 300);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/agentix.toml");

        let mut cfg = AgentixConfig::default();
        cfg.log_level = "debug".into();
        cfg.extract.unresolved_defaults = UnresolvedDefaults::Tagged;
        cfg.scan.module_prefix = "src/".into();
        save_config(&cfg, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentix.toml");
        std::fs::write(&path, "[extract]\ndebug = true\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert!(cfg.extract.debug);
        assert!(cfg.extract.respect_staticmethod);
        assert_eq!(cfg.scan.module_prefix, "");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentix.toml");
        std::fs::write(&path, "[extract\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
