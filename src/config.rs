use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://notify.example.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    pub account: String,
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_true")]
    pub desktop_toasts: bool,
    #[serde(default)]
    pub locker_path: Option<PathBuf>,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            desktop_toasts: true,
            locker_path: None,
            service: ServiceConfig::default(),
            identity: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug)]
pub struct Config {
    pub path: PathBuf,
    pub poll_interval_secs: u64,
    pub desktop_toasts: bool,
    pub locker_path: Option<PathBuf>,
    pub service: ServiceConfig,
    pub identity: Option<IdentityConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(config_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            let default = ConfigFile::default();
            let toml = toml::to_string_pretty(&default)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, toml)?;
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Reading {:?}", &path))?;
        let cfg: ConfigFile = toml::from_str(&content).with_context(|| "Parsing config TOML")?;
        Ok(Self {
            path,
            poll_interval_secs: cfg.poll_interval_secs,
            desktop_toasts: cfg.desktop_toasts,
            locker_path: cfg.locker_path,
            service: cfg.service,
            identity: cfg.identity,
        })
    }
}

fn config_path() -> Result<PathBuf> {
    let base = config_dir().context("Could not determine config directory")?;
    Ok(base.join("belfry").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("belfry").join("config.toml");

        let config = Config::load_from(path.clone()).unwrap();

        assert!(path.exists());
        assert!(config.identity.is_none());
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.service.timeout_secs, 10);
        assert!(config.desktop_toasts);
        assert!(config.locker_path.is_none());
    }

    #[test]
    fn test_identity_table_is_optional_and_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
poll_interval_secs = 60
desktop_toasts = false

[service]
base_url = "https://notify.internal"
timeout_secs = 5

[identity]
account = "casey"
token = "sekrit"
"#,
        )
        .unwrap();

        let config = Config::load_from(path).unwrap();

        let identity = config.identity.unwrap();
        assert_eq!(identity.account, "casey");
        assert_eq!(identity.token, "sekrit");
        assert_eq!(config.service.base_url, "https://notify.internal");
        assert_eq!(config.service.timeout_secs, 5);
        assert_eq!(config.poll_interval_secs, 60);
        assert!(!config.desktop_toasts);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[service]\nbase_url = \"https://n.example\"\ntimeout_secs = 3\n")
            .unwrap();

        let config = Config::load_from(path).unwrap();

        assert_eq!(config.service.base_url, "https://n.example");
        assert_eq!(config.poll_interval_secs, 300);
        assert!(config.desktop_toasts);
        assert!(config.identity.is_none());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_secs = [broken").unwrap();
        assert!(Config::load_from(path).is_err());
    }
}
