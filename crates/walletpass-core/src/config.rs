//! Application configuration management.
//!
//! Configuration is stored at `~/.config/walletpass/config.json` and holds
//! the issuer id, the service-account key path, the origins allowed to
//! render save buttons, and an optional API base URL override.
//!
//! Values from the file are overridden by `WALLET_ISSUER_ID` and
//! `GOOGLE_APPLICATION_CREDENTIALS`, which are in turn overridden by
//! command-line flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ids::is_valid_issuer_id;

/// Application name used for the config directory path
const APP_NAME: &str = "walletpass";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ISSUER_ID_ENV: &str = "WALLET_ISSUER_ID";
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

pub const DEFAULT_API_BASE_URL: &str = "https://walletobjects.googleapis.com";
pub const DEFAULT_ORIGIN: &str = "www.example.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub issuer_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<String>,
    pub api_base_url: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub issuer_id: String,
    pub credentials_path: PathBuf,
    pub origins: Vec<String>,
    pub api_base_url: String,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub issuer_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Like `load`, but an unreadable or corrupt file yields the defaults so
    /// `config set` can overwrite it.
    pub fn load_or_default() -> Result<Self> {
        Ok(Self::load_or_default_from(&Self::config_path()?))
    }

    pub fn load_or_default_from(path: &std::path::Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Ignoring unusable config file");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve against the process environment.
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings> {
        self.resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup.
    /// Precedence is flag, then environment, then file.
    pub fn resolve_with<F>(&self, overrides: &Overrides, env: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let issuer_id = non_empty(overrides.issuer_id.clone())
            .or_else(|| non_empty(env(ISSUER_ID_ENV)))
            .or_else(|| non_empty(self.issuer_id.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No issuer id configured. Set {} or pass --issuer-id",
                    ISSUER_ID_ENV
                )
            })?;
        if !is_valid_issuer_id(&issuer_id) {
            anyhow::bail!(
                "Invalid issuer id {:?}: {} must be the numeric issuer account id",
                issuer_id,
                ISSUER_ID_ENV
            );
        }

        let credentials_path = overrides
            .credentials_path
            .clone()
            .or_else(|| non_empty(env(CREDENTIALS_ENV)).map(PathBuf::from))
            .or_else(|| self.credentials_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No service account key configured. Set {} or pass --credentials",
                    CREDENTIALS_ENV
                )
            })?;

        let origins = if self.origins.is_empty() {
            vec![DEFAULT_ORIGIN.to_string()]
        } else {
            self.origins.clone()
        };

        let api_base_url = self
            .api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Ok(Settings {
            issuer_id,
            credentials_path,
            origins,
            api_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_resolve_precedence() {
        let config = Config {
            issuer_id: Some("1111".to_string()),
            credentials_path: Some(PathBuf::from("/file/key.json")),
            ..Default::default()
        };

        let from_file = config
            .resolve_with(&Overrides::default(), env_of(&[]))
            .unwrap();
        assert_eq!(from_file.issuer_id, "1111");
        assert_eq!(from_file.credentials_path, PathBuf::from("/file/key.json"));

        let from_env = config
            .resolve_with(
                &Overrides::default(),
                env_of(&[(ISSUER_ID_ENV, "2222"), (CREDENTIALS_ENV, "/env/key.json")]),
            )
            .unwrap();
        assert_eq!(from_env.issuer_id, "2222");
        assert_eq!(from_env.credentials_path, PathBuf::from("/env/key.json"));

        let overrides = Overrides {
            issuer_id: Some("3333".to_string()),
            credentials_path: Some(PathBuf::from("/flag/key.json")),
        };
        let from_flags = config
            .resolve_with(&overrides, env_of(&[(ISSUER_ID_ENV, "2222")]))
            .unwrap();
        assert_eq!(from_flags.issuer_id, "3333");
        assert_eq!(from_flags.credentials_path, PathBuf::from("/flag/key.json"));
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Config::default()
            .resolve_with(
                &Overrides::default(),
                env_of(&[(ISSUER_ID_ENV, "1"), (CREDENTIALS_ENV, "k.json")]),
            )
            .unwrap();
        assert_eq!(settings.origins, vec![DEFAULT_ORIGIN.to_string()]);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_resolve_missing_values_name_the_variable() {
        let err = Config::default()
            .resolve_with(&Overrides::default(), env_of(&[(CREDENTIALS_ENV, "k.json")]))
            .unwrap_err();
        assert!(err.to_string().contains(ISSUER_ID_ENV));

        // Blank values count as missing
        let err = Config::default()
            .resolve_with(
                &Overrides::default(),
                env_of(&[(ISSUER_ID_ENV, "1"), (CREDENTIALS_ENV, "  ")]),
            )
            .unwrap_err();
        assert!(err.to_string().contains(CREDENTIALS_ENV));
    }

    #[test]
    fn test_resolve_rejects_non_numeric_issuer_id() {
        for bad in ["338#", "338/../../batch?x=", "issuer"] {
            let err = Config::default()
                .resolve_with(
                    &Overrides::default(),
                    env_of(&[(ISSUER_ID_ENV, bad), (CREDENTIALS_ENV, "k.json")]),
                )
                .unwrap_err();
            let message = err.to_string();
            assert!(message.contains("Invalid issuer id"), "{}", message);
            assert!(message.contains(ISSUER_ID_ENV), "{}", message);
        }

        // A bad file value is still rejected when nothing overrides it
        let config = Config {
            issuer_id: Some("33 88".to_string()),
            credentials_path: Some(PathBuf::from("k.json")),
            ..Default::default()
        };
        assert!(config
            .resolve_with(&Overrides::default(), env_of(&[]))
            .is_err());
    }

    #[test]
    fn test_load_or_default_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(Config::load_or_default_from(&path), Config::default());

        let repaired = Config {
            issuer_id: Some("338".to_string()),
            ..Default::default()
        };
        repaired.save_to(&path).unwrap();
        assert_eq!(Config::load_or_default_from(&path), repaired);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            issuer_id: Some("3388000000012345678".to_string()),
            credentials_path: Some(PathBuf::from("/keys/sa.json")),
            origins: vec!["shop.example.com".to_string()],
            api_base_url: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
