// Local settings for the casegen CLI.
//
// File: `~/.casegen/config.toml`. Command-line flags override file values.
// Tracker credentials are not kept here; they live in the document store
// under the user's config path.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";
pub const DEFAULT_USER_ID: &str = "local";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
const STORE_FILE_NAME: &str = "casegen.db";

/// Root directory for casegen state: `~/.casegen/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".casegen"))
}

/// Path to the settings file: `~/.casegen/config.toml`.
pub fn settings_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("config.toml"))
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error at `{path}`: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("settings parse error in `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("settings serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine home directory; pass --store explicitly")]
    NoHomeDir,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the running casegen proxy.
    pub proxy_url: String,
    /// Identifier that scopes stored configuration and saved test cases.
    pub user_id: String,
    /// SQLite store location. Defaults to `~/.casegen/casegen.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Per-request timeout against the proxy, in seconds.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            store_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Flag values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub settings_file: Option<PathBuf>,
    pub proxy_url: Option<String>,
    pub user_id: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Settings {
    /// Load the settings file (defaults when it does not exist) and apply
    /// the overrides on top.
    pub fn resolve(overrides: &SettingsOverrides) -> Result<Self, SettingsError> {
        let path = overrides.settings_file.clone().or_else(settings_path);
        let mut settings = match path {
            Some(path) => Self::load_or_default(&path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        Ok(settings)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&contents)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }

    fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match Self::load_from(path) {
            Err(SettingsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| SettingsError::Io { path: parent.to_path_buf(), source })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|source| SettingsError::Io { path: path.to_path_buf(), source })
    }

    fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(proxy_url) = &overrides.proxy_url {
            self.proxy_url = proxy_url.clone();
        }
        if let Some(user_id) = &overrides.user_id {
            self.user_id = user_id.clone();
        }
        if let Some(store_path) = &overrides.store_path {
            self.store_path = Some(store_path.clone());
        }
    }

    pub fn store_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => {
                global_dir().map(|dir| dir.join(STORE_FILE_NAME)).ok_or(SettingsError::NoHomeDir)
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_from_toml() {
        let toml_str = r#"
proxy_url = "https://proxy.qa.example"
user_id = "tester-7"
store_path = "/var/lib/casegen/store.db"
timeout_secs = 30
"#;
        let settings: Settings = toml::from_str(toml_str).expect("settings should parse");
        assert_eq!(settings.proxy_url, "https://proxy.qa.example");
        assert_eq!(settings.user_id, "tester-7");
        assert_eq!(settings.store_path, Some(PathBuf::from("/var/lib/casegen/store.db")));
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: Settings = toml::from_str("user_id = \"qa\"").expect("settings should parse");
        assert_eq!(settings.proxy_url, DEFAULT_PROXY_URL);
        assert_eq!(settings.user_id, "qa");
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(settings.store_path.is_none());
    }

    #[test]
    fn missing_file_resolves_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let overrides = SettingsOverrides {
            settings_file: Some(dir.path().join("absent.toml")),
            ..SettingsOverrides::default()
        };
        assert_eq!(Settings::resolve(&overrides).expect("should resolve"), Settings::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "proxy_url = [").expect("write should succeed");

        let overrides =
            SettingsOverrides { settings_file: Some(path), ..SettingsOverrides::default() };
        assert!(matches!(Settings::resolve(&overrides), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        Settings { user_id: "from-file".into(), ..Settings::default() }
            .save_to(&path)
            .expect("save should succeed");

        let overrides = SettingsOverrides {
            settings_file: Some(path),
            proxy_url: Some("http://127.0.0.1:9000".into()),
            store_path: Some(dir.path().join("store.db")),
            ..SettingsOverrides::default()
        };
        let settings = Settings::resolve(&overrides).expect("should resolve");
        assert_eq!(settings.user_id, "from-file");
        assert_eq!(settings.proxy_url, "http://127.0.0.1:9000");
        assert_eq!(settings.store_path().expect("path"), dir.path().join("store.db"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("nested").join("casegen").join("config.toml");
        Settings::default().save_to(&path).expect("save should succeed");
        assert_eq!(Settings::load_from(&path).expect("load should succeed"), Settings::default());
    }

    #[test]
    fn global_dir_is_under_home() {
        if let Some(dir) = global_dir() {
            assert!(dir.ends_with(".casegen"));
        }
    }
}
