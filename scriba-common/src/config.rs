//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Policy for resolving a project's language when an upload batch does not
/// name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultLanguagePolicy {
    /// Fall back to the first active language; ingestion fails with a
    /// validation error when no active language exists.
    #[default]
    FirstActive,
    /// Reject uploads that do not name a language explicitly.
    Require,
}

/// Server configuration resolved from CLI, environment, TOML file and
/// compiled defaults, in that priority order.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds
    pub bind_address: String,
    /// Root folder holding the database and uploaded blobs
    pub root_folder: PathBuf,
    /// Language fallback behavior for batch ingestion
    pub default_language_policy: DefaultLanguagePolicy,
    /// Bearer token lifetime in hours
    pub session_ttl_hours: i64,
}

/// Optional values read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub root_folder: Option<String>,
    pub default_language_policy: Option<DefaultLanguagePolicy>,
    pub session_ttl_hours: Option<i64>,
}

impl TomlConfig {
    /// Load the TOML config file if one exists, else defaults.
    ///
    /// Looks for `~/.config/scriba/config.toml` (platform config dir), then
    /// `/etc/scriba/config.toml` on Linux.
    pub fn load() -> Result<Self> {
        let path = match find_config_file() {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config from a TOML string (test seam)
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("scriba").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/scriba/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

impl ServerConfig {
    /// Resolve configuration with CLI → ENV → TOML → default priority
    pub fn resolve(
        cli_bind: Option<&str>,
        cli_root: Option<&str>,
        toml_config: &TomlConfig,
    ) -> Self {
        let bind_address = cli_bind
            .map(str::to_string)
            .or_else(|| std::env::var("SCRIBA_BIND_ADDRESS").ok())
            .or_else(|| toml_config.bind_address.clone())
            .unwrap_or_else(|| "127.0.0.1:5800".to_string());

        let root_folder = cli_root
            .map(PathBuf::from)
            .or_else(|| std::env::var("SCRIBA_ROOT_FOLDER").ok().map(PathBuf::from))
            .or_else(|| toml_config.root_folder.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_root_folder);

        let default_language_policy = std::env::var("SCRIBA_DEFAULT_LANGUAGE_POLICY")
            .ok()
            .and_then(|v| match v.as_str() {
                "first-active" => Some(DefaultLanguagePolicy::FirstActive),
                "require" => Some(DefaultLanguagePolicy::Require),
                _ => None,
            })
            .or(toml_config.default_language_policy)
            .unwrap_or_default();

        let session_ttl_hours = toml_config.session_ttl_hours.unwrap_or(24);

        Self {
            bind_address,
            root_folder,
            default_language_policy,
            session_ttl_hours,
        }
    }

    /// Create the root folder (and uploads subfolder) if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("scriba.db")
    }

    /// Directory holding uploaded file blobs
    pub fn uploads_dir(&self) -> PathBuf {
        self.root_folder.join("uploads")
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scriba"))
        .unwrap_or_else(|| Path::new("./scriba_data").to_path_buf())
}
