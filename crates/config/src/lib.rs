//! Configuration for the trainz-dl API server.
//!
//! The configuration is a single [`Config`] value, loaded once at process
//! start and handed to whatever needs it. Sources are merged in order, with
//! later sources overriding earlier ones:
//!
//! 1. Built-in defaults.
//! 2. The user configuration file (`$XDG_CONFIG_HOME/trainz-dl/config.toml`
//!    on Linux), if present.
//! 3. Either the file passed on the command line (TOML, YAML or JSON by
//!    extension), or `trainz-dl.toml` in the working directory, if present.
//! 4. Variables from a `.env` file in the working directory, if present.
//! 5. The unprefixed environment variables `DEBUG` and `DB_URL`.
//! 6. Environment variables prefixed with `TRAINZ_DL_`, using `__` to reach
//!    nested keys (`TRAINZ_DL_STORAGE__FULL_PATH`).
//!
//! The `.env` file follows the same naming rules as the environment and
//! never overrides a variable that is actually set. Unknown keys are
//! ignored.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::value::Value;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file looked up in the working directory.
pub const LOCAL_FILE: &str = "trainz-dl.toml";
/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TRAINZ_DL_";
/// Dotenv file looked up in the working directory.
pub const ENV_FILE: &str = ".env";
/// Environment variables read without the prefix.
const RAW_ENV_KEYS: [&str; 2] = ["debug", "db_url"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbose logging.
    pub debug: bool,
    /// Connection string of the asset database.
    pub db_url: String,
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub filters: FilterConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            db_url: "sqlite://db.sqlite3".to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

/// Locations of the two asset tiers reported by the details endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Full-quality assets.
    pub full_path: PathBuf,
    /// Low-quality assets.
    pub low_path: PathBuf,
}
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            full_path: PathBuf::from("data/full"),
            low_path: PathBuf::from("data/low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached storage details response, in seconds.
    pub details_ttl: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { details_ttl: 300 }
    }
}
impl CacheConfig {
    pub fn details_ttl(&self) -> Duration {
        Duration::from_secs(self.details_ttl)
    }
}

/// Policy applied when a listing names both a revision and a timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinePolicy {
    /// Both bounds must hold.
    #[default]
    All,
    /// The timestamp bound replaces the revision bound.
    LastWins,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Use `>=` instead of `>` when comparing against filter bounds.
    pub inclusive: bool,
    pub combine: CombinePolicy,
}

impl Config {
    /// Build the layered figment without extracting it.
    ///
    /// An explicit `file` must exist; the implicit files are optional.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = Self::user_file() {
            figment = figment.merge(Toml::file(user));
        }
        figment = match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
                }
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                    Some("json") => figment.merge(Json::file(path)),
                    _ => figment.merge(Toml::file(path)),
                }
            },
            None => figment.merge(Toml::file(LOCAL_FILE)),
        };
        figment = Self::merge_env_file(figment, Path::new(ENV_FILE))?;
        Ok(figment
            .merge(Env::raw().only(&RAW_ENV_KEYS))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Merge the variables of a dotenv file, mapped to configuration keys
    /// the same way as the environment. The process environment is left
    /// untouched; a missing file is skipped.
    fn merge_env_file(mut figment: Figment, path: &Path) -> Result<Figment> {
        if !path.is_file() {
            return Ok(figment);
        }
        for pair in dotenv::from_path_iter(path).or_raise(|| ErrorKind::Parse)? {
            let (name, value) = pair.or_raise(|| ErrorKind::Parse)?;
            let Some(key) = env_key(&name) else {
                continue;
            };
            // Values are typed the way figment types real environment variables.
            let value: Value = value.parse().unwrap_or_else(|never| match never {});
            figment = figment.merge(Serialized::default(&key, value));
        }
        tracing::debug!(path = %path.display(), "merged dotenv file");
        Ok(figment)
    }

    /// Load and validate the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(file)?.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Per-user configuration file, if the platform has a config directory.
    pub fn user_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "trainz-dl").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.db_url.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("db_url", "must not be empty".to_string()));
        }
        if self.cache.details_ttl == 0 {
            exn::bail!(ErrorKind::InvalidValue("cache.details_ttl", "must be at least one second".to_string()));
        }
        for (key, path) in [("storage.full_path", &self.storage.full_path), ("storage.low_path", &self.storage.low_path)] {
            if path.as_os_str().is_empty() {
                exn::bail!(ErrorKind::InvalidValue(key, "must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Configuration key path for an environment variable name, if it is one
/// the configuration reads.
fn env_key(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    if RAW_ENV_KEYS.contains(&lower.as_str()) {
        return Some(lower);
    }
    let nested = name.strip_prefix(ENV_PREFIX)?.to_ascii_lowercase();
    (!nested.is_empty()).then(|| nested.split("__").collect::<Vec<_>>().join("."))
}
