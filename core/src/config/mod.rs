//! `config.toml` under the reel home directory.

pub mod schema;

use std::io;
use std::path::Path;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::input::filter::SavedFilter;
use crate::input::registry::RegistrySettings;

pub const CONFIG_TOML_FILE: &str = "config.toml";
pub const DEFAULT_CONF_FILE: &str = "input.conf";
pub const DEFAULT_MAX_CONF_FILE_LINES: usize = 10_000;
const REEL_HOME_ENV: &str = "REEL_HOME";
const LOG_DIR: &str = "log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory; set REEL_HOME")]
    NoHomeDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Raw contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub input: InputToml,
}

/// Settings for `[input]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct InputToml {
    /// Path of the key bindings file. Relative paths are resolved against
    /// the reel home directory. Defaults to `input.conf`.
    pub conf_file: Option<PathBuf>,
    /// Log every binding on each rebuild of the active bindings.
    pub log_bindings_rebuild: Option<bool>,
    /// Largest bindings file (in lines) that will be loaded or pasted.
    pub max_conf_file_lines: Option<usize>,
    /// Saved audio and video filters with optional shortcuts.
    #[serde(default)]
    pub saved_filters: Vec<SavedFilter>,
}

/// Command line overrides applied on top of `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub reel_home: Option<PathBuf>,
    pub conf_file: Option<PathBuf>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub reel_home: PathBuf,
    pub conf_file: PathBuf,
    pub log_bindings_rebuild: bool,
    pub max_conf_file_lines: usize,
    pub saved_filters: Vec<SavedFilter>,
}

/// `$REEL_HOME` if set and non-empty, else `~/.reel`.
pub fn find_reel_home() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(REEL_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".reel"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Reads `config.toml` from `reel_home`. A missing file yields defaults.
pub fn load_config_toml(reel_home: &Path) -> Result<ConfigToml, ConfigError> {
    let path = reel_home.join(CONFIG_TOML_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("{} not found, using defaults", path.display());
            return Ok(ConfigToml::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}

impl Config {
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let reel_home = match overrides.reel_home.clone() {
            Some(home) => home,
            None => find_reel_home()?,
        };
        let config_toml = load_config_toml(&reel_home)?;
        Ok(Self::from_toml(reel_home, config_toml, overrides))
    }

    pub fn from_toml(
        reel_home: PathBuf,
        config_toml: ConfigToml,
        overrides: ConfigOverrides,
    ) -> Self {
        let InputToml {
            conf_file,
            log_bindings_rebuild,
            max_conf_file_lines,
            saved_filters,
        } = config_toml.input;

        let conf_file = overrides
            .conf_file
            .or(conf_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_FILE));
        let conf_file = if conf_file.is_absolute() {
            conf_file
        } else {
            reel_home.join(conf_file)
        };

        Self {
            conf_file,
            log_bindings_rebuild: log_bindings_rebuild.unwrap_or(false),
            max_conf_file_lines: max_conf_file_lines.unwrap_or(DEFAULT_MAX_CONF_FILE_LINES),
            saved_filters,
            reel_home,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.reel_home.join(LOG_DIR)
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            log_bindings_rebuild: self.log_bindings_rebuild,
        }
    }
}
