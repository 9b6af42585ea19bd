//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/clinic/clinic.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `CLINIC_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Base URI used in `Link` headers
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            public_url: DEFAULT_PUBLIC_URL.into(),
        }
    }
}

impl ServerConfig {
    /// `public_url` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

/// Bulk upload settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Unified configuration for clinic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON snapshot file; records are kept in memory only when unset
    pub data_file: Option<PathBuf>,
    pub server: ServerConfig,
    pub upload: UploadConfig,
}

/// Get the XDG config directory for clinic.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "clinic").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("clinic.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - config file given on the command line; must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), explicit, "CLINIC")
    }

    /// Load settings from the given global file, explicit file and env prefix.
    ///
    /// A missing global file is skipped; a missing explicit file is an error.
    pub fn load_from(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("server.bind", defaults.server.bind)
            .map_err(config_err)?
            .set_default("server.public_url", defaults.server.public_url)
            .map_err(config_err)?
            .set_default(
                "upload.max_body_bytes",
                defaults.upload.max_body_bytes as i64,
            )
            .map_err(config_err)?;

        if let Some(path) = global {
            builder =
                builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        if let Some(path) = explicit {
            builder =
                builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.data_file {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.data_file = Some(PathBuf::from(expanded));
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        format!(
            r#"# clinic configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/clinic/clinic.toml
#   Explicit: clinic --config <file>
#   Env:      CLINIC_* environment variables, e.g. CLINIC_SERVER__BIND

# JSON snapshot of all records; omit to keep records in memory only
# data_file = "~/.local/share/clinic/clinic.json"

[server]
# Address the HTTP server listens on
# bind = "{DEFAULT_BIND}"

# Base URI for Link headers
# public_url = "{DEFAULT_PUBLIC_URL}"

[upload]
# Largest accepted upload body in bytes
# max_body_bytes = {DEFAULT_MAX_BODY_BYTES}
"#
        )
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
