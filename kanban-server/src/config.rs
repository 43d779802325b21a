//! Server configuration
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. TOML file (`~/.config/kanban/config.toml`, or an explicit path)
//! 3. environment: `DATABASE_URL`, `KANBAN_BIND`, `KANBAN_MAX_CONNECTIONS`,
//!    `KANBAN_CORS_PERMISSIVE`
//!
//! CLI flags are applied on top by the binary. `.env` loading also happens
//! there, before [`ServerConfig::load`] reads the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::db::pool::DEFAULT_MAX_CONNECTIONS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// PostgreSQL connection string; required unless serving from memory
    pub database_url: Option<String>,

    /// Pool size (default: 5)
    pub max_connections: u32,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            cors_permissive: false,
        }
    }
}

/// On-disk shape; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    cors_permissive: Option<bool>,
}

/// `~/.config/kanban/config.toml` (platform config dir)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kanban").join("config.toml"))
}

impl ServerConfig {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the default path is skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match path {
            Some(p) => config.apply_file(p)?,
            None => {
                if let Some(p) = default_config_path().filter(|p| p.exists()) {
                    config.apply_file(&p)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");

        if let Some(bind) = file.bind {
            self.bind_addr = bind;
        }
        if file.database_url.is_some() {
            self.database_url = file.database_url;
        }
        if let Some(max) = file.max_connections {
            self.max_connections = max;
        }
        if let Some(permissive) = file.cors_permissive {
            self.cors_permissive = permissive;
        }
        Ok(())
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database_url = Some(url);
        }

        if let Some(bind) = lookup("KANBAN_BIND") {
            self.bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
                key: "KANBAN_BIND",
                value: bind,
            })?;
        }

        if let Some(max) = lookup("KANBAN_MAX_CONNECTIONS") {
            self.max_connections = max
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "KANBAN_MAX_CONNECTIONS",
                    value: max,
                })?;
        }

        if let Some(flag) = lookup("KANBAN_CORS_PERMISSIVE") {
            self.cors_permissive = parse_bool(&flag).ok_or(ConfigError::Invalid {
                key: "KANBAN_CORS_PERMISSIVE",
                value: flag,
            })?;
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert_eq!(config.max_connections, 5);
        assert!(!config.cors_permissive);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[
                ("DATABASE_URL", "postgres://localhost/kanban"),
                ("KANBAN_BIND", "0.0.0.0:8080"),
                ("KANBAN_MAX_CONNECTIONS", "12"),
                ("KANBAN_CORS_PERMISSIVE", "true"),
            ]))
            .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/kanban"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 12);
        assert!(config.cors_permissive);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(env(&[("KANBAN_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "KANBAN_MAX_CONNECTIONS", .. }));

        let err = config
            .apply_env(env(&[("KANBAN_BIND", "not-an-addr")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "KANBAN_BIND", .. }));
    }

    #[test]
    fn file_layer_then_env_layer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
bind = "127.0.0.1:4000"
database_url = "postgres://file/kanban"
max_connections = 8
"#
        )
        .unwrap();

        let mut config = ServerConfig::default();
        config.apply_file(file.path()).unwrap();
        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(config.max_connections, 8);

        config
            .apply_env(env(&[("DATABASE_URL", "postgres://env/kanban")]))
            .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://env/kanban"));
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn unknown_file_keys_fail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 3000").unwrap();

        let err = ServerConfig::default().apply_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
