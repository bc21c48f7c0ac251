use std::{
    env,
    fmt::Display,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    str::FromStr,
};

use ada_core::{default_log_level, LogLevel};
use log::info;
use thiserror::Error;

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot resolve working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    /// Always absolute.
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
    pub allowed_origins: Vec<String>,
    pub session_ttl_hours: i64,
    /// JSON array of store items inserted when the catalog is empty.
    pub store_seed: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset or blank keys
    /// take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let cwd = env::current_dir()?;

        let session_ttl_hours: i64 = try_load(&var, "ADA_SESSION_TTL_HOURS", "720")?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "ADA_SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let allowed_origins = var("ADA_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            bind: try_load(&var, "ADA_BIND", "0.0.0.0")?,
            port: try_load(&var, "ADA_PORT", "8081")?,
            db_path: var("ADA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ada.sqlite3")),
            log_dir: absolute(
                &cwd,
                var("ADA_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("logs")),
            ),
            log_level: try_load(&var, "ADA_LOG_LEVEL", default_log_level().as_str())?,
            allowed_origins,
            session_ttl_hours,
            store_seed: var("ADA_STORE_SEED").map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl_hours.saturating_mul(HOUR_MS)
    }

    /// Logs the effective settings. Call once logging is up.
    pub fn log_summary(&self) {
        info!(
            "event=config_loaded module=config status=ok addr={} db_path={} log_level={} origins={} session_ttl_hours={} store_seed={}",
            self.socket_addr(),
            self.db_path.display(),
            self.log_level,
            self.allowed_origins.join(","),
            self.session_ttl_hours,
            self.store_seed
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }
}

fn try_load<T, F>(var: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = var(key).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

fn absolute(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8081");
        assert_eq!(config.db_path, PathBuf::from("ada.sqlite3"));
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("logs"));
        assert_eq!(config.allowed_origins, vec!["http://localhost:8080"]);
        assert_eq!(config.session_ttl_ms(), 720 * HOUR_MS);
        assert!(config.store_seed.is_none());
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = config_from(&[(
            "ADA_ALLOWED_ORIGINS",
            "http://a.test , ,http://b.test",
        )])
        .unwrap();
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = config_from(&[("ADA_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADA_PORT", .. }));

        let err = config_from(&[("ADA_LOG_LEVEL", "chatty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADA_LOG_LEVEL", .. }));

        let err = config_from(&[("ADA_SESSION_TTL_HOURS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ADA_SESSION_TTL_HOURS",
                ..
            }
        ));
    }
}
