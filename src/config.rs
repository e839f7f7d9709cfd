use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

/// ConfigError
///
/// An environment variable was set but could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// AppConfig
///
/// Holds the application's configuration, read once at startup and carried in the
/// application state. Nothing reads the environment after `load` returns.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and whether migrations run at startup.
    pub env: Env,
    // SQLite database file.
    pub database_path: PathBuf,
    pub bind_host: IpAddr,
    pub port: u16,
    // Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout: Duration,
}

/// Env
///
/// `Local` gets pretty logs and automatic migrations; `Production` gets JSON logs and
/// leaves the schema to the operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// Suffix used in the default database file name.
    fn database_suffix(self) -> &'static str {
        match self {
            Env::Local => "dev",
            Env::Production => "prod",
        }
    }
}

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking config for test state scaffolding. Nothing is read from the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            database_path: default_database_path(DEFAULT_DATA_DIR, Env::Local),
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, falling back to defaults
    /// for anything unset.
    ///
    /// # Errors
    /// Fails fast with `ConfigError::Invalid` when a variable is set to a value that
    /// cannot be parsed, rather than silently using the default.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV") {
            Ok(value) => match value.as_str() {
                "local" => Env::Local,
                "production" => Env::Production,
                _ => return Err(invalid("APP_ENV", value)),
            },
            Err(_) => Env::Local,
        };

        let database_path = match env::var("DATABASE_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => {
                let data_dir =
                    env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
                default_database_path(&data_dir, env)
            }
        };

        let bind_host = parse_var("BIND_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_var("PORT", DEFAULT_PORT)?;
        let shutdown_secs = parse_var("SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?;

        Ok(Self {
            env,
            database_path,
            bind_host,
            port,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }
}

fn default_database_path(data_dir: &str, env: Env) -> PathBuf {
    PathBuf::from(data_dir).join(format!("sqlite_{}_database.db", env.database_suffix()))
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| invalid(key, value)),
        Err(_) => Ok(default),
    }
}

fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { key, value }
}
