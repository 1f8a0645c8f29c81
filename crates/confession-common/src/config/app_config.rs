//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub broadcast: BroadcastConfig,
    pub client: ClientConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Gateway server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which post store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

/// Post store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Queue size of each change-feed subscription
    #[serde(default = "default_channel_buffer")]
    pub change_buffer: usize,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Which broadcast channel implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastBackend {
    #[default]
    Redis,
    Local,
}

/// Ephemeral broadcast channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub backend: BroadcastBackend,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Whether a sender also receives its own broadcasts
    #[serde(default)]
    pub self_delivery: bool,
    /// Queue size of each broadcast subscription
    #[serde(default = "default_channel_buffer")]
    pub buffer: usize,
}

/// How a like is written back to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LikeWriteMode {
    /// `likes = likes + 1` at the store
    #[default]
    Atomic,
    /// Fresh read, then write `current + 1`; concurrent likers can lose updates
    ReadModifyWrite,
}

impl LikeWriteMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "atomic" => Some(Self::Atomic),
            "read_modify_write" | "read-modify-write" => Some(Self::ReadModifyWrite),
            _ => None,
        }
    }
}

/// Viewer-side settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub like_write_mode: LikeWriteMode,
    /// File backing the local liked-set
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            like_write_mode: LikeWriteMode::default(),
            storage_path: default_storage_path(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            backend: BroadcastBackend::default(),
            topic: default_topic(),
            self_delivery: false,
            buffer: default_channel_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "confession-board".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_topic() -> String {
    "confessions".to_string()
}

fn default_channel_buffer() -> usize {
    256
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./local_storage.json")
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable required by the selected backends is missing
    /// or a value cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND") {
            Some(s) => match s.to_lowercase().as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::InvalidValue("STORE_BACKEND", s)),
            },
            None => StoreBackend::default(),
        };

        let broadcast_backend = match lookup("BROADCAST_BACKEND") {
            Some(s) => match s.to_lowercase().as_str() {
                "redis" => BroadcastBackend::Redis,
                "local" => BroadcastBackend::Local,
                _ => return Err(ConfigError::InvalidValue("BROADCAST_BACKEND", s)),
            },
            None => BroadcastBackend::default(),
        };

        let database = match (store_backend, lookup("DATABASE_URL")) {
            (_, Some(url)) => Some(DatabaseConfig {
                url,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: lookup("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            }),
            (StoreBackend::Postgres, None) => return Err(ConfigError::MissingVar("DATABASE_URL")),
            (StoreBackend::Memory, None) => None,
        };

        let redis = match (broadcast_backend, lookup("REDIS_URL")) {
            (_, Some(url)) => Some(RedisConfig {
                url,
                max_connections: lookup("REDIS_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_redis_max_connections),
            }),
            (BroadcastBackend::Redis, None) => return Err(ConfigError::MissingVar("REDIS_URL")),
            (BroadcastBackend::Local, None) => None,
        };

        let like_write_mode = match lookup("LIKE_WRITE_MODE") {
            Some(s) => LikeWriteMode::parse(&s)
                .ok_or(ConfigError::InvalidValue("LIKE_WRITE_MODE", s))?,
            None => LikeWriteMode::default(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: match lookup("GATEWAY_PORT") {
                    Some(s) => s
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT", s))?,
                    None => default_port(),
                },
            },
            store: StoreConfig {
                backend: store_backend,
                change_buffer: lookup("STORE_CHANGE_BUFFER")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_channel_buffer),
            },
            database,
            redis,
            broadcast: BroadcastConfig {
                backend: broadcast_backend,
                topic: lookup("BROADCAST_TOPIC").unwrap_or_else(default_topic),
                self_delivery: lookup("BROADCAST_SELF")
                    .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
                buffer: lookup("BROADCAST_BUFFER")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_channel_buffer),
            },
            client: ClientConfig {
                like_write_mode,
                storage_path: lookup("LOCAL_STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_storage_path),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_memory_local_needs_no_urls() {
        let config = AppConfig::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("BROADCAST_BACKEND", "local"),
        ]))
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.broadcast.backend, BroadcastBackend::Local);
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.broadcast.topic, "confessions");
        assert!(!config.broadcast.self_delivery);
        assert_eq!(config.gateway.port, 8081);
        assert_eq!(config.client.like_write_mode, LikeWriteMode::Atomic);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = AppConfig::from_lookup(lookup(&[("BROADCAST_BACKEND", "local")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DATABASE_URL")));
    }

    #[test]
    fn test_redis_requires_url() {
        let err = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("REDIS_URL")));
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("GATEWAY_PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/confessions"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("BROADCAST_TOPIC", "board"),
            ("BROADCAST_SELF", "true"),
            ("LIKE_WRITE_MODE", "read_modify_write"),
        ]))
        .unwrap();

        assert!(config.app.env.is_production());
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.database.unwrap().max_connections, 20);
        assert_eq!(config.redis.unwrap().max_connections, 10);
        assert_eq!(config.broadcast.topic, "board");
        assert!(config.broadcast.self_delivery);
        assert_eq!(config.client.like_write_mode, LikeWriteMode::ReadModifyWrite);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("STORE_BACKEND", _)));

        let err = AppConfig::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("BROADCAST_BACKEND", "local"),
            ("LIKE_WRITE_MODE", "twice"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("LIKE_WRITE_MODE", _)));
    }
}
