//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, BroadcastBackend, BroadcastConfig, ClientConfig, ConfigError,
    DatabaseConfig, Environment, LikeWriteMode, RedisConfig, ServerConfig, StoreBackend,
    StoreConfig,
};
