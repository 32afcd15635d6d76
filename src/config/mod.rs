//! Configuration module

pub mod settings;

pub use settings::{
    ApiKeyPlacement, LoggingConfig, PollingConfig, RemoteConfig, ServerConfig, Settings,
};
