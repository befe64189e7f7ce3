pub mod app_config;

pub use app_config::{
    AppConfig, ArtifactConfig, BroadcastConfig, InferenceConfig, LogFormat, LoggingConfig,
    ServerConfig, StorageConfig,
};
