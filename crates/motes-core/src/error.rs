//! Error types for motes-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("drawing surface not found: {0}")]
    SurfaceNotFound(String),

    #[error("input region not found: {0}")]
    RegionNotFound(String),

    #[error("surface {0} cannot provide a 2-D drawing context")]
    ContextUnavailable(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config value out of range: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
