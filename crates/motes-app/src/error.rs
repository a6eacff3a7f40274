use thiserror::Error;

use crate::script::ScriptError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] motes_core::EngineError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("window error: {0}")]
    Window(String),
}
