use thiserror::Error;
use vellum_scene_core::ImportError;

/// Errors raised while loading a [`crate::File`].
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artboard {index} failed to load: {source}")]
    Import {
        index: usize,
        #[source]
        source: ImportError,
    },

    #[error("file has no artboards")]
    NoArtboards,

    #[error("unknown artboard '{0}'")]
    UnknownArtboard(String),

    #[error("invalid animation '{name}': {reason}")]
    InvalidAnimation { name: String, reason: String },

    #[error("invalid state machine '{name}': {reason}")]
    InvalidStateMachine { name: String, reason: String },
}
