use crate::engine::ViewKind;

/// A failure reported by the classification engine for one view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    /// Native error code (an `errno` value for libmagic).
    pub code: i64,
    /// Human-readable message from the engine.
    pub message: String,
}

impl EngineError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors that can occur while loading the engine's shared library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// None of the candidate libraries could be opened.
    #[error("failed to load libmagic ({tried}): {message}")]
    Open { tried: String, message: String },

    /// The library lacks a required function.
    #[error("libmagic is missing symbol `{0}`")]
    MissingSymbol(String),

    /// The library path cannot be passed to the dynamic loader.
    #[error("library path contains a NUL byte: {0}")]
    InvalidPath(std::path::PathBuf),

    /// Runtime loading is not available on this platform.
    #[error("loading libmagic is not supported on this platform")]
    Unsupported,
}

/// Errors that can occur in registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A view could not be opened.
    #[error("failed to open {view} view: {source}")]
    Open { view: ViewKind, source: EngineError },

    /// A rules database could not be loaded into a view.
    #[error("failed to load database into {view} view: {source}")]
    Load { view: ViewKind, source: EngineError },

    /// A view failed to classify the input.
    #[error("{view} classification failed: {source}")]
    Classify { view: ViewKind, source: EngineError },

    /// Classification was requested before a database was loaded.
    #[error("magic database not loaded")]
    NotReady,

    /// The views have not been opened.
    #[error("classifier views are not open")]
    NotOpen,
}
