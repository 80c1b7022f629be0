//! Content classification for the port.
//!
//! The registry keeps three independent classifier views (MIME type, MIME
//! encoding, human-readable type name) in lock-step over an abstract
//! [`Engine`]. The production engine is libmagic, loaded at run time.
//!
//! - [`engine`] — The capability interface the registry consumes
//! - [`registry`] — View lifecycle and the readiness flag
//! - [`libmagic`] — Runtime binding to the system libmagic (Unix only)

pub mod engine;
pub mod error;
pub mod registry;

#[cfg(unix)]
pub mod libmagic;

pub use engine::{Engine, Input, View, ViewKind};
pub use error::{EngineError, LibraryError, RegistryError};
pub use registry::{ClassifierRegistry, Labels, ViewState};

#[cfg(unix)]
pub use libmagic::LibMagic;
