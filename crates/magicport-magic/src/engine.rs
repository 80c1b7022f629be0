use std::fmt;
use std::path::Path;

use crate::error::EngineError;

/// One of the three classification perspectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// MIME type, e.g. `text/plain`.
    MimeType,
    /// MIME encoding, e.g. `us-ascii`.
    MimeEncoding,
    /// Human-readable description, e.g. `ASCII text`.
    TypeName,
}

impl ViewKind {
    /// Order in which views are opened and loaded.
    pub const LOAD_ORDER: [ViewKind; 3] = [
        ViewKind::MimeEncoding,
        ViewKind::MimeType,
        ViewKind::TypeName,
    ];

    /// Order in which views classify; also the order of labels on the wire.
    pub const CLASSIFY_ORDER: [ViewKind; 3] = [
        ViewKind::MimeType,
        ViewKind::MimeEncoding,
        ViewKind::TypeName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ViewKind::MimeType => "mime_type",
            ViewKind::MimeEncoding => "mime_encoding",
            ViewKind::TypeName => "type_name",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to classify.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// A file on disk, read by the engine.
    Path(&'a Path),
    /// An in-memory buffer.
    Bytes(&'a [u8]),
}

/// A classification engine able to open views.
pub trait Engine {
    type View: View;

    /// Open a fresh, unloaded view.
    fn open(&self, kind: ViewKind) -> Result<Self::View, EngineError>;
}

/// An open classification view. Dropping it closes it.
pub trait View {
    /// Load a rules database, or the engine's default when `None`.
    fn load(&mut self, database: Option<&Path>) -> Result<(), EngineError>;

    /// Classify the input, returning this view's label.
    fn classify(&mut self, input: Input<'_>) -> Result<String, EngineError>;
}
