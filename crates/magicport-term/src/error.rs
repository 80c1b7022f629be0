/// Errors that can occur while decoding a term buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer is empty, so no version marker is present.
    #[error("missing format version marker")]
    MissingVersion,

    /// The version marker does not match the version this build speaks.
    #[error("format version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: u8, found: u8 },

    /// A declared length or fixed-width field runs past the end of the buffer.
    #[error("truncated term at offset {offset} (need {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    /// The tag byte is not part of the supported grammar.
    #[error("unsupported tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// The tag byte is valid but not the kind the caller asked for.
    #[error("expected {expected}, found {found} at offset {offset}")]
    UnexpectedTag {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },

    /// An atom is longer than the protocol allows.
    #[error("atom too long ({chars} characters, max {max})")]
    AtomTooLong { chars: usize, max: usize },

    /// A UTF-8 atom does not contain valid UTF-8.
    #[error("atom is not valid UTF-8")]
    InvalidAtom,

    /// An integer does not fit in 64 bits.
    #[error("integer out of range")]
    IntegerOverflow,

    /// Tuples are nested deeper than the decoder accepts.
    #[error("terms nested deeper than {0} levels")]
    TooDeep(usize),
}

impl DecodeError {
    /// Fatal errors mean the two ends disagree on the wire format itself.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DecodeError::MissingVersion | DecodeError::VersionMismatch { .. }
        )
    }
}

/// Errors that can occur while building an encoded term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The buffer was finished while a tuple still expected elements.
    #[error("incomplete tuple ({missing} elements missing)")]
    IncompleteTuple { missing: usize },

    /// Nothing was encoded after the version marker.
    #[error("no term encoded")]
    Empty,

    /// A value was appended after the root term was already complete.
    #[error("value written after the root term was complete")]
    TrailingValue,

    /// An atom name is longer than the protocol allows.
    #[error("atom too long ({chars} characters, max {max})")]
    AtomTooLong { chars: usize, max: usize },

    /// A binary or tuple is too large for its length field.
    #[error("{kind} too large ({len})")]
    TooLarge { kind: &'static str, len: usize },
}
