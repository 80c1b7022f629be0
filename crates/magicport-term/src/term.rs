use std::fmt;

/// Maximum atom length in characters.
pub const MAX_ATOM_CHARS: usize = 255;

/// A decoded or to-be-encoded wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A symbol such as `ok` or `add_database`.
    Atom(String),
    /// A fixed-arity ordered sequence.
    Tuple(Vec<Term>),
    /// Raw bytes: paths, payloads, result text.
    Binary(Vec<u8>),
    /// A signed integer.
    Integer(i64),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn tuple(elements: impl Into<Vec<Term>>) -> Self {
        Term::Tuple(elements.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Term::Binary(bytes.into())
    }

    /// The atom name, if this is an atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// The tuple elements, if this is a tuple.
    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// The binary contents, if this is a binary.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Term::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => f.write_str(name),
            Term::Integer(value) => write!(f, "{value}"),
            Term::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "<<{text:?}>>"),
                Err(_) => write!(f, "<<{} bytes>>", bytes.len()),
            },
            Term::Tuple(elements) => {
                f.write_str("{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("}")
            }
        }
    }
}
