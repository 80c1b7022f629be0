use bytes::{BufMut, Bytes, BytesMut};

use crate::error::EncodeError;
use crate::tag::{self, VERSION};
use crate::term::{Term, MAX_ATOM_CHARS};

const INITIAL_BUFFER_CAPACITY: usize = 64;

type Result<T> = std::result::Result<T, EncodeError>;

/// Encode a single term into a versioned buffer.
pub fn encode(term: &Term) -> Result<Bytes> {
    let mut encoder = Encoder::new();
    encoder.encode_term(term)?;
    encoder.finish()
}

/// Append-only builder for one versioned term.
///
/// The encoder counts the elements still owed to every open tuple, so
/// [`Encoder::finish`] refuses to hand out a buffer whose tuples are short
/// of elements, and no value may follow a completed root term.
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
    open: Vec<usize>,
    root_done: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Create an encoder with the version marker already written.
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        buf.put_u8(VERSION);
        Self {
            buf,
            open: Vec::new(),
            root_done: false,
        }
    }

    /// Encode an atom.
    pub fn encode_atom(&mut self, name: &str) -> Result<()> {
        let chars = name.chars().count();
        if chars > MAX_ATOM_CHARS {
            return Err(EncodeError::AtomTooLong {
                chars,
                max: MAX_ATOM_CHARS,
            });
        }
        self.begin_value()?;

        let bytes = name.as_bytes();
        if bytes.len() <= u8::MAX as usize {
            self.buf.put_u8(tag::SMALL_ATOM_UTF8_EXT);
            self.buf.put_u8(bytes.len() as u8);
        } else {
            self.buf.put_u8(tag::ATOM_UTF8_EXT);
            self.buf.put_u16(bytes.len() as u16);
        }
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Open a tuple; the next `arity` values become its elements.
    pub fn encode_tuple_header(&mut self, arity: usize) -> Result<()> {
        let wide = u32::try_from(arity).map_err(|_| EncodeError::TooLarge {
            kind: "tuple",
            len: arity,
        })?;
        self.begin_value()?;

        if arity <= u8::MAX as usize {
            self.buf.put_u8(tag::SMALL_TUPLE_EXT);
            self.buf.put_u8(arity as u8);
        } else {
            self.buf.put_u8(tag::LARGE_TUPLE_EXT);
            self.buf.put_u32(wide);
        }

        if arity > 0 {
            self.open.push(arity);
        }
        Ok(())
    }

    /// Encode a binary.
    pub fn encode_binary(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| EncodeError::TooLarge {
            kind: "binary",
            len: bytes.len(),
        })?;
        self.begin_value()?;
        self.buf.put_u8(tag::BINARY_EXT);
        self.buf.put_u32(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Encode an integer using the smallest tag that holds it.
    pub fn encode_integer(&mut self, value: i64) -> Result<()> {
        self.begin_value()?;

        if (0..=u8::MAX as i64).contains(&value) {
            self.buf.put_u8(tag::SMALL_INTEGER_EXT);
            self.buf.put_u8(value as u8);
        } else if let Ok(narrow) = i32::try_from(value) {
            self.buf.put_u8(tag::INTEGER_EXT);
            self.buf.put_i32(narrow);
        } else {
            let magnitude = value.unsigned_abs();
            let digits = magnitude.to_le_bytes();
            let n = 8 - (magnitude.leading_zeros() as usize / 8);
            self.buf.put_u8(tag::SMALL_BIG_EXT);
            self.buf.put_u8(n as u8);
            self.buf.put_u8(u8::from(value < 0));
            self.buf.put_slice(&digits[..n]);
        }
        Ok(())
    }

    /// Encode any term, recursing into tuples.
    pub fn encode_term(&mut self, term: &Term) -> Result<()> {
        match term {
            Term::Atom(name) => self.encode_atom(name),
            Term::Binary(bytes) => self.encode_binary(bytes),
            Term::Integer(value) => self.encode_integer(*value),
            Term::Tuple(elements) => {
                self.encode_tuple_header(elements.len())?;
                elements.iter().try_for_each(|e| self.encode_term(e))
            }
        }
    }

    /// Return the encoded buffer if exactly one complete term was written.
    pub fn finish(self) -> Result<Bytes> {
        if let Some(&missing) = self.open.last() {
            return Err(EncodeError::IncompleteTuple { missing });
        }
        if !self.root_done {
            return Err(EncodeError::Empty);
        }
        Ok(self.buf.freeze())
    }

    // Accounts for one value about to be written.
    fn begin_value(&mut self) -> Result<()> {
        if self.root_done && self.open.is_empty() {
            return Err(EncodeError::TrailingValue);
        }
        self.root_done = true;
        // Only the innermost tuple is charged: a nested tuple was already
        // counted against its parent when its header was written.
        if let Some(remaining) = self.open.last_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.open.pop();
            }
        }
        Ok(())
    }
}
