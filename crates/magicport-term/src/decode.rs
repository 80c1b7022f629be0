use crate::error::DecodeError;
use crate::tag::{self, tag_name, VERSION};
use crate::term::{Term, MAX_ATOM_CHARS};

/// Maximum tuple nesting accepted by [`Decoder::decode_term`].
pub const MAX_DEPTH: usize = 64;

type Result<T> = std::result::Result<T, DecodeError>;

/// Decode a complete versioned buffer into a single term.
///
/// Bytes after the first term are ignored.
pub fn decode(buf: &[u8]) -> Result<Term> {
    let mut decoder = Decoder::versioned(buf)?;
    decoder.decode_term()
}

/// Validating cursor over an encoded buffer.
///
/// Each `decode_*` method checks the tag and every declared length against
/// the remaining input before consuming anything, so a failed call leaves
/// the cursor where it was.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Start decoding a buffer that begins with the version marker.
    pub fn versioned(buf: &'a [u8]) -> Result<Self> {
        match buf.first() {
            None => Err(DecodeError::MissingVersion),
            Some(&VERSION) => Ok(Self { buf, pos: 1 }),
            Some(&found) => Err(DecodeError::VersionMismatch {
                expected: VERSION,
                found,
            }),
        }
    }

    /// Current offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Look at the next tag byte without consuming it.
    pub fn peek_tag(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::Truncated {
                offset: self.pos,
                needed: 1,
            })
    }

    /// Decode a tuple header and return its arity.
    pub fn decode_tuple_header(&mut self) -> Result<usize> {
        let tag = self.expect(tag::is_tuple, "tuple")?;
        let (arity, header) = match tag {
            tag::SMALL_TUPLE_EXT => (self.read_u8(self.pos + 1)? as usize, 2),
            _ => (self.read_u32(self.pos + 1)? as usize, 5),
        };
        self.pos += header;
        Ok(arity)
    }

    /// Decode an atom in any of its four encodings.
    pub fn decode_atom(&mut self) -> Result<String> {
        let tag = self.expect(tag::is_atom, "atom")?;
        let (len, header) = match tag {
            tag::SMALL_ATOM_EXT | tag::SMALL_ATOM_UTF8_EXT => {
                (self.read_u8(self.pos + 1)? as usize, 2)
            }
            _ => (self.read_u16(self.pos + 1)? as usize, 3),
        };
        let bytes = self.slice(self.pos + header, len)?;

        let name = match tag {
            tag::ATOM_UTF8_EXT | tag::SMALL_ATOM_UTF8_EXT => std::str::from_utf8(bytes)
                .map_err(|_| DecodeError::InvalidAtom)?
                .to_owned(),
            _ => bytes.iter().map(|&b| b as char).collect(),
        };

        let chars = name.chars().count();
        if chars > MAX_ATOM_CHARS {
            return Err(DecodeError::AtomTooLong {
                chars,
                max: MAX_ATOM_CHARS,
            });
        }

        self.pos += header + len;
        Ok(name)
    }

    /// Decode a binary, borrowing its contents from the input.
    pub fn decode_binary(&mut self) -> Result<&'a [u8]> {
        self.expect(|t| t == tag::BINARY_EXT, "binary")?;
        let len = self.read_u32(self.pos + 1)? as usize;
        let bytes = self.slice(self.pos + 5, len)?;
        self.pos += 5 + len;
        Ok(bytes)
    }

    /// Decode an integer that fits in an `i64`.
    pub fn decode_integer(&mut self) -> Result<i64> {
        let tag = self.expect(tag::is_integer, "integer")?;
        match tag {
            tag::SMALL_INTEGER_EXT => {
                let value = self.read_u8(self.pos + 1)?;
                self.pos += 2;
                Ok(i64::from(value))
            }
            tag::INTEGER_EXT => {
                let value = self.read_u32(self.pos + 1)? as i32;
                self.pos += 5;
                Ok(i64::from(value))
            }
            _ => {
                let n = self.read_u8(self.pos + 1)? as usize;
                let sign = self.read_u8(self.pos + 2)?;
                let digits = self.slice(self.pos + 3, n)?;
                let value = big_to_i64(sign, digits)?;
                self.pos += 3 + n;
                Ok(value)
            }
        }
    }

    /// Decode any supported term.
    pub fn decode_term(&mut self) -> Result<Term> {
        self.decode_nested(0)
    }

    fn decode_nested(&mut self, depth: usize) -> Result<Term> {
        let tag = self.peek_tag()?;
        if tag::is_atom(tag) {
            return self.decode_atom().map(Term::Atom);
        }
        if tag::is_integer(tag) {
            return self.decode_integer().map(Term::Integer);
        }
        if tag == tag::BINARY_EXT {
            return self.decode_binary().map(|b| Term::Binary(b.to_vec()));
        }
        if tag::is_tuple(tag) {
            if depth >= MAX_DEPTH {
                return Err(DecodeError::TooDeep(MAX_DEPTH));
            }
            let start = self.pos;
            let arity = self.decode_tuple_header()?;
            let mut elements = Vec::with_capacity(arity.min(self.remaining().len()));
            for _ in 0..arity {
                match self.decode_nested(depth + 1) {
                    Ok(element) => elements.push(element),
                    Err(err) => {
                        self.pos = start;
                        return Err(err);
                    }
                }
            }
            return Ok(Term::Tuple(elements));
        }
        Err(DecodeError::UnknownTag {
            tag,
            offset: self.pos,
        })
    }

    fn expect(&self, accepts: impl Fn(u8) -> bool, expected: &'static str) -> Result<u8> {
        let tag = self.peek_tag()?;
        if accepts(tag) {
            return Ok(tag);
        }
        let found = tag_name(tag);
        if found == "unsupported" {
            return Err(DecodeError::UnknownTag {
                tag,
                offset: self.pos,
            });
        }
        Err(DecodeError::UnexpectedTag {
            expected,
            found,
            offset: self.pos,
        })
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let available = self.buf.len().saturating_sub(offset);
        if len > available {
            return Err(DecodeError::Truncated {
                offset,
                needed: len - available,
            });
        }
        Ok(&self.buf[offset..offset + len])
    }

    fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    fn read_u16(&self, offset: usize) -> Result<u16> {
        let bytes = self.slice(offset, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

fn big_to_i64(sign: u8, digits: &[u8]) -> Result<i64> {
    let significant = digits
        .iter()
        .rposition(|&d| d != 0)
        .map_or(0, |last| last + 1);
    if significant > 8 {
        return Err(DecodeError::IntegerOverflow);
    }

    let magnitude = digits[..significant]
        .iter()
        .rev()
        .fold(0u64, |acc, &d| (acc << 8) | u64::from(d));

    if sign == 0 {
        i64::try_from(magnitude).map_err(|_| DecodeError::IntegerOverflow)
    } else {
        0i64.checked_sub_unsigned(magnitude)
            .ok_or(DecodeError::IntegerOverflow)
    }
}
