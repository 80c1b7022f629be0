//! Wire tags.

/// Format version marker, first byte of every encoded buffer.
pub const VERSION: u8 = 131;

pub const SMALL_INTEGER_EXT: u8 = 97;
pub const INTEGER_EXT: u8 = 98;
pub const ATOM_EXT: u8 = 100;
pub const SMALL_TUPLE_EXT: u8 = 104;
pub const LARGE_TUPLE_EXT: u8 = 105;
pub const BINARY_EXT: u8 = 109;
pub const SMALL_BIG_EXT: u8 = 110;
pub const SMALL_ATOM_EXT: u8 = 115;
pub const ATOM_UTF8_EXT: u8 = 118;
pub const SMALL_ATOM_UTF8_EXT: u8 = 119;

/// Returns true for any of the four atom encodings.
pub fn is_atom(tag: u8) -> bool {
    matches!(
        tag,
        ATOM_EXT | SMALL_ATOM_EXT | ATOM_UTF8_EXT | SMALL_ATOM_UTF8_EXT
    )
}

/// Returns true for either tuple encoding.
pub fn is_tuple(tag: u8) -> bool {
    matches!(tag, SMALL_TUPLE_EXT | LARGE_TUPLE_EXT)
}

/// Returns true for any of the integer encodings.
pub fn is_integer(tag: u8) -> bool {
    matches!(tag, SMALL_INTEGER_EXT | INTEGER_EXT | SMALL_BIG_EXT)
}

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        SMALL_INTEGER_EXT | INTEGER_EXT | SMALL_BIG_EXT => "integer",
        ATOM_EXT | SMALL_ATOM_EXT | ATOM_UTF8_EXT | SMALL_ATOM_UTF8_EXT => "atom",
        SMALL_TUPLE_EXT | LARGE_TUPLE_EXT => "tuple",
        BINARY_EXT => "binary",
        _ => "unsupported",
    }
}
