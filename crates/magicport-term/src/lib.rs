//! Versioned tagged-term codec.
//!
//! Implements the subset of the Erlang external term format exchanged with
//! the parent process. Every encoded buffer starts with a version byte
//! ([`VERSION`]) followed by exactly one term:
//! - atoms (symbols, at most [`MAX_ATOM_CHARS`] characters)
//! - tuples of any arity
//! - binaries
//! - signed integers
//!
//! Decoding is a validating cursor ([`Decoder`]); encoding is append-only
//! and tracks tuple arity so an incomplete value can never be emitted.

pub mod decode;
pub mod encode;
pub mod error;
pub mod tag;
pub mod term;

pub use decode::{decode, Decoder, MAX_DEPTH};
pub use encode::{encode, Encoder};
pub use error::{DecodeError, EncodeError};
pub use tag::VERSION;
pub use term::{Term, MAX_ATOM_CHARS};
