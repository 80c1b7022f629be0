//! Replies written back to the parent.

use bytes::Bytes;
use magicport_magic::{EngineError, Labels};
use magicport_term::{EncodeError, Encoder};

const OK: &str = "ok";
const ERROR: &str = "error";

/// Reasons a command is refused without reaching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed envelope, unknown operation, or wrongly typed argument.
    BadArg,
    /// Path longer than the configured maximum.
    NameTooLong,
    /// Byte payload longer than the configured maximum.
    TooLong,
    /// Classification requested before a database was loaded.
    DatabaseNotLoaded,
}

impl Rejection {
    pub fn atom(self) -> &'static str {
        match self {
            Rejection::BadArg => "badarg",
            Rejection::NameTooLong => "enametoolong",
            Rejection::TooLong => "toolong",
            Rejection::DatabaseNotLoaded => "magic_database_not_loaded",
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `ready`, sent after the views are (re)opened.
    Ready,
    /// `{ok, {MimeType, MimeEncoding, TypeName}}`.
    Classified(Labels),
    /// `{error, {Code, Message}}`.
    ClassifyFailed(EngineError),
    /// `{ok, loaded}`.
    Loaded,
    /// `{error, not_loaded}`.
    NotLoaded,
    /// `{error, Reason}`.
    Rejected(Rejection),
}

impl Response {
    /// Encode as a versioned term.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut encoder = Encoder::new();
        match self {
            Response::Ready => encoder.encode_atom("ready")?,
            Response::Classified(labels) => {
                encoder.encode_tuple_header(2)?;
                encoder.encode_atom(OK)?;
                encoder.encode_tuple_header(3)?;
                encoder.encode_binary(labels.mime_type.as_bytes())?;
                encoder.encode_binary(labels.mime_encoding.as_bytes())?;
                encoder.encode_binary(labels.type_name.as_bytes())?;
            }
            Response::ClassifyFailed(err) => {
                encoder.encode_tuple_header(2)?;
                encoder.encode_atom(ERROR)?;
                encoder.encode_tuple_header(2)?;
                encoder.encode_integer(err.code)?;
                encoder.encode_binary(err.message.as_bytes())?;
            }
            Response::Loaded => status(&mut encoder, OK, "loaded")?,
            Response::NotLoaded => status(&mut encoder, ERROR, "not_loaded")?,
            Response::Rejected(reason) => status(&mut encoder, ERROR, reason.atom())?,
        }
        encoder.finish()
    }
}

fn status(encoder: &mut Encoder, status: &str, reason: &str) -> Result<(), EncodeError> {
    encoder.encode_tuple_header(2)?;
    encoder.encode_atom(status)?;
    encoder.encode_atom(reason)
}
