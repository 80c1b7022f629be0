//! Inbound command envelopes and their arguments.

use std::path::PathBuf;

use magicport_term::{tag, Decoder};

use crate::response::Rejection;

/// The closed set of commands the port understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    File,
    Bytes,
    AddDatabase,
    Reload,
    Stop,
}

const OPERATIONS: [(&str, Operation); 5] = [
    ("file", Operation::File),
    ("bytes", Operation::Bytes),
    ("add_database", Operation::AddDatabase),
    ("reload", Operation::Reload),
    ("stop", Operation::Stop),
];

impl Operation {
    /// Resolve an operation atom.
    pub fn from_atom(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|(atom, _)| *atom == name)
            .map(|(_, operation)| *operation)
    }

    pub fn name(self) -> &'static str {
        OPERATIONS
            .iter()
            .find(|(_, operation)| *operation == self)
            .map_or("unknown", |(atom, _)| atom)
    }
}

/// A parsed `{Operation, Argument}` pair.
///
/// The argument is left undecoded; each handler reads the shape it expects.
#[derive(Debug)]
pub struct Envelope<'a> {
    pub operation: Operation,
    pub argument: Decoder<'a>,
}

impl<'a> Envelope<'a> {
    /// Parse the envelope from a decoder positioned after the version byte.
    pub fn parse(mut decoder: Decoder<'a>) -> Result<Self, Rejection> {
        let arity = decoder.decode_tuple_header().map_err(|err| {
            tracing::debug!(error = %err, "command is not a tuple");
            Rejection::BadArg
        })?;
        if arity != 2 {
            tracing::debug!(arity, "command tuple has wrong arity");
            return Err(Rejection::BadArg);
        }

        let name = decoder.decode_atom().map_err(|err| {
            tracing::debug!(error = %err, "operation is not an atom");
            Rejection::BadArg
        })?;
        let operation = Operation::from_atom(&name).ok_or_else(|| {
            tracing::debug!(operation = %name, "unknown operation");
            Rejection::BadArg
        })?;

        Ok(Self {
            operation,
            argument: decoder,
        })
    }
}

/// Which rules database `add_database` should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    Default,
    Path(PathBuf),
}

/// Read a binary argument no longer than `max` bytes.
pub fn binary_argument<'a>(
    argument: &mut Decoder<'a>,
    max: usize,
    too_long: Rejection,
) -> Result<&'a [u8], Rejection> {
    let bytes = argument.decode_binary().map_err(|_| Rejection::BadArg)?;
    if bytes.len() > max {
        return Err(too_long);
    }
    Ok(bytes)
}

/// Read a path argument.
pub fn path_argument(argument: &mut Decoder<'_>, max: usize) -> Result<PathBuf, Rejection> {
    let bytes = binary_argument(argument, max, Rejection::NameTooLong)?;
    bytes_to_path(bytes)
}

/// Read the `add_database` argument: a path binary or the atom `default`.
pub fn database_argument(argument: &mut Decoder<'_>, max: usize) -> Result<Database, Rejection> {
    match argument.peek_tag() {
        Ok(tag::BINARY_EXT) => path_argument(argument, max).map(Database::Path),
        Ok(found) if tag::is_atom(found) => match argument.decode_atom() {
            Ok(name) if name == "default" => Ok(Database::Default),
            _ => Err(Rejection::BadArg),
        },
        _ => Err(Rejection::BadArg),
    }
}

fn bytes_to_path(bytes: &[u8]) -> Result<PathBuf, Rejection> {
    if bytes.contains(&0) {
        return Err(Rejection::BadArg);
    }

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
    }

    #[cfg(not(unix))]
    {
        std::str::from_utf8(bytes)
            .map(PathBuf::from)
            .map_err(|_| Rejection::BadArg)
    }
}
