use magicport_frame::FrameError;
use magicport_magic::{LibraryError, RegistryError};
use magicport_term::{DecodeError, EncodeError};

// Process exit codes understood by the parent.
pub const SUCCESS: i32 = 0;
pub const MAGIC_OPEN_FAILED: i32 = 1;
pub const CODEC_FAILED: i32 = 2;
pub const BAD_TERM: i32 = 3;
pub const LOOP_EXITED: i32 = 255;

/// A condition that ends the port.
#[derive(Debug, thiserror::Error)]
pub enum Fatal {
    /// The engine library could not be loaded.
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// One of the classifier views could not be opened.
    #[error(transparent)]
    ViewOpen(RegistryError),

    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] EncodeError),

    /// An encoded response does not fit in one frame.
    #[error("response of {size} bytes does not fit in a frame")]
    ResponseTooLarge { size: usize },

    /// The command frame is not a versioned term.
    #[error("bad command term: {0}")]
    BadTerm(DecodeError),

    /// The command header could not be read.
    #[error("unreadable command header: {0}")]
    Unreadable(std::io::Error),

    /// The input stream ended.
    #[error("input closed")]
    InputClosed,

    /// A response could not be written.
    #[error("failed to write response: {0}")]
    Write(FrameError),
}

impl Fatal {
    /// Exit code reported to the parent.
    pub fn code(&self) -> i32 {
        match self {
            Fatal::Library(_) | Fatal::ViewOpen(_) => MAGIC_OPEN_FAILED,
            Fatal::Encode(_) | Fatal::ResponseTooLarge { .. } => CODEC_FAILED,
            Fatal::BadTerm(_) | Fatal::Unreadable(_) => BAD_TERM,
            Fatal::InputClosed | Fatal::Write(_) => LOOP_EXITED,
        }
    }
}

/// How a port's loop ended.
#[derive(Debug)]
pub enum Shutdown {
    /// A `stop` command was handled.
    Stopped,
    Fatal(Fatal),
}

impl Shutdown {
    pub fn exit_code(&self) -> i32 {
        match self {
            Shutdown::Stopped => SUCCESS,
            Shutdown::Fatal(fatal) => fatal.code(),
        }
    }
}

pub fn read_failure(err: FrameError) -> Fatal {
    match err {
        FrameError::ConnectionClosed => Fatal::InputClosed,
        FrameError::Io(source) => Fatal::Unreadable(source),
        other @ FrameError::PayloadTooLarge { .. } => {
            Fatal::Unreadable(std::io::Error::new(std::io::ErrorKind::InvalidData, other))
        }
    }
}

pub fn write_failure(err: FrameError) -> Fatal {
    match err {
        FrameError::PayloadTooLarge { size, .. } => Fatal::ResponseTooLarge { size },
        other => Fatal::Write(other),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use magicport_magic::{EngineError, ViewKind};

    use super::*;

    #[test]
    fn fatal_classes_map_to_exit_codes() {
        let open = RegistryError::Open {
            view: ViewKind::MimeType,
            source: EngineError::new(12, "out of memory"),
        };
        assert_eq!(Fatal::ViewOpen(open).code(), MAGIC_OPEN_FAILED);
        assert_eq!(Fatal::Library(LibraryError::Unsupported).code(), MAGIC_OPEN_FAILED);
        assert_eq!(Fatal::Encode(EncodeError::Empty).code(), CODEC_FAILED);
        assert_eq!(
            Fatal::BadTerm(DecodeError::MissingVersion).code(),
            BAD_TERM
        );
        assert_eq!(Fatal::InputClosed.code(), LOOP_EXITED);
    }

    #[test]
    fn read_failures_split_eof_from_io() {
        assert!(matches!(
            read_failure(FrameError::ConnectionClosed),
            Fatal::InputClosed
        ));
        let err = read_failure(FrameError::Io(io::Error::from(io::ErrorKind::Other)));
        assert_eq!(err.code(), BAD_TERM);
    }

    #[test]
    fn write_failures_end_the_loop() {
        let err = write_failure(FrameError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert_eq!(err.code(), LOOP_EXITED);
        let err = write_failure(FrameError::PayloadTooLarge {
            size: 70_000,
            max: 65_535,
        });
        assert_eq!(err.code(), CODEC_FAILED);
    }

    #[test]
    fn stop_exits_cleanly() {
        assert_eq!(Shutdown::Stopped.exit_code(), SUCCESS);
        assert_eq!(Shutdown::Fatal(Fatal::InputClosed).exit_code(), LOOP_EXITED);
    }
}
