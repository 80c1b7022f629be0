//! Length-prefixed message framing for the port's byte streams.
//!
//! Every message in either direction is framed as:
//! - A 2-byte big-endian payload length
//! - The payload itself
//!
//! Inbound frames larger than the configured maximum are drained from the
//! stream and reported as [`Inbound::Oversized`], so the stream stays aligned
//! on the next frame boundary.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, encode_frame, FrameConfig, DEFAULT_MAX_COMMAND, HEADER_SIZE, MAX_FRAME_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, Inbound};
pub use writer::FrameWriter;
