use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: a 2-byte big-endian payload length.
pub const HEADER_SIZE: usize = 2;

/// Largest payload the length prefix can describe.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

/// Default maximum inbound command payload.
///
/// Kept well above the largest valid command (a 4096-byte path plus term
/// overhead) so over-long paths still decode and get a precise error.
pub const DEFAULT_MAX_COMMAND: usize = 7999;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────────┐
/// │ Length       │ Payload         │
/// │ (2B BE)      │ (Length bytes)  │
/// └──────────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_FRAME_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode the payload length from a frame header.
pub fn decode_header(header: [u8; HEADER_SIZE]) -> usize {
    u16::from_be_bytes(header) as usize
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum inbound payload size in bytes. Default: 7999.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_COMMAND,
        }
    }
}
