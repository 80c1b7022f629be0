use magicport_frame::FrameConfig;

/// Longest path accepted by `file` and `add_database`.
pub const MAX_PATH_LEN: usize = 4096;

/// Largest buffer accepted by `bytes`.
pub const MAX_BYTES_LEN: usize = 50;

/// Protocol limits for a [`Port`](crate::Port).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// Inbound frame limit; larger frames are drained and rejected.
    pub frame: FrameConfig,
    pub max_path_len: usize,
    pub max_bytes_len: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            max_path_len: MAX_PATH_LEN,
            max_bytes_len: MAX_BYTES_LEN,
        }
    }
}
