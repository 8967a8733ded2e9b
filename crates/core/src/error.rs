//! Core error types for fxlist

#[derive(thiserror::Error, Debug)]
pub enum FxListError {
    /// Input ended before a varint, length-prefixed span or frame body was complete
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Unknown wire type: {wire_type}")]
    UnknownWireType { wire_type: u8 },

    #[error("Frame too large: {length} bytes (limit {limit})")]
    FrameTooLarge { length: u32, limit: u32 },

    #[error("Stream failure: {0}")]
    StreamFailure(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stream is already running")]
    AlreadyRunning,
}

impl FxListError {
    /// Whether the error ends the whole stream rather than a single frame
    ///
    /// Decode errors (`TruncatedInput`, `UnknownWireType`) only invalidate the
    /// frame being decoded. Framing and I/O errors leave the stream desynchronized.
    pub fn is_fatal(&self) -> bool {
        match self {
            FxListError::TruncatedInput { .. } | FxListError::UnknownWireType { .. } => false,
            FxListError::FrameTooLarge { .. }
            | FxListError::StreamFailure(_)
            | FxListError::Config(_)
            | FxListError::AlreadyRunning => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, FxListError>;
