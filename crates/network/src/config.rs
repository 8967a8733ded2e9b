//! # Stream Options
//!
//! Runtime options for reading the server-list stream.
//!
//! # Example
//!
//! ```rust
//! use fxlist_network::StreamOptions;
//!
//! let options = StreamOptions {
//!     max_servers: Some(500),
//!     read_chunk_size: 64 * 1024,
//!     ..Default::default()
//! };
//! assert!(options.validate().is_ok());
//! ```

use fxlist_core::{FxListError, Result};
use fxlist_protocol::DEFAULT_MAX_FRAME_SIZE;

/// Stream options
///
/// # Purpose
/// Defines the limits applied while reading one stream.
///
/// # Default Values
///
/// - No server cap
/// - 10 MiB frame ceiling
/// - 16 KiB read chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// Stop after this many complete servers have been delivered
    ///
    /// # Default
    /// `None` (read until the source ends)
    ///
    /// # Notes
    /// - Only records with both an endpoint and data count toward the cap
    /// - Frames already buffered when the cap is hit are not decoded
    pub max_servers: Option<usize>,

    /// Largest declared frame length accepted before the stream is failed
    ///
    /// # Purpose
    /// Bounds the reassembly buffer against a corrupt or hostile length prefix
    ///
    /// # Default
    /// 10 MiB
    pub max_frame_size: u32,

    /// Capacity of each read from the source
    ///
    /// # Default
    /// 16384 bytes
    ///
    /// # Notes
    /// - Frames are split out of whatever the source returns, so this only
    ///   affects syscall count and peak buffer size
    pub read_chunk_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            max_servers: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_chunk_size: 16 * 1024,
        }
    }
}

impl StreamOptions {
    /// Validate the options
    ///
    /// # Checks
    /// - `max_frame_size` must be > 0
    /// - `read_chunk_size` must be > 0
    /// - `max_servers`, when set, must be > 0
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_size == 0 {
            return Err(FxListError::Config("max_frame_size must be > 0".to_string()));
        }

        if self.read_chunk_size == 0 {
            return Err(FxListError::Config("read_chunk_size must be > 0".to_string()));
        }

        if self.max_servers == Some(0) {
            return Err(FxListError::Config("max_servers must be > 0 when set".to_string()));
        }

        if self.read_chunk_size > self.max_frame_size as usize {
            tracing::warn!("read_chunk_size is larger than max_frame_size, reads will over-allocate");
        }

        Ok(())
    }
}
