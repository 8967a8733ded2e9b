//! # fxlist Protocol Library
//!
//! Decoding of the server-list stream: an endless sequence of length-prefixed
//! frames, each carrying one protobuf-style encoded [`ServerInfo`] record.
//!
//! ## Architecture
//!
//! The protocol is organized into several layers:
//!
//! ### 1. Varint Codec ([`varint`])
//! Base-128 variable-length integers, 32-bit (wrapping) and 64-bit.
//!
//! ### 2. Wire Reader ([`wire`])
//! A bounds-checked cursor over one message: tags, varints, length-delimited
//! spans, lossy UTF-8 strings and skipping of unknown fields.
//!
//! ### 3. Records ([`records`])
//! The fixed schema for `Player`, `ServerData` and `ServerInfo`.
//!
//! ### 4. Encoding ([`encode`])
//! Canonical encoders for the same records, used for fixtures and tests.
//!
//! ### 5. Framing ([`frame`])
//! Incremental reassembly of `[u32 LE length][payload]` frames from chunks
//! of any size. Usable directly or as a `tokio_util` codec.
//!
//! ## Outer Wire Layout
//!
//! ```text
//! +----------------+---------------------+----------------+-----
//! | len (u32 LE)   | payload (len bytes) | len (u32 LE)   | ...
//! +----------------+---------------------+----------------+-----
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use fxlist_protocol::{decode_player, FrameReader};
//!
//! let mut reader = FrameReader::new();
//! let mut players = Vec::new();
//! reader
//!     .push(&[0x02, 0x00, 0x00, 0x00, 0x28, 0x05], |frame| {
//!         players.push(decode_player(frame.payload()));
//!         std::ops::ControlFlow::Continue(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(players[0].as_ref().unwrap().id, Some(5));
//! ```
//!
//! [`ServerInfo`]: fxlist_core::ServerInfo

pub mod varint;
pub mod wire;
pub mod records;
pub mod encode;
pub mod frame;

// Re-export commonly used items
pub use varint::*;
pub use wire::*;
pub use records::*;
pub use encode::*;
pub use frame::*;
