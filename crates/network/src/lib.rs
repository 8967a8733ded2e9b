//! # fxlist Networking Layer
//!
//! This crate drives the frame reader from an async byte source and turns
//! frames into decoded servers.
//!
//! ## Modules
//!
//! - [`config`] - Stream options (record cap, frame ceiling, chunk size)
//! - [`frame_stream`] - Callback-driven frame reader over an `AsyncRead`
//! - [`client`] - Server stream client: decoding, cap and collection
//! - [`source`] - Opening stdin, file and TCP byte sources

pub mod config;
pub mod frame_stream;
pub mod client;
pub mod source;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use config::StreamOptions;
pub use frame_stream::{FrameStream, FrameStreamHandle, StopHandle, StreamExit};
pub use client::{ServerHandlers, ServerStream};
pub use source::{open_source, BoxedSource, SourceSpec};
