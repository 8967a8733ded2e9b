//! # Frame Stream
//!
//! Callback-driven frame reader over any `AsyncRead` byte source.
//!
//! # Architecture
//!
//! One task runs one sequential pull loop:
//! 1. Read the next chunk from the source into the reassembly buffer
//! 2. Split off every complete frame and hand each to `on_frame`, in order
//! 3. Repeat until the source ends, a framing error occurs, or `stop()` is called
//!
//! # Callbacks
//!
//! - `on_frame` fires once per complete frame
//! - `on_end` fires when the source reaches end-of-file
//! - `on_error` fires once on a fatal error (frame too large, I/O failure)
//!
//! At most one of `on_end`/`on_error` fires. After `stop()` none of the
//! callbacks fire again, and a pending source read is abandoned.
//!
//! # Example
//!
//! ```rust,no_run
//! use fxlist_network::{FrameStream, StreamOptions};
//!
//! # async fn example(socket: tokio::net::TcpStream) {
//! let stream = FrameStream::new(
//!     socket,
//!     &StreamOptions::default(),
//!     |frame| println!("frame of {} bytes", frame.declared_len()),
//!     || println!("stream ended"),
//! )
//! .on_error(|e| eprintln!("stream failed: {}", e));
//!
//! let handle = stream.start();
//! // ...
//! handle.stop();
//! # }
//! ```

use crate::config::StreamOptions;
use futures::StreamExt;
use fxlist_core::{FxListError, Result};
use fxlist_protocol::{Frame, FrameDecoder, FrameReader};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

pub type FrameCallback = Box<dyn FnMut(Frame) + Send>;
pub type EndCallback = Box<dyn FnOnce() + Send>;
pub type ErrorCallback = Box<dyn FnOnce(&FxListError) + Send>;

/// Cloneable handle that stops a [`FrameStream`]
///
/// Safe to call from inside `on_frame`: no further frame is delivered once
/// the callback returns.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// How a frame stream finished
#[derive(Debug)]
pub enum StreamExit {
    /// The source reached end-of-file; `on_end` fired
    Ended,

    /// `stop()` was called; holds the bytes and frames not yet delivered
    Stopped(FrameReader),

    /// A fatal error ended the stream; `on_error` fired
    Failed(FxListError),
}

enum Next {
    Stopped,
    Item(Option<Result<Frame>>),
}

/// Frame reader bound to a byte source and its callbacks
pub struct FrameStream<R> {
    framed: FramedRead<R, FrameDecoder>,
    on_frame: FrameCallback,
    on_end: Option<EndCallback>,
    on_error: Option<ErrorCallback>,
    stop: StopHandle,
    frames: u64,
}

impl<R> FrameStream<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a frame stream
    ///
    /// # Arguments
    /// * `source` - Byte source (socket, file, stdin, ...)
    /// * `options` - Frame ceiling and read chunk size
    /// * `on_frame` - Called once per complete frame
    /// * `on_end` - Called when the source ends
    pub fn new<F, E>(source: R, options: &StreamOptions, on_frame: F, on_end: E) -> Self
    where
        F: FnMut(Frame) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let decoder = FrameDecoder::with_max_frame_size(options.max_frame_size);

        Self {
            framed: FramedRead::with_capacity(source, decoder, options.read_chunk_size),
            on_frame: Box::new(on_frame),
            on_end: Some(Box::new(on_end)),
            on_error: None,
            stop: StopHandle::default(),
            frames: 0,
        }
    }

    /// Set the callback for fatal stream errors
    ///
    /// Without one, fatal errors are only logged.
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: FnOnce(&FxListError) + Send + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Spawn the read loop on the tokio runtime
    pub fn start(self) -> FrameStreamHandle
    where
        R: Send + 'static,
    {
        let stop = self.stop.clone();
        let task = tokio::spawn(self.run());
        FrameStreamHandle { stop, task }
    }

    /// Run the read loop on the current task until the stream finishes
    pub async fn run(mut self) -> StreamExit {
        let token = self.stop.token.clone();
        debug!("Frame stream started");

        loop {
            // Stop wins over a ready frame so nothing is delivered after stop()
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => Next::Stopped,
                item = self.framed.next() => Next::Item(item),
            };

            match next {
                Next::Stopped => {
                    let pending = self.into_pending();
                    debug!(
                        "Frame stream stopped after {} frames ({} bytes still buffered)",
                        self.frames,
                        pending.buffered()
                    );
                    return StreamExit::Stopped(pending);
                }
                Next::Item(Some(Ok(frame))) => {
                    self.frames += 1;
                    trace!("Frame {}: {} bytes", self.frames, frame.declared_len());
                    (self.on_frame)(frame);
                }
                Next::Item(Some(Err(e))) => {
                    error!("Frame stream failed after {} frames: {}", self.frames, e);
                    if let Some(on_error) = self.on_error.take() {
                        on_error(&e);
                    }
                    return StreamExit::Failed(e);
                }
                Next::Item(None) => {
                    info!("Frame stream ended after {} frames", self.frames);
                    if let Some(on_end) = self.on_end.take() {
                        on_end();
                    }
                    return StreamExit::Ended;
                }
            }
        }
    }

    fn into_pending(&mut self) -> FrameReader {
        let buffer = self.framed.read_buffer_mut().split();
        let decoder = std::mem::take(self.framed.decoder_mut());
        FrameReader::from_parts(decoder, buffer)
    }
}

/// Handle to a spawned [`FrameStream`]
pub struct FrameStreamHandle {
    stop: StopHandle,
    task: JoinHandle<StreamExit>,
}

impl FrameStreamHandle {
    /// Stop the stream, abandoning any pending read
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the read loop to finish
    pub async fn join(self) -> Result<StreamExit> {
        self.task.await.map_err(|e| {
            FxListError::StreamFailure(std::io::Error::new(std::io::ErrorKind::Other, e))
        })
    }
}
