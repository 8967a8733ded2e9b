//! # Server Stream Client
//!
//! Decodes each frame of the server-list stream into a [`ServerInfo`] and
//! hands complete servers to the registered handlers.
//!
//! # Behavior
//!
//! - Records missing either the endpoint or the data are dropped silently
//! - A frame that fails to decode is reported through `on_error` and the
//!   stream keeps going
//! - Framing and I/O errors end the stream and are reported once
//! - With `max_servers` set, the stream stops as soon as the cap is reached
//!   and `on_end` fires
//!
//! # Example
//!
//! ```rust,no_run
//! use fxlist_network::{open_source, ServerHandlers, ServerStream, StreamOptions};
//!
//! # async fn example() -> fxlist_core::Result<()> {
//! let handlers = ServerHandlers::new()
//!     .on_server(|server| println!("{:?}", server.endpoint))
//!     .on_error(|e| eprintln!("bad frame: {}", e));
//!
//! let stream = ServerStream::new(StreamOptions { max_servers: Some(100), ..Default::default() }, handlers);
//! let servers = stream.collect_all(open_source("servers.bin").await?).await?;
//! println!("collected {} servers", servers.len());
//! # Ok(())
//! # }
//! ```

use crate::config::StreamOptions;
use crate::frame_stream::{FrameStream, FrameStreamHandle, StopHandle, StreamExit};
use fxlist_core::{FxListError, Result, ServerInfo};
use fxlist_protocol::{decode_server_info, Frame};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

type ServerCallback = Box<dyn FnMut(&ServerInfo) + Send>;
type ErrorCallback = Box<dyn FnMut(&FxListError) + Send>;
type EndCallback = Box<dyn FnMut() + Send>;

/// Consumer callbacks, all optional
#[derive(Default)]
pub struct ServerHandlers {
    on_server: Option<ServerCallback>,
    on_error: Option<ErrorCallback>,
    on_end: Option<EndCallback>,
}

impl ServerHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every complete server, in stream order
    pub fn on_server<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ServerInfo) + Send + 'static,
    {
        self.on_server = Some(Box::new(f));
        self
    }

    /// Called for per-frame decode errors and for the fatal error ending a stream
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(&FxListError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called when the source ends or the server cap is reached
    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_end = Some(Box::new(f));
        self
    }
}

#[derive(Default)]
struct StreamState {
    running: bool,
    processed: usize,
    servers: Vec<ServerInfo>,
    stop: Option<StopHandle>,
}

struct Shared {
    state: Mutex<StreamState>,
    handlers: Mutex<ServerHandlers>,
}

/// Server-list stream client
///
/// Cheap to clone; clones share the same state, so a handler can hold a clone
/// and call [`stop`](ServerStream::stop).
#[derive(Clone)]
pub struct ServerStream {
    options: StreamOptions,
    shared: Arc<Shared>,
}

impl ServerStream {
    pub fn new(options: StreamOptions, handlers: ServerHandlers) -> Self {
        Self {
            options,
            shared: Arc::new(Shared {
                state: Mutex::new(StreamState::default()),
                handlers: Mutex::new(handlers),
            }),
        }
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Start reading servers from `source`
    ///
    /// # Errors
    /// - `AlreadyRunning` if a stream is active
    /// - `Config` if the options are invalid
    pub fn start<R>(&self, source: R) -> Result<FrameStreamHandle>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.options.validate()?;

        let mut state = self.shared.state.lock();
        if state.running {
            return Err(FxListError::AlreadyRunning);
        }

        let on_frame = {
            let client = self.clone();
            move |frame: Frame| client.handle_frame(frame)
        };
        let on_end = {
            let client = self.clone();
            move || client.handle_end()
        };
        let on_error = {
            let client = self.clone();
            move |e: &FxListError| client.handle_error(e)
        };

        let stream = FrameStream::new(source, &self.options, on_frame, on_end).on_error(on_error);

        state.running = true;
        state.processed = 0;
        state.servers.clear();
        state.stop = Some(stream.stop_handle());
        drop(state);

        info!(
            "Server stream started (cap: {})",
            self.options.max_servers.map_or_else(|| "none".to_string(), |n| n.to_string())
        );
        Ok(stream.start())
    }

    /// Stop the active stream; no further handlers fire
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.running = false;
        if let Some(stop) = state.stop.take() {
            stop.stop();
            debug!("Server stream stopped after {} servers", state.processed);
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Number of complete servers delivered by the current or last stream
    pub fn processed_count(&self) -> usize {
        self.shared.state.lock().processed
    }

    /// Servers delivered so far by the current or last stream
    ///
    /// Empty once [`collect_all`](ServerStream::collect_all) has returned them.
    pub fn servers(&self) -> Vec<ServerInfo> {
        self.shared.state.lock().servers.clone()
    }

    /// Read `source` to completion and return every complete server
    ///
    /// Resolves when the source ends or the server cap is reached. A fatal
    /// stream error is returned as `Err`; per-frame decode errors are only
    /// passed to `on_error`.
    pub async fn collect_all<R>(&self, source: R) -> Result<Vec<ServerInfo>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = self.start(source)?;

        match handle.join().await? {
            StreamExit::Ended | StreamExit::Stopped(_) => {
                Ok(std::mem::take(&mut self.shared.state.lock().servers))
            }
            StreamExit::Failed(e) => Err(e),
        }
    }

    /// Like [`collect_all`](ServerStream::collect_all), keeping only servers matching `filter`
    pub async fn collect_filtered<R, F>(&self, source: R, filter: F) -> Result<Vec<ServerInfo>>
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: Fn(&ServerInfo) -> bool,
    {
        let servers = self.collect_all(source).await?;
        Ok(servers.into_iter().filter(|server| filter(server)).collect())
    }

    fn handle_frame(&self, frame: Frame) {
        let info = match decode_server_info(frame.payload()) {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to decode {}-byte frame: {}", frame.declared_len(), e);
                if let Some(on_error) = self.shared.handlers.lock().on_error.as_mut() {
                    on_error(&e);
                }
                return;
            }
        };

        if !info.is_complete() {
            debug!("Dropping server record without endpoint or data");
            return;
        }

        let cap_reached = {
            let mut state = self.shared.state.lock();
            if !state.running {
                return;
            }
            state.processed += 1;
            state.servers.push(info.clone());
            self.options.max_servers.is_some_and(|max| state.processed >= max)
        };

        let mut handlers = self.shared.handlers.lock();
        if let Some(on_server) = handlers.on_server.as_mut() {
            on_server(&info);
        }

        if cap_reached {
            drop(handlers);
            info!("Server cap reached ({}), stopping stream", self.processed_count());
            self.stop();
            if let Some(on_end) = self.shared.handlers.lock().on_end.as_mut() {
                on_end();
            }
        }
    }

    fn handle_end(&self) {
        {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.stop = None;
            info!("Server stream ended: {} servers processed", state.processed);
        }
        if let Some(on_end) = self.shared.handlers.lock().on_end.as_mut() {
            on_end();
        }
    }

    fn handle_error(&self, e: &FxListError) {
        {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.stop = None;
        }
        if let Some(on_error) = self.shared.handlers.lock().on_error.as_mut() {
            on_error(e);
        }
    }
}
