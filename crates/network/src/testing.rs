//! Test-only byte sources

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Yields `data` on the first read, then fails every read with a connection reset
pub(crate) struct ResetAfter {
    data: Option<Vec<u8>>,
}

impl ResetAfter {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self { data: Some(data) }
    }
}

impl AsyncRead for ResetAfter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.data.take() {
            Some(data) => {
                let n = data.len().min(buf.remaining());
                buf.put_slice(&data[..n]);
                if n < data.len() {
                    self.data = Some(data[n..].to_vec());
                }
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
        }
    }
}
