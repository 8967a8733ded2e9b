//! Incremental frame reassembly.
//!
//! The stream is a back-to-back sequence of `[u32 LE length][payload]` frames
//! with no padding, delimiter or checksum. Chunks from the network can split a
//! frame anywhere, so the reader keeps a state machine:
//! - `AwaitingLength`: need 4 bytes for the length prefix
//! - `AccumulatingBody`: length known, collecting payload bytes
//! - `Closed`: a framing error desynchronized the stream
//!
//! [`FrameDecoder`] holds only the state and works on a caller-owned buffer,
//! which makes it a `tokio_util` codec. [`FrameReader`] pairs it with its own
//! `BytesMut` for push-style use.
//!
//! # Example
//!
//! ```
//! use fxlist_protocol::FrameReader;
//! use std::ops::ControlFlow;
//!
//! let mut reader = FrameReader::new();
//! let mut frames = Vec::new();
//!
//! // Prefix split across two chunks
//! reader.push(&[0x01, 0x00], |_| ControlFlow::Continue(())).unwrap();
//! reader
//!     .push(&[0x00, 0x00, 0xAB], |frame| {
//!         frames.push(frame);
//!         ControlFlow::Continue(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(frames[0].payload(), &[0xAB]);
//! ```

use bytes::{Buf, Bytes, BytesMut};
use fxlist_core::{FxListError, Result};
use std::ops::ControlFlow;
use tokio_util::codec::Decoder;
use tracing::{debug, error, trace, warn};

/// Size of the length prefix in front of every frame
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default ceiling for a declared frame length (10 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 10 * 1024 * 1024;

/// One complete frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    declared_len: u32,
    payload: Bytes,
}

impl Frame {
    /// Wrap a payload, failing with `FrameTooLarge` if its length does not fit the u32 prefix
    pub fn new(payload: Bytes) -> Result<Self> {
        Ok(Self {
            declared_len: prefix_len(payload.len())?,
            payload,
        })
    }

    /// Length taken from the frame's prefix
    pub fn declared_len(&self) -> u32 {
        self.declared_len
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

fn prefix_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FxListError::FrameTooLarge {
        length: u32::MAX,
        limit: u32::MAX,
    })
}

/// Observable reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    AwaitingLength,
    AccumulatingBody { length: u32, received: usize },
    Closed,
}

#[derive(Debug, Clone, Copy)]
enum State {
    AwaitingLength,
    AccumulatingBody { length: u32 },
    Closed,
}

/// Frame state machine over an external buffer
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    max_frame_size: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self {
            state: State::AwaitingLength,
            max_frame_size,
        }
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Return to `AwaitingLength`, abandoning a partially read frame
    ///
    /// A closed decoder stays closed.
    pub fn reset(&mut self) {
        if !self.is_closed() {
            self.state = State::AwaitingLength;
        }
    }

    /// Bytes of the frame in progress: buffered bytes plus an already consumed prefix
    pub fn partial_len(&self, buf: &BytesMut) -> usize {
        match self.state {
            State::AccumulatingBody { .. } => LENGTH_PREFIX_SIZE + buf.len(),
            State::AwaitingLength | State::Closed => buf.len(),
        }
    }

    /// Drop the frame in progress at end of input, returning the bytes dropped
    fn discard_partial(&mut self, buf: &mut BytesMut) -> usize {
        let dropped = self.partial_len(buf);
        if dropped > 0 {
            warn!("Stream ended with {} bytes of an incomplete frame", dropped);
        }
        buf.clear();
        self.reset();
        dropped
    }

    /// Current state, with `received` taken from the buffer being decoded
    pub fn state(&self, buf: &BytesMut) -> FrameState {
        match self.state {
            State::AwaitingLength => FrameState::AwaitingLength,
            State::AccumulatingBody { length } => FrameState::AccumulatingBody {
                length,
                received: buf.len().min(length as usize),
            },
            State::Closed => FrameState::Closed,
        }
    }

    /// Try to split one complete frame off the front of `buf`
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed (or the decoder is closed)
    /// - `Err(FrameTooLarge)` if the prefix exceeds the ceiling; the decoder closes
    pub fn decode_frame(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::Closed => return Ok(None),

                State::AwaitingLength => {
                    if buf.len() < LENGTH_PREFIX_SIZE {
                        return Ok(None);
                    }

                    let length = buf.get_u32_le();
                    if length > self.max_frame_size {
                        error!(
                            "Frame too large: {} bytes (limit {}), closing stream",
                            length, self.max_frame_size
                        );
                        self.state = State::Closed;
                        buf.clear();
                        return Err(FxListError::FrameTooLarge {
                            length,
                            limit: self.max_frame_size,
                        });
                    }

                    trace!("Frame header: {} bytes", length);
                    buf.reserve((length as usize).saturating_sub(buf.len()));
                    self.state = State::AccumulatingBody { length };
                }

                State::AccumulatingBody { length } => {
                    if buf.len() < length as usize {
                        return Ok(None);
                    }

                    let payload = buf.split_to(length as usize).freeze();
                    self.state = State::AwaitingLength;
                    return Ok(Some(Frame {
                        declared_len: length,
                        payload,
                    }));
                }
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = FxListError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        self.decode_frame(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode_frame(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.discard_partial(src);
                Ok(None)
            }
        }
    }
}

/// Push-style frame reader owning its reassembly buffer
///
/// Memory use is bounded by the frame ceiling plus the size of the chunks
/// pushed: complete frames are split off as soon as they are emitted.
#[derive(Debug)]
pub struct FrameReader {
    decoder: FrameDecoder,
    buffer: BytesMut,
}

impl FrameReader {
    /// Create a frame reader with the default 10 MiB ceiling
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self::from_parts(FrameDecoder::with_max_frame_size(max_frame_size), BytesMut::new())
    }

    /// Rebuild a reader from a decoder and the bytes it had buffered
    pub fn from_parts(decoder: FrameDecoder, buffer: BytesMut) -> Self {
        Self { decoder, buffer }
    }

    pub fn state(&self) -> FrameState {
        self.decoder.state(&self.buffer)
    }

    /// Number of buffered bytes not yet emitted as frames
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.decoder.is_closed()
    }

    /// Append a chunk without emitting frames
    pub fn extend(&mut self, chunk: &[u8]) {
        if self.decoder.is_closed() {
            debug!("Ignoring {} bytes pushed to a closed frame reader", chunk.len());
            return;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Pull the next complete frame from the buffered bytes
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.decoder.decode_frame(&mut self.buffer)
    }

    /// Append a chunk and emit every frame it completes, in order
    ///
    /// `on_frame` may return `ControlFlow::Break(())` to stop emission; frames
    /// still buffered at that point stay available through [`next_frame`].
    /// Returns the number of frames emitted.
    ///
    /// [`next_frame`]: FrameReader::next_frame
    pub fn push<F>(&mut self, chunk: &[u8], mut on_frame: F) -> Result<usize>
    where
        F: FnMut(Frame) -> ControlFlow<()>,
    {
        self.extend(chunk);

        let mut emitted = 0;
        while let Some(frame) = self.next_frame()? {
            emitted += 1;
            if on_frame(frame).is_break() {
                break;
            }
        }
        Ok(emitted)
    }

    /// Signal end of input, returning how many bytes of a partial frame were dropped
    ///
    /// The count includes a length prefix that was already consumed. The reader
    /// is left in `AwaitingLength`, so it can be reused for a new stream.
    pub fn finish(&mut self) -> usize {
        self.decoder.discard_partial(&mut self.buffer)
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_frame;

    fn collect(reader: &mut FrameReader, chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        reader
            .push(chunk, |frame| {
                frames.push(frame.into_payload());
                ControlFlow::Continue(())
            })
            .unwrap();
        frames
    }

    fn sample_stream() -> (Vec<u8>, Vec<Vec<u8>>) {
        let payloads: Vec<Vec<u8>> = vec![
            vec![0x28, 0x05],
            vec![],
            (0..=255u8).collect(),
            b"server info".to_vec(),
            vec![0xFF; 1000],
        ];
        let mut stream = Vec::new();
        for payload in &payloads {
            stream.extend_from_slice(&encode_frame(payload));
        }
        (stream, payloads)
    }

    #[test]
    fn test_single_chunk_many_frames() {
        let (stream, payloads) = sample_stream();
        let mut reader = FrameReader::new();
        let frames = collect(&mut reader, &stream);

        assert_eq!(frames.len(), payloads.len());
        for (frame, payload) in frames.iter().zip(&payloads) {
            assert_eq!(&frame[..], &payload[..]);
        }
        assert_eq!(reader.buffered(), 0);
        assert_eq!(reader.state(), FrameState::AwaitingLength);
    }

    #[test]
    fn test_chunking_invariance() {
        let (stream, payloads) = sample_stream();

        for chunk_size in [1, 2, 3, 4, 5, 7, 13, 64, 255, 1000, stream.len()] {
            let mut reader = FrameReader::new();
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                frames.extend(collect(&mut reader, chunk));
            }

            assert_eq!(frames.len(), payloads.len(), "chunk size {}", chunk_size);
            for (frame, payload) in frames.iter().zip(&payloads) {
                assert_eq!(&frame[..], &payload[..], "chunk size {}", chunk_size);
            }
        }
    }

    #[test]
    fn test_uneven_split_points() {
        let (stream, payloads) = sample_stream();

        // Every two-way split of the stream
        for split in 0..=stream.len() {
            let mut reader = FrameReader::new();
            let mut frames = collect(&mut reader, &stream[..split]);
            frames.extend(collect(&mut reader, &stream[split..]));
            assert_eq!(frames.len(), payloads.len(), "split at {}", split);
        }
    }

    #[test]
    fn test_partial_body_keeps_buffering() {
        let mut reader = FrameReader::new();
        let frames = collect(&mut reader, &[0x05, 0x00, 0x00, 0x00, 1, 2, 3]);

        assert!(frames.is_empty());
        assert_eq!(
            reader.state(),
            FrameState::AccumulatingBody { length: 5, received: 3 }
        );

        let frames = collect(&mut reader, &[4, 5]);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partial_prefix_keeps_buffering() {
        let mut reader = FrameReader::new();
        assert!(collect(&mut reader, &[0x02, 0x00, 0x00]).is_empty());
        assert_eq!(reader.state(), FrameState::AwaitingLength);
        assert_eq!(reader.buffered(), 3);
    }

    #[test]
    fn test_zero_length_frame() {
        let mut reader = FrameReader::new();
        let frames = collect(&mut reader, &[0, 0, 0, 0]);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_frame_too_large_closes_reader() {
        let mut reader = FrameReader::new();
        let declared = 20 * 1024 * 1024u32;
        let mut stream = declared.to_le_bytes().to_vec();
        stream.extend_from_slice(&encode_frame(&[0x28, 0x05]));

        let mut emitted = 0;
        let result = reader.push(&stream, |_| {
            emitted += 1;
            ControlFlow::Continue(())
        });

        assert!(matches!(
            result,
            Err(FxListError::FrameTooLarge { length, limit })
                if length == declared && limit == DEFAULT_MAX_FRAME_SIZE
        ));
        assert_eq!(emitted, 0);
        assert!(reader.is_closed());

        // No resynchronization on later chunks
        assert!(collect(&mut reader, &encode_frame(&[0x28, 0x05])).is_empty());
        assert_eq!(reader.state(), FrameState::Closed);
    }

    #[test]
    fn test_frame_at_ceiling_is_accepted() {
        let mut reader = FrameReader::with_max_frame_size(8);
        let frames = collect(&mut reader, &encode_frame(&[7; 8]));
        assert_eq!(frames.len(), 1);

        let result = reader.push(&encode_frame(&[7; 9]), |_| ControlFlow::Continue(()));
        assert!(matches!(result, Err(FxListError::FrameTooLarge { length: 9, limit: 8 })));
    }

    #[test]
    fn test_break_keeps_remaining_frames() {
        let (stream, payloads) = sample_stream();
        let mut reader = FrameReader::new();

        let emitted = reader.push(&stream, |_| ControlFlow::Break(())).unwrap();
        assert_eq!(emitted, 1);

        let mut rest = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            rest.push(frame);
        }
        assert_eq!(rest.len(), payloads.len() - 1);
        assert_eq!(rest[0].declared_len(), 0);
        assert_eq!(rest[1].payload(), &payloads[2][..]);
    }

    #[test]
    fn test_finish_drops_partial_frame() {
        let mut reader = FrameReader::new();
        collect(&mut reader, &[0x05, 0x00, 0x00, 0x00, 1, 2, 3]);
        assert_eq!(reader.finish(), 7);
        assert_eq!(reader.state(), FrameState::AwaitingLength);
        assert_eq!(reader.finish(), 0);
    }

    #[test]
    fn test_finish_counts_partial_prefix() {
        let mut reader = FrameReader::new();
        collect(&mut reader, &[0x05, 0x00]);
        assert_eq!(reader.finish(), 2);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_reader_reusable_after_finish() {
        let mut reader = FrameReader::new();
        collect(&mut reader, &[0x05, 0x00, 0x00, 0x00, 1, 2, 3]);
        reader.finish();

        let frames = collect(&mut reader, &[0x01, 0x00, 0x00, 0x00, 0xAB]);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &[0xAB]);
        assert_eq!(reader.state(), FrameState::AwaitingLength);
    }

    #[test]
    fn test_finish_keeps_closed_reader_closed() {
        let mut reader = FrameReader::with_max_frame_size(4);
        assert!(reader.push(&encode_frame(&[0; 5]), |_| ControlFlow::Continue(())).is_err());
        assert_eq!(reader.finish(), 0);
        assert!(reader.is_closed());
    }

    #[test]
    fn test_decoder_decode_eof() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&encode_frame(b"abc")[..]);
        buf.extend_from_slice(&[0x09, 0x00]);

        let frame = decoder.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload(), b"abc");
        assert_eq!(frame.declared_len(), 3);

        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
        assert_eq!(decoder.state(&buf), FrameState::AwaitingLength);
    }

    #[test]
    fn test_decode_eof_resets_after_consumed_prefix() {
        let mut decoder = FrameDecoder::new();
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x00, 0x00][..]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.partial_len(&buf), 4);

        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());
        assert_eq!(decoder.state(&buf), FrameState::AwaitingLength);

        buf.extend_from_slice(&encode_frame(b"ok"));
        assert_eq!(decoder.decode(&mut buf).unwrap().unwrap().payload(), b"ok");
    }

    #[test]
    fn test_frame_new_sets_declared_len() {
        let frame = Frame::new(Bytes::from_static(b"hello")).unwrap();
        assert_eq!(frame.declared_len(), 5);
        assert_eq!(frame.payload(), b"hello");
    }

    #[test]
    fn test_prefix_len_rejects_oversized_payload() {
        assert_eq!(prefix_len(u32::MAX as usize).unwrap(), u32::MAX);
        if let Some(len) = (u32::MAX as usize).checked_add(1) {
            assert!(matches!(prefix_len(len), Err(FxListError::FrameTooLarge { .. })));
        }
    }
}
