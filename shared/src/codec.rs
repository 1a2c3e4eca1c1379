//! Length-prefixed codec for TCP framing
//!
//! All messages are framed as:
//! ```text
//! [ 4 bytes: length (u32, big-endian) ][ N bytes: protobuf message ]
//! ```
//!
//! Requests and responses share the framing; the reader decides which message
//! type it expects.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use std::marker::PhantomData;
use thiserror::Error;

/// Maximum message size (1 MB); telemetry bodies are a few hundred bytes
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),

    #[error("Invalid message length prefix: {0}")]
    InvalidLength(u32),

    #[error("Protobuf decode error: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("Protobuf encode error: {0}")]
    EncodeError(#[from] prost::EncodeError),
}

/// Encode a message into a length-prefixed byte buffer
pub fn encode<M: Message>(message: &M) -> Result<Bytes, CodecError> {
    let msg_len = message.encoded_len();

    if msg_len > MAX_MESSAGE_SIZE as usize {
        return Err(CodecError::MessageTooLarge(msg_len));
    }

    let mut buf = BytesMut::with_capacity(4 + msg_len);
    buf.put_u32(msg_len as u32);
    message.encode(&mut buf)?;

    Ok(buf.freeze())
}

/// Try to decode a length-prefixed message from a buffer
///
/// Returns:
/// - `Ok(Some(message))` if a complete message was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the data is invalid
pub fn decode<M: Message + Default>(buf: &mut BytesMut) -> Result<Option<M>, CodecError> {
    if buf.len() < 4 {
        return Ok(None);
    }

    // Peek at the length prefix without consuming
    let msg_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);

    if msg_len > MAX_MESSAGE_SIZE {
        return Err(CodecError::InvalidLength(msg_len));
    }

    let total_len = 4 + msg_len as usize;
    if buf.len() < total_len {
        return Ok(None);
    }

    buf.advance(4);
    let msg_bytes = buf.split_to(msg_len as usize);

    Ok(Some(M::decode(msg_bytes)?))
}

/// Decoder state machine for streaming decoding of one message type
#[derive(Debug)]
pub struct FrameDecoder<M> {
    /// Partial frame data being accumulated
    buffer: BytesMut,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message + Default> FrameDecoder<M> {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            _message: PhantomData,
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next frame from the buffer
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete frames
    pub fn decode_next(&mut self) -> Result<Option<M>, CodecError> {
        decode(&mut self.buffer)
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

impl<M: Message + Default> Default for FrameDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}
