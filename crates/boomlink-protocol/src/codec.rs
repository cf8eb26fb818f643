//! Tokio codec for the device link.
//!
//! The device protocol has no delimiter and no length prefix. A frame is
//! "whatever bytes are readable now": each time the transport fills the read
//! buffer, the decoder hands out everything it holds (capped at
//! [`READ_BUFFER_SIZE`] bytes per frame) as one [`DeviceFrame`].
//!
//! # Architecture
//!
//! ```text
//! TCP Stream -> Decoder -> DeviceFrame (trimmed, classified)
//! DeviceCommand -> Encoder -> TCP Stream (raw token, no terminator)
//! ```
//!
//! # Framing Fragility
//!
//! Because framing follows read boundaries, two messages that arrive in the
//! same TCP segment are decoded as one frame (`|HLT%CODE1` is a code, not a
//! health check followed by a code), and a message split across segments
//! becomes two frames. The device firmware sends one message per write with
//! long pauses in between, which keeps this from happening in practice.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use boomlink_protocol::{DeviceCodec, DeviceCommand, DeviceFrame};
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//!
//! # async fn example() -> boomlink_core::Result<()> {
//! let stream = TcpStream::connect("10.0.0.5:9000").await?;
//! let mut framed = Framed::new(stream, DeviceCodec::new());
//!
//! if let Some(Ok(DeviceFrame::Code(code))) = framed.next().await {
//!     println!("Scanned: {code}");
//!     framed.send(DeviceCommand::Open).await?;
//! }
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{DeviceCommand, DeviceFrame};
use boomlink_core::constants::READ_BUFFER_SIZE;
use boomlink_core::{Error, Result};

/// Chunk-framed codec for the device protocol.
#[derive(Debug, Clone)]
pub struct DeviceCodec {
    /// Largest chunk handed out as a single frame.
    max_frame_size: usize,
}

impl DeviceCodec {
    /// Create a codec with the default chunk size ([`READ_BUFFER_SIZE`]).
    pub fn new() -> Self {
        Self {
            max_frame_size: READ_BUFFER_SIZE,
        }
    }

    /// Create a codec with a custom chunk size.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrame` for a zero size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Result<Self> {
        if max_frame_size == 0 {
            return Err(Error::InvalidFrame(
                "Maximum frame size must be positive".to_string(),
            ));
        }
        Ok(Self { max_frame_size })
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for DeviceCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DeviceCodec {
    type Item = DeviceFrame;
    type Error = Error;

    /// Take every buffered byte (up to the chunk size) as one frame.
    ///
    /// Returns `Ok(None)` only when the buffer is empty, so a closed stream
    /// never leaves undecoded bytes behind.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        let take = src.len().min(self.max_frame_size);
        let chunk = src.split_to(take);
        Ok(Some(DeviceFrame::parse(&chunk)))
    }
}

impl Encoder<DeviceCommand> for DeviceCodec {
    type Error = Error;

    fn encode(&mut self, item: DeviceCommand, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}
