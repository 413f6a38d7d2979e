//! Length-delimited message framing.
//!
//! Wire format: 4-byte big-endian length prefix followed by a JSON payload.

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (1 MB). Keys and certificates are a few KB at most.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Errors reading or writing a typed message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The underlying stream failed or hit EOF mid-frame.
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The frame arrived intact but isn't a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CodecError {
    /// True if the peer closed the stream cleanly between frames.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Read a length-delimited frame from an async reader.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Bytes> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} bytes", len),
        ));
    }

    let mut buf = BytesMut::with_capacity(len);
    buf.resize(len, 0);
    reader.read_exact(&mut buf).await?;

    Ok(buf.freeze())
}

/// Write a length-delimited frame to an async writer.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame too large: {} bytes", data.len()),
        ));
    }

    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;

    Ok(())
}

/// Read one frame and decode it as `T`.
pub async fn read_message<T, R>(reader: &mut R) -> Result<T, CodecError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let frame = read_frame(reader).await?;
    Ok(serde_json::from_slice(&frame)?)
}

/// Encode `message` and write it as one frame.
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), CodecError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(message)?;
    write_frame(writer, &data).await?;
    Ok(())
}
