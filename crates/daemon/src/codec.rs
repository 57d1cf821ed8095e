// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format encoding/decoding for the editor protocol.
//!
//! Wire format: 6-digit hex-ASCII byte count + s-expression payload

use javelin_core::sexp::{Sexp, SexpError};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Protocol errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad frame header: {0}")]
    BadHeader(String),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("payload is not valid UTF-8")]
    BadEncoding,

    #[error("payload is not a well-formed expression: {0}")]
    Sexp(#[from] SexpError),

    #[error("connection closed")]
    ConnectionClosed,
}

/// Maximum frame size the six-digit header can carry.
pub const MAX_FRAME_SIZE: usize = 0xFF_FFFF;

/// Width of the hex-ASCII length header.
const HEADER_LEN: usize = 6;

/// Read one framed message from an async reader.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Sexp, CodecError> {
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(CodecError::ConnectionClosed);
        }
        Err(e) => return Err(CodecError::Io(e)),
    }
    let header = std::str::from_utf8(&header)
        .map_err(|_| CodecError::BadHeader("non-ascii length".to_string()))?;
    let len = usize::from_str_radix(header, 16)
        .map_err(|_| CodecError::BadHeader(header.to_string()))?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    let text = std::str::from_utf8(&payload).map_err(|_| CodecError::BadEncoding)?;
    Ok(Sexp::parse(text)?)
}

/// Write one framed message to an async writer.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    message: &Sexp,
) -> Result<(), CodecError> {
    let payload = message.to_string();
    let bytes = payload.as_bytes();
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: bytes.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let header = format!("{:06x}", bytes.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
