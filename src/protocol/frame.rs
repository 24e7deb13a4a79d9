//! Length-prefixed wire framing.
//!
//! ```text
//! +--------+--------+-------------------------------+
//! | len_hi | len_lo |  payload (len bytes)           |
//! +--------+--------+-------------------------------+
//!
//! payload = nlen_hi nlen_lo name(nlen bytes) body(bincode-encoded struct)
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::WireError;
use crate::protocol::messages::WireMessage;

pub const MAX_FRAME_BYTES: usize = 65_535;

/// A decoded frame before it has been matched against the registry: the
/// wire name plus the still-encoded body bytes.
#[derive(Debug)]
pub struct RawFrame {
    pub name: String,
    pub body: Vec<u8>,
}

/// Encodes `msg` into a complete frame (length prefix included), built
/// header-after-body so there is no aliasing between the length field and
/// the growing body buffer.
pub fn encode_message<T: WireMessage>(msg: &T) -> Result<bytes::Bytes, WireError> {
    let body = bincode::serialize(msg).map_err(|source| WireError::Encode {
        name: T::NAME.to_string(),
        source,
    })?;
    encode_raw(T::NAME, &body)
}

fn encode_raw(name: &str, body: &[u8]) -> Result<bytes::Bytes, WireError> {
    let name_bytes = name.as_bytes();
    let payload_len = 2 + name_bytes.len() + body.len();
    if payload_len > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge(payload_len));
    }

    let mut out = Vec::with_capacity(2 + payload_len);
    out.extend_from_slice(&(payload_len as u16).to_be_bytes());
    out.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(name_bytes);
    out.extend_from_slice(body);
    Ok(bytes::Bytes::from(out))
}

/// Reads one frame from `reader`, splitting the wire name from the
/// still-encoded body. Returns `WireError::Eof` on a clean close with no
/// bytes read.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<RawFrame, WireError> {
    let mut len_buf = [0u8; 2];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(WireError::Eof),
        Err(e) => return Err(WireError::Io(e)),
    }
    let payload_len = u16::from_be_bytes(len_buf) as usize;
    if payload_len > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge(payload_len));
    }

    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload).await?;

    if payload.len() < 2 {
        return Err(WireError::FrameTooLarge(payload.len()));
    }
    let name_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    if payload.len() < 2 + name_len {
        return Err(WireError::FrameTooLarge(payload.len()));
    }
    let name = String::from_utf8_lossy(&payload[2..2 + name_len]).into_owned();
    let body = payload[2 + name_len..].to_vec();
    Ok(RawFrame { name, body })
}

/// Writes a pre-encoded frame (length prefix and all) to `writer`.
pub async fn write_encoded<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<(), WireError> {
    writer.write_all(frame).await?;
    Ok(())
}
