// src/remote/codec.rs

use std::io::ErrorKind;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{RerunError, Result};

/// Position of the changed path within the message array.
pub const PATH_INDEX: usize = 3;

/// Upper bound on a single message payload.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Read one frame: a 4-byte big-endian length followed by that many bytes.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame
/// starts.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(RerunError::Protocol(format!(
                "truncated length prefix ({filled} of 4 bytes)"
            )));
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(RerunError::Protocol(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit"
        )));
    }

    let mut payload = vec![0u8; len as usize];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(Some(payload)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(RerunError::Protocol(format!(
            "truncated frame: expected {len} bytes"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Decode a frame payload and return the changed path it carries.
///
/// The payload is a JSON array; the path is the string at [`PATH_INDEX`].
pub fn decode_payload(payload: &[u8]) -> Result<String> {
    let message: Vec<Value> = serde_json::from_slice(payload)
        .map_err(|e| RerunError::Protocol(format!("invalid message payload: {e}")))?;

    match message.get(PATH_INDEX) {
        Some(Value::String(path)) => Ok(path.clone()),
        Some(other) => Err(RerunError::Protocol(format!(
            "expected a path string at index {PATH_INDEX}, got {other}"
        ))),
        None => Err(RerunError::Protocol(format!(
            "message has {} elements, expected at least {}",
            message.len(),
            PATH_INDEX + 1
        ))),
    }
}
