//! Decoder for the AWS event-stream framing used by
//! `invoke-with-response-stream`.
//!
//! A frame is laid out as:
//!
//! ```text
//! [total len u32][headers len u32][prelude crc u32]
//! [headers ...][payload ...][message crc u32]
//! ```
//!
//! All integers are big-endian and both checksums are CRC32 (IEEE).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Buf, Bytes, BytesMut};
use log::{debug, trace};
use serde::Deserialize;

use crate::error::{Error, Result};

const PRELUDE_LEN: usize = 12;
const CRC_LEN: usize = 4;
/// Bedrock caps frames well below this; anything larger is corrupt.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// One decoded frame. Only string headers are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame
{   pub headers: Vec<(String, String)>
  , pub payload: Bytes
}

impl Frame
{   pub fn header(&self, name: &str) -> Option<&str>
    {   self.headers.iter()
          .find(|(k, _)| k == name)
          .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload
{   bytes: String
}

#[derive(Debug, Deserialize)]
struct ExceptionPayload
{   #[serde(default, alias = "Message")]
    message: Option<String>
}

/// Incremental frame decoder; feed it bytes as they arrive.
#[derive(Debug, Default)]
pub struct Decoder
{   buf: BytesMut
}

impl Decoder
{   pub fn new() -> Self
    {   Decoder::default()
    }

    pub fn push(&mut self, data: &[u8])
    {   self.buf.extend_from_slice(data);
    }

    /// Bytes received but not yet part of a complete frame
    pub fn pending(&self) -> usize
    {   self.buf.len()
    }

    /// Next complete frame, or `None` until more bytes arrive
    pub fn next_frame(&mut self) -> Result<Option<Frame>>
    {   if self.buf.len() < PRELUDE_LEN
        {   return Ok(None);
        }

        let total_len = read_u32(&self.buf[0..4]) as usize;
        let headers_len = read_u32(&self.buf[4..8]) as usize;
        let prelude_crc = read_u32(&self.buf[8..12]);

        if crc32(&self.buf[0..8]) != prelude_crc
        {   return Err(Error::Gateway(
              "event stream prelude checksum mismatch".to_string()
            ));
        }
        if total_len < PRELUDE_LEN + CRC_LEN + headers_len
          || total_len > MAX_FRAME_LEN
        {   return Err(Error::Gateway(format!(
              "invalid event stream frame length {}", total_len
            )));
        }
        if self.buf.len() < total_len
        {   trace!(
              "Waiting for frame: have {} of {} bytes",
              self.buf.len(), total_len
            );
            return Ok(None);
        }

        let mut frame = self.buf.split_to(total_len).freeze();
        let message_crc = read_u32(&frame[total_len - CRC_LEN..]);
        if crc32(&frame[..total_len - CRC_LEN]) != message_crc
        {   return Err(Error::Gateway(
              "event stream message checksum mismatch".to_string()
            ));
        }

        frame.advance(PRELUDE_LEN);
        let header_bytes = frame.split_to(headers_len);
        let payload = frame.split_to(frame.len() - CRC_LEN);
        let headers = parse_headers(header_bytes)?;

        Ok(Some(Frame { headers, payload }))
    }
}

/// Raw model chunk carried by a frame.
/// `Ok(None)` for frames that carry no chunk (e.g. initial-response).
pub fn chunk_bytes(frame: &Frame) -> Result<Option<Vec<u8>>>
{   match frame.header(":message-type")
    {   Some("event") => {
          if frame.header(":event-type") != Some("chunk")
          {   debug!(
                "Skipping event: {:?}", frame.header(":event-type")
              );
              return Ok(None);
          }
          let chunk: ChunkPayload
            = serde_json::from_slice(&frame.payload).map_err(|e| {
              Error::Gateway(format!("malformed chunk event, {}", e))
            })?;
          Ok(Some(STANDARD.decode(chunk.bytes.as_bytes())?))
        }
      , Some("exception") | Some("error") => {
          let kind = frame.header(":exception-type")
            .or_else(|| frame.header(":error-code"))
            .unwrap_or("unknown");
          let message = serde_json::from_slice::<ExceptionPayload>(
              &frame.payload
            )
            .ok()
            .and_then(|p| p.message)
            .or_else(|| frame.header(":error-message")
              .map(str::to_string))
            .unwrap_or_else(|| {
              String::from_utf8_lossy(&frame.payload).into_owned()
            });
          Err(Error::Gateway(format!("{}: {}", kind, message)))
        }
      , other => {
          debug!("Skipping frame with message type: {:?}", other);
          Ok(None)
        }
    }
}

/// Encode a frame with string headers.
/// The gateway only decodes; this exists for gateway doubles and tests.
pub fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8>
{   let mut header_bytes = Vec::new();
    for (name, value) in headers
    {   header_bytes.push(name.len() as u8);
        header_bytes.extend_from_slice(name.as_bytes());
        header_bytes.push(7);
        header_bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        header_bytes.extend_from_slice(value.as_bytes());
    }

    let total_len = PRELUDE_LEN + header_bytes.len() + payload.len() + CRC_LEN;
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&(total_len as u32).to_be_bytes());
    out.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    let prelude_crc = crc32(&out);
    out.extend_from_slice(&prelude_crc.to_be_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(payload);
    let message_crc = crc32(&out);
    out.extend_from_slice(&message_crc.to_be_bytes());
    out
}

/// A `chunk` event frame wrapping one raw model chunk
pub fn encode_chunk(raw: &[u8]) -> Vec<u8>
{   let payload = serde_json::json!({ "bytes": STANDARD.encode(raw) });
    encode_frame(
      &[
        (":event-type", "chunk"),
        (":content-type", "application/json"),
        (":message-type", "event"),
      ],
      payload.to_string().as_bytes()
    )
}

fn parse_headers(mut bytes: Bytes) -> Result<Vec<(String, String)>>
{   let truncated = || Error::Gateway(
      "truncated event stream header".to_string()
    );
    let mut headers = Vec::new();

    while bytes.has_remaining()
    {   let name_len = bytes.get_u8() as usize;
        if bytes.remaining() < name_len + 1
        {   return Err(truncated());
        }
        let name = String::from_utf8_lossy(&bytes.split_to(name_len))
          .into_owned();
        let value_type = bytes.get_u8();

        let fixed = match value_type
        {   0 | 1 => Some(0)
          , 2 => Some(1)
          , 3 => Some(2)
          , 4 => Some(4)
          , 5 | 8 => Some(8)
          , 9 => Some(16)
          , 6 | 7 => None
          , other => {
              return Err(Error::Gateway(format!(
                "unknown event stream header type {}", other
              )));
            }
        };

        match fixed
        {   Some(len) => {
              if bytes.remaining() < len
              {   return Err(truncated());
              }
              bytes.advance(len);
            }
          , None => {
              if bytes.remaining() < 2
              {   return Err(truncated());
              }
              let len = bytes.get_u16() as usize;
              if bytes.remaining() < len
              {   return Err(truncated());
              }
              let value = bytes.split_to(len);
              if value_type == 7
              {   headers.push((
                    name,
                    String::from_utf8_lossy(&value).into_owned()
                  ));
              }
            }
        }
    }

    Ok(headers)
}

fn read_u32(bytes: &[u8]) -> u32
{   u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn crc32(data: &[u8]) -> u32
{   let mut crc = 0xFFFF_FFFFu32;
    for &byte in data
    {   crc ^= byte as u32;
        for _ in 0..8
        {   let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
