//! Protocol codec
//!
//! Encoding and decoding functions for command frames.
//!
//! ## Wire Format
//!
//! ### Command line
//! ```text
//! <verb>[ <arg1>;<arg2>;...]\n
//! ```
//!
//! ### Optional binary section
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ 0x00 (1) │ Len (4)  │         Attachment          │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//! Len is big-endian and always equals the attachment's byte length.
//! Nothing follows the attachment.

use std::io::{BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::Command;
use crate::error::{EmuNwError, Result};

/// Terminates the command line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Marks that a binary section follows the command line
pub const BINARY_SENTINEL: u8 = 0x00;

/// Sentinel byte + 4 byte length
pub const BINARY_HEADER_SIZE: usize = 5;

// =============================================================================
// Frame
// =============================================================================

/// One fully serialized command, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// A frame as seen by the receiving side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub command: Command,
    pub attachment: Option<Vec<u8>>,
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a command and optional attachment to a frame
///
/// Fails if the command is not a valid single line, or if the attachment
/// length does not fit in 32 bits.
pub fn encode_frame(command: &Command, attachment: Option<&[u8]>) -> Result<Frame> {
    command.validate()?;

    let declared_len = attachment
        .map(|data| {
            u32::try_from(data.len()).map_err(|_| {
                EmuNwError::Protocol(format!(
                    "attachment of {} bytes exceeds the 32-bit length field",
                    data.len()
                ))
            })
        })
        .transpose()?;

    let line_len = command.verb().len()
        + command.args().iter().map(|a| a.len() + 1).sum::<usize>()
        + 1;
    let binary_len = attachment.map_or(0, |data| BINARY_HEADER_SIZE + data.len());

    let mut buf = BytesMut::with_capacity(line_len + binary_len);
    buf.put_slice(command.verb().as_bytes());
    if let Some((first, rest)) = command.args().split_first() {
        buf.put_u8(b' ');
        buf.put_slice(first.as_bytes());
        for arg in rest {
            buf.put_u8(b';');
            buf.put_slice(arg.as_bytes());
        }
    }
    buf.put_u8(LINE_TERMINATOR);

    if let (Some(data), Some(len)) = (attachment, declared_len) {
        buf.put_u8(BINARY_SENTINEL);
        buf.put_u32(len);
        buf.put_slice(data);
    }

    Ok(Frame {
        bytes: buf.freeze(),
    })
}

// =============================================================================
// Decoding
// =============================================================================

/// Split a command line (without its terminator) into a command
fn parse_line(line: &[u8]) -> Result<Command> {
    let line = std::str::from_utf8(line)
        .map_err(|e| EmuNwError::Protocol(format!("command line is not UTF-8: {}", e)))?;

    let command = match line.split_once(' ') {
        Some((verb, args)) => Command::new(verb, args.split(';')),
        None => Command::bare(line),
    };

    if command.verb().is_empty() {
        return Err(EmuNwError::Protocol("command line has no verb".to_string()));
    }
    Ok(command)
}

/// Decode one frame from the front of a buffer
///
/// Returns the frame and the number of bytes consumed. Bytes after the
/// frame are left alone; a following frame never starts with the sentinel.
pub fn decode_frame(bytes: &[u8]) -> Result<(DecodedFrame, usize)> {
    let line_end = bytes
        .iter()
        .position(|&b| b == LINE_TERMINATOR)
        .ok_or_else(|| EmuNwError::Protocol("incomplete command line".to_string()))?;

    let command = parse_line(&bytes[..line_end])?;
    let mut consumed = line_end + 1;

    let attachment = if bytes.get(consumed) == Some(&BINARY_SENTINEL) {
        let header = bytes.get(consumed..consumed + BINARY_HEADER_SIZE).ok_or_else(|| {
            EmuNwError::Protocol(format!(
                "incomplete binary header: expected {} bytes, got {}",
                BINARY_HEADER_SIZE,
                bytes.len() - consumed
            ))
        })?;
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        consumed += BINARY_HEADER_SIZE;

        let data = bytes.get(consumed..consumed + len).ok_or_else(|| {
            EmuNwError::Protocol(format!(
                "incomplete attachment: expected {} bytes, got {}",
                len,
                bytes.len() - consumed
            ))
        })?;
        consumed += len;
        Some(data.to_vec())
    } else {
        None
    };

    Ok((DecodedFrame { command, attachment }, consumed))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame from a stream
///
/// Returns `Ok(None)` on a clean end of stream before any byte of a frame.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<DecodedFrame>> {
    let mut line = Vec::new();
    if reader.read_until(LINE_TERMINATOR, &mut line)? == 0 {
        return Ok(None);
    }
    if line.pop() != Some(LINE_TERMINATOR) {
        return Err(EmuNwError::Protocol(
            "stream ended inside a command line".to_string(),
        ));
    }
    let command = parse_line(&line)?;

    // Peek for the sentinel without consuming the next frame
    let has_binary = reader.fill_buf()?.first() == Some(&BINARY_SENTINEL);
    let attachment = if has_binary {
        let mut header = [0u8; BINARY_HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        Some(data)
    } else {
        None
    };

    Ok(Some(DecodedFrame { command, attachment }))
}

/// Write a frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    writer.write_all(frame.as_bytes())?;
    writer.flush()?;
    Ok(())
}
