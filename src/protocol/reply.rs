//! Reply classification
//!
//! The emulator answers in one of three shapes:
//! - binary: `0x00 <len:u32 BE> <data>`
//! - ascii hash: `\n` then `key:value\n` lines, closed by an empty line
//! - ascii error: `\nerror:<message>\n\n`
//!
//! Responses are emitted raw; this is only used to describe what came back.

use std::fmt;

use super::codec::{BINARY_HEADER_SIZE, BINARY_SENTINEL};

/// Key the emulator uses for error replies
const ERROR_KEY: &str = "error";

/// What a response looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Binary block; `data` may be shorter than `declared_len`
    Binary { declared_len: u32, data: &'a [u8] },

    /// `key:value` lines, in order. A line without ':' has an empty value.
    Fields(Vec<(&'a str, &'a str)>),

    /// `error:<message>`
    Error(&'a str),

    /// Empty, or not in any known shape
    Unrecognized,
}

impl<'a> Reply<'a> {
    /// Classify the first reply in a response buffer
    pub fn parse(bytes: &'a [u8]) -> Self {
        match bytes.first() {
            Some(&BINARY_SENTINEL) => Self::parse_binary(bytes),
            Some(b'\n') => Self::parse_hash(&bytes[1..]),
            _ => Reply::Unrecognized,
        }
    }

    fn parse_binary(bytes: &'a [u8]) -> Self {
        let Some(header) = bytes.get(..BINARY_HEADER_SIZE) else {
            return Reply::Unrecognized;
        };
        let declared_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        let rest = &bytes[BINARY_HEADER_SIZE..];
        let data = &rest[..rest.len().min(declared_len as usize)];
        Reply::Binary { declared_len, data }
    }

    fn parse_hash(bytes: &'a [u8]) -> Self {
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Reply::Unrecognized;
        };

        let mut fields = Vec::new();
        for line in text.split('\n') {
            if line.is_empty() {
                break;
            }
            let (key, value) = line.split_once(':').unwrap_or((line, ""));
            if key == ERROR_KEY && fields.is_empty() {
                return Reply::Error(value);
            }
            fields.push((key, value));
        }
        Reply::Fields(fields)
    }

    /// True for binary replies whose data did not fully arrive
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Reply::Binary { declared_len, data } if data.len() < *declared_len as usize)
    }
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Binary { declared_len, data } => {
                write!(f, "binary {}/{} bytes", data.len(), declared_len)
            }
            Reply::Fields(fields) => write!(f, "{} field(s)", fields.len()),
            Reply::Error(message) => write!(f, "error: {}", message),
            Reply::Unrecognized => f.write_str("unrecognized"),
        }
    }
}
