//! Protocol Module
//!
//! Defines the wire protocol between this client and the emulator's
//! network-access server.
//!
//! ## Request Format
//! ```text
//! <verb>[ <arg1>;<arg2>;...]\n
//! ```
//! optionally followed by a binary section:
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ 0x00 (1) │ Len (4)  │         Attachment          │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Responses
//! Responses carry no framing of their own. A client takes whatever one
//! read returns; [`Reply`] only describes it for logging.

mod command;
mod codec;
mod reply;

pub use command::{Command, CommandSpec, ARG_SEPARATOR, ATTACHMENT_MARKER};
pub use codec::{
    decode_frame, encode_frame, read_frame, write_frame, DecodedFrame, Frame,
    BINARY_HEADER_SIZE, BINARY_SENTINEL, LINE_TERMINATOR,
};
pub use reply::Reply;
