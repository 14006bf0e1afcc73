//! Error types for emunw
//!
//! Provides a unified error type for all operations. Every error is fatal
//! to a client run: nothing here is retried or recovered from.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using EmuNwError
pub type Result<T> = std::result::Result<T, EmuNwError>;

/// Unified error type for emunw operations
#[derive(Debug, Error)]
pub enum EmuNwError {
    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Resolution error: {addr}: {reason}")]
    Resolution { addr: String, reason: String },

    #[error("Connection error: {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Timeout error: no response within {0:?}")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // Attachment Errors
    // -------------------------------------------------------------------------
    #[error("File error: {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Invocation Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(#[source] std::io::Error),
}

/// Coarse classification of an [`EmuNwError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Connection,
    File,
    Transport,
    Timeout,
    Protocol,
    Config,
    Output,
}

impl EmuNwError {
    /// Which failure class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmuNwError::Resolution { .. } => ErrorKind::Resolution,
            EmuNwError::Connection { .. } => ErrorKind::Connection,
            EmuNwError::Transport(_) => ErrorKind::Transport,
            EmuNwError::Timeout(_) => ErrorKind::Timeout,
            EmuNwError::File { .. } => ErrorKind::File,
            EmuNwError::Protocol(_) => ErrorKind::Protocol,
            EmuNwError::Config(_) => ErrorKind::Config,
            EmuNwError::Output(_) => ErrorKind::Output,
        }
    }
}
