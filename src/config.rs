//! Configuration for emunw
//!
//! Centralized configuration with the protocol's fixed defaults.

use std::time::Duration;

use crate::error::{EmuNwError, Result};

/// Loopback endpoint the emulator listens on
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:65400";

/// Deadline for a single response read (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Upper bound on the bytes taken by one response read
pub const DEFAULT_RESPONSE_BUFFER_SIZE: usize = 64 * 1024;

/// Main configuration for a client run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Emulator address (host:port)
    pub server_addr: String,

    /// Response read deadline (milliseconds)
    pub read_timeout_ms: u64,

    /// Write deadline (milliseconds), 0 disables it
    pub write_timeout_ms: u64,

    /// Size of the buffer handed to each response read.
    /// Anything beyond this is left unread.
    pub response_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Dispatch Configuration
    // -------------------------------------------------------------------------
    pub dispatch_mode: DispatchMode,
}

/// How commands are sequenced over the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// write, read, emit; one command at a time
    #[default]
    Sync,

    /// Write every frame, then one read for the whole batch.
    /// Best effort: responses may be merged or missing.
    Pipelined,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: 0,
            response_buffer_size: DEFAULT_RESPONSE_BUFFER_SIZE,
            dispatch_mode: DispatchMode::Sync,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Read deadline as a Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Write deadline, if one is configured
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    /// Reject settings the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.server_addr.is_empty() {
            return Err(EmuNwError::Config("server address is empty".to_string()));
        }
        if self.read_timeout_ms == 0 {
            // set_read_timeout rejects Some(ZERO)
            return Err(EmuNwError::Config("read timeout must be non-zero".to_string()));
        }
        if self.response_buffer_size == 0 {
            return Err(EmuNwError::Config(
                "response buffer size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the emulator address
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the response read deadline (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write deadline (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the response buffer size (in bytes)
    pub fn response_buffer_size(mut self, size: usize) -> Self {
        self.config.response_buffer_size = size;
        self
    }

    /// Select sync or pipelined dispatch
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.config.dispatch_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
