//! # emunw
//!
//! Client for an emulator's network-access debug channel:
//! - Text command frames with optional length-prefixed binary attachments
//! - One TCP session per run to the emulator on the loopback interface
//! - Sync (one response per command) or pipelined (one read per batch) dispatch
//! - Fail-fast: the first error ends the run
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Dispatcher                                │
//! │            (Sync or Pipelined command list)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Attachment  │          │   Frame     │
//!   │  (file)     │────────▶ │  Encoder    │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Session   │
//!                           │ (TCP 65400) │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod attachment;
pub mod network;
pub mod dispatch;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmuNwError, ErrorKind, Result};
pub use config::{Config, DispatchMode};
pub use dispatch::{DispatchReport, DispatchState, Dispatcher};
pub use network::{Session, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of emunw
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
