//! Network Module
//!
//! TCP session with the emulator.
//!
//! ## Model
//! - One connection per client run, never shared
//! - Frames written in command order
//! - Each response read is a single `read` bounded by a deadline

mod session;

pub use session::{Session, Transport};
