//! Dispatch Module
//!
//! Sequences a command list through a [`Transport`].
//!
//! ## Modes
//! - **Sync**: encode, write, read, emit; then the next command. Each
//!   response belongs to exactly one command.
//! - **Pipelined**: write every frame back to back, then a single read whose
//!   bytes are emitted as-is. Responses may be merged, cut off or missing
//!   entirely; this is fire-and-forget, not reliable delivery.
//!
//! ## Failure
//! The first error from any step ends the run in [`DispatchState::Failed`].
//! Work already done (frames written, responses emitted) is not undone.

use std::io::Write;

use bytes::Bytes;

use crate::attachment::load_attachment;
use crate::config::DispatchMode;
use crate::error::{EmuNwError, Result};
use crate::network::Transport;
use crate::protocol::{encode_frame, CommandSpec, Frame, Reply};

/// Where a dispatcher is in its run
///
/// There is no idle state: a dispatcher is built around a transport that
/// is already connected (see [`crate::Session::connect`]), so it starts in
/// `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Transport ready, nothing sent yet
    Connected,
    /// Writing frames (and, in sync mode, reading their responses)
    Dispatching,
    /// Pipelined mode: all frames written, waiting on the batch read
    Collecting,
    Done,
    Failed,
}

/// What a completed run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub frames_written: usize,
    pub responses_emitted: usize,
    pub bytes_emitted: usize,
}

/// Drives one command list over a transport, emitting responses to `out`
pub struct Dispatcher<T, W> {
    transport: T,
    out: W,
    mode: DispatchMode,
    state: DispatchState,
    report: DispatchReport,
}

impl<T: Transport, W: Write> Dispatcher<T, W> {
    pub fn new(transport: T, out: W, mode: DispatchMode) -> Self {
        Self {
            transport,
            out,
            mode,
            state: DispatchState::Connected,
            report: DispatchReport::default(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Counters so far; still meaningful after a failed run
    pub fn report(&self) -> DispatchReport {
        self.report
    }

    /// Give back the transport and output sink
    pub fn into_parts(self) -> (T, W) {
        (self.transport, self.out)
    }

    /// Run the command list to completion or to the first error
    ///
    /// A dispatcher runs once; calling this again is a `Config` error.
    pub fn run(&mut self, specs: &[CommandSpec]) -> Result<DispatchReport> {
        if self.state != DispatchState::Connected {
            return Err(EmuNwError::Config(format!(
                "dispatcher already ran (state {:?})",
                self.state
            )));
        }

        self.state = DispatchState::Dispatching;
        let result = match self.mode {
            DispatchMode::Sync => self.run_sync(specs),
            DispatchMode::Pipelined => self.run_pipelined(specs),
        };

        match result {
            Ok(()) => {
                self.state = DispatchState::Done;
                tracing::debug!(
                    "Dispatch done: {} frame(s), {} response(s), {} byte(s)",
                    self.report.frames_written,
                    self.report.responses_emitted,
                    self.report.bytes_emitted
                );
                Ok(self.report)
            }
            Err(e) => {
                self.state = DispatchState::Failed;
                tracing::debug!(
                    "Dispatch failed after {} frame(s): {}",
                    self.report.frames_written,
                    e
                );
                Err(e)
            }
        }
    }

    fn run_sync(&mut self, specs: &[CommandSpec]) -> Result<()> {
        for spec in specs {
            self.send(spec)?;
            let response = self.transport.read_response()?;
            self.emit(&response)?;
        }
        Ok(())
    }

    fn run_pipelined(&mut self, specs: &[CommandSpec]) -> Result<()> {
        for spec in specs {
            self.send(spec)?;
        }

        self.state = DispatchState::Collecting;
        let response = self.transport.read_response()?;
        self.emit(&response)
    }

    /// Load the attachment (if any), encode and write one command
    fn send(&mut self, spec: &CommandSpec) -> Result<()> {
        let frame = build_frame(spec)?;
        tracing::debug!("Sending {} ({} bytes)", spec.command, frame.len());
        self.transport.write_frame(&frame)?;
        self.report.frames_written += 1;
        Ok(())
    }

    fn emit(&mut self, response: &Bytes) -> Result<()> {
        let reply = Reply::parse(response);
        tracing::debug!("Received {} bytes: {}", response.len(), reply);
        if let Reply::Error(message) = &reply {
            tracing::warn!("Emulator reported an error: {}", message);
        }
        if reply.is_incomplete() || response.is_empty() {
            tracing::debug!("Response looks partial");
        }

        self.out.write_all(response).map_err(EmuNwError::Output)?;
        self.out.flush().map_err(EmuNwError::Output)?;

        self.report.responses_emitted += 1;
        self.report.bytes_emitted += response.len();
        Ok(())
    }
}

/// Encode one command spec, reading its attachment file first
pub fn build_frame(spec: &CommandSpec) -> Result<Frame> {
    let attachment = spec
        .attachment
        .as_deref()
        .map(load_attachment)
        .transpose()?;
    encode_frame(&spec.command, attachment.as_deref())
}
