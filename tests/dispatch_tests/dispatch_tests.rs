//! Tests for the Dispatcher
//!
//! These tests verify:
//! - Sync mode interleaves one read after every write
//! - Pipelined mode reads once, after all writes
//! - Attachments are loaded lazily and failures stop the run
//! - Timeouts end the run without emitting anything for that command

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use bytes::Bytes;
use emunw::protocol::{decode_frame, Command, CommandSpec, Frame};
use emunw::{
    DispatchMode, DispatchReport, DispatchState, Dispatcher, EmuNwError, ErrorKind, Result,
    Transport,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Write(String),
    Read,
}

/// Records every call and replays scripted responses
#[derive(Default)]
struct RecordingTransport {
    ops: Vec<Op>,
    frames: Vec<Frame>,
    responses: VecDeque<Result<Bytes>>,
}

impl RecordingTransport {
    fn replying(responses: impl IntoIterator<Item = &'static [u8]>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|r| Ok(Bytes::from_static(r)))
                .collect(),
            ..Default::default()
        }
    }

    fn writes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Write(_))).count()
    }

    fn reads(&self) -> usize {
        self.ops.iter().filter(|op| **op == Op::Read).count()
    }
}

impl Transport for RecordingTransport {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let (decoded, _) = decode_frame(frame.as_bytes())?;
        self.ops.push(Op::Write(decoded.command.verb().to_string()));
        self.frames.push(frame.clone());
        Ok(())
    }

    fn read_response(&mut self) -> Result<Bytes> {
        self.ops.push(Op::Read);
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(EmuNwError::Timeout(Duration::from_secs(1))))
    }
}

/// An output sink that rejects every write
struct ClosedSink;

impl Write for ClosedSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }
}

fn specs(list: &[&str]) -> Vec<CommandSpec> {
    list.iter().map(|s| s.parse().unwrap()).collect()
}

fn write(verb: &str) -> Op {
    Op::Write(verb.to_string())
}

// =============================================================================
// Sync Mode Tests
// =============================================================================

#[test]
fn test_sync_interleaves_reads() {
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..], b"\nok\n\n", b"\nok\n\n"]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);

    let report = dispatcher.run(&specs(&["A", "B;1", "C;1;2"])).unwrap();
    assert_eq!(
        report,
        DispatchReport {
            frames_written: 3,
            responses_emitted: 3,
            bytes_emitted: 15,
        }
    );
    assert_eq!(dispatcher.state(), DispatchState::Done);

    let (transport, out) = dispatcher.into_parts();
    assert_eq!(
        transport.ops,
        vec![write("A"), Op::Read, write("B"), Op::Read, write("C"), Op::Read]
    );
    assert_eq!(out, b"\nok\n\n\nok\n\n\nok\n\n");
}

#[test]
fn test_sync_emits_responses_unmodified() {
    let binary: &'static [u8] = b"\x00\x00\x00\x00\x02\xFF\x00";
    let transport = RecordingTransport::replying([binary, b"\nerror:no game loaded\n\n"]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);

    dispatcher
        .run(&specs(&["CORE_READ;WRAM;$0;2", "EMU_RESUME"]))
        .unwrap();

    let (_, out) = dispatcher.into_parts();
    let mut expected = binary.to_vec();
    expected.extend_from_slice(b"\nerror:no game loaded\n\n");
    assert_eq!(out, expected);
}

#[test]
fn test_sync_timeout_stops_run() {
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);

    let err = dispatcher.run(&specs(&["A", "B", "C"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(dispatcher.state(), DispatchState::Failed);
    assert_eq!(dispatcher.report().responses_emitted, 1);

    let (transport, out) = dispatcher.into_parts();
    assert_eq!(transport.ops, vec![write("A"), Op::Read, write("B"), Op::Read]);
    // Nothing emitted for B
    assert_eq!(out, b"\nok\n\n");
}

// =============================================================================
// Pipelined Mode Tests
// =============================================================================

#[test]
fn test_pipelined_reads_once_after_all_writes() {
    let transport = RecordingTransport::replying([&b"\nok\n\n\nok\n\n"[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Pipelined);

    let report = dispatcher.run(&specs(&["A", "B", "C"])).unwrap();
    assert_eq!(report.frames_written, 3);
    assert_eq!(report.responses_emitted, 1);

    let (transport, out) = dispatcher.into_parts();
    assert_eq!(
        transport.ops,
        vec![write("A"), write("B"), write("C"), Op::Read]
    );
    // Best effort: only what the one read returned, even if a reply is missing
    assert_eq!(out, b"\nok\n\n\nok\n\n");
}

#[test]
fn test_pipelined_timeout_emits_nothing() {
    let transport = RecordingTransport::default();
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Pipelined);

    let err = dispatcher.run(&specs(&["A", "B"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(dispatcher.state(), DispatchState::Failed);

    let (transport, out) = dispatcher.into_parts();
    assert_eq!(transport.writes(), 2);
    assert_eq!(transport.reads(), 1);
    assert!(out.is_empty());
}

#[test]
fn test_pipelined_empty_list_still_reads() {
    let transport = RecordingTransport::replying([&b""[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Pipelined);

    dispatcher.run(&[]).unwrap();
    let (transport, _) = dispatcher.into_parts();
    assert_eq!(transport.ops, vec![Op::Read]);
}

// =============================================================================
// Attachment Tests
// =============================================================================

#[test]
fn test_attachment_is_framed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.wasm");
    fs::write(&path, b"\0asm\x01\0\0\0").unwrap();

    let spec = format!("WASM_LOAD;test@{}", path.display());
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);
    dispatcher.run(&specs(&[spec.as_str()])).unwrap();

    let (transport, _) = dispatcher.into_parts();
    let (decoded, _) = decode_frame(transport.frames[0].as_bytes()).unwrap();
    assert_eq!(decoded.command, Command::new("WASM_LOAD", ["test"]));
    assert_eq!(decoded.attachment.as_deref(), Some(&b"\0asm\x01\0\0\0"[..]));
}

#[test]
fn test_attachment_failure_aborts_remaining_commands() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.bin");

    let list = ["A".to_string(), format!("B@{}", missing.display()), "C".to_string()];
    let list: Vec<&str> = list.iter().map(String::as_str).collect();

    let transport = RecordingTransport::replying([&b"\nok\n\n"[..], b"\nok\n\n"]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);
    let err = dispatcher.run(&specs(&list)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::File);
    assert_eq!(dispatcher.state(), DispatchState::Failed);

    let (transport, out) = dispatcher.into_parts();
    // A completed; nothing for B or C was written
    assert_eq!(transport.ops, vec![write("A"), Op::Read]);
    assert_eq!(out, b"\nok\n\n");
}

#[test]
fn test_output_failure_stops_run() {
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..], b"\nok\n\n"]);
    let mut dispatcher = Dispatcher::new(transport, ClosedSink, DispatchMode::Sync);

    let err = dispatcher.run(&specs(&["A", "B"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Output);
    assert_eq!(dispatcher.state(), DispatchState::Failed);
    assert_eq!(dispatcher.report().frames_written, 1);
    assert_eq!(dispatcher.report().responses_emitted, 0);

    let (transport, _) = dispatcher.into_parts();
    assert_eq!(transport.ops, vec![write("A"), Op::Read]);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_encode_failure_fails_run() {
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);
    let bad = CommandSpec::new(Command::bare("BAD\nVERB"), None);

    let err = dispatcher.run(&[bad]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    let (transport, _) = dispatcher.into_parts();
    assert!(transport.ops.is_empty());
}

#[test]
fn test_dispatcher_runs_once() {
    let transport = RecordingTransport::replying([&b"\nok\n\n"[..]]);
    let mut dispatcher = Dispatcher::new(transport, Vec::new(), DispatchMode::Sync);
    assert_eq!(dispatcher.state(), DispatchState::Connected);

    dispatcher.run(&specs(&["A"])).unwrap();
    let err = dispatcher.run(&specs(&["A"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(dispatcher.state(), DispatchState::Done);
}
