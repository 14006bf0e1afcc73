//! emunwcmd
//!
//! Sends commands to a running emulator and writes the raw responses to stdout.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use emunw::config::DEFAULT_SERVER_ADDR;
use emunw::protocol::CommandSpec;
use emunw::{Config, DispatchMode, Dispatcher, Result, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// emunwcmd
#[derive(Parser, Debug)]
#[command(name = "emunwcmd")]
#[command(about = "Send debug commands to an emulator over its network-access port")]
#[command(version)]
struct Args {
    /// Send all commands, then collect whatever responses arrived in one read
    #[arg(long = "async")]
    pipelined: bool,

    /// Attach this file to the last command
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Emulator address (host:port)
    #[arg(short, long, default_value = DEFAULT_SERVER_ADDR)]
    server: String,

    /// Response read deadline in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Commands as <command>[;arg;arg...][@file]
    #[arg(required = true, value_name = "COMMAND")]
    commands: Vec<String>,
}

fn main() -> ExitCode {
    // stdout carries responses; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,emunw=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut specs = args
        .commands
        .iter()
        .map(|s| s.parse::<CommandSpec>())
        .collect::<Result<Vec<_>>>()?;

    if let (Some(path), Some(last)) = (args.file, specs.last_mut()) {
        last.attach(path)?;
    }

    let mode = if args.pipelined {
        DispatchMode::Pipelined
    } else {
        DispatchMode::Sync
    };

    let config = Config::builder()
        .server_addr(&args.server)
        .read_timeout_ms(args.timeout_ms)
        .dispatch_mode(mode)
        .build();

    tracing::debug!("emunwcmd v{} -> {} ({:?})", emunw::VERSION, config.server_addr, mode);

    let session = Session::connect(&config)?;
    let mut dispatcher = Dispatcher::new(session, io::stdout().lock(), config.dispatch_mode);
    dispatcher.run(&specs)?;

    Ok(())
}
