//! Plugin orchestration: resolve, connect, send, receive, relay
//!
//! One forward-only pass per invocation. A failure at any step is terminal;
//! namespace resolution happens before any socket activity, so a resolution
//! failure is reported without ever contacting the daemon.

use std::io::{self, Write};
use std::os::fd::AsFd;
use std::time::Duration;

use tracing::{debug, info};

use netwire_core::{Error, Message, PluginInput, Reply, Result};
use netwire_namespace::{NetnsHandle, ProcessHandle};
use netwire_transport::DaemonClient;

use crate::cli::{Cli, Commands};

pub fn execute(args: &Cli) -> Result<()> {
    let deadline = Duration::from_secs(args.timeout);

    // Resolve the namespace first (up only) - stdin names the target.
    let (message, netns) = match args.command {
        Commands::Up => {
            let input = PluginInput::from_reader(io::stdin().lock())?;
            debug!(pid = %input.pid, "Resolving target network namespace");

            let netns = NetnsHandle::open(&ProcessHandle::new(input.pid))?;
            (Message::up(&input)?, Some(netns))
        }
        Commands::Down => (Message::down(), None),
    };

    info!(command = %message.command, socket = %args.socket.display(), "Contacting daemon");

    let mut client = DaemonClient::connect(&args.socket, Some(deadline))?;
    client.send_request(&message, netns.as_ref().map(AsFd::as_fd))?;

    // The daemon holds its own copy of the descriptor now; release ours.
    drop(netns);

    let raw = client.recv_reply()?;

    match Reply::decode(&raw)? {
        Reply::Success(bytes) => relay_success(&bytes),
        Reply::Failure(message) => Err(Error::DaemonReported { message }),
    }
}

/// Write the daemon's reply bytes to stdout verbatim.
///
/// Stdout carries nothing else - logging goes to stderr.
fn relay_success(bytes: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
