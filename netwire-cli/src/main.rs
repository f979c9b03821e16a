//! Netwire - container network-namespace hand-off plugin
//!
//! Invoked once per container lifecycle event to hand the container's
//! network namespace descriptor to the long-lived wiring daemon and relay
//! the daemon's reply to the invoking shell.

use clap::Parser;
use std::process;
use tracing::Level;

mod cli;
mod plugin;

use cli::Cli;
use netwire_core::Error;

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity. Stdout is reserved for the daemon
    // reply, so the subscriber writes to stderr.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = plugin::execute(&cli) {
        match e {
            // The daemon's message is the intended operator diagnostic -
            // pass it through unwrapped.
            Error::DaemonReported { message } => eprintln!("{message}"),
            other => eprintln!("Error: {other}"),
        }
        process::exit(1);
    }
}
