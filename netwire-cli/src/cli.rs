//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "netwire")]
#[command(
    about = "Hand a container's network namespace to the wiring daemon",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Path to the network daemon's Unix socket
    #[arg(long)]
    pub socket: PathBuf,

    /// Deadline in seconds for the daemon send and reply read
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
pub enum Commands {
    /// Wire the container network up (reads {"Pid": <integer>} from stdin)
    Up,

    /// Tear the container network down
    Down,
}
