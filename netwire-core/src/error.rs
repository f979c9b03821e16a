//! Error types for netwire

use thiserror::Error;

/// Netwire error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not open the target process's network namespace
    #[error("cannot open network namespace of pid {pid}: {source}")]
    NamespaceResolution {
        /// Process whose namespace was requested
        pid: i32,
        /// Underlying open failure
        #[source]
        source: std::io::Error,
    },

    /// Socket connect, send, or receive failed
    #[error("transport error: {message}")]
    Transport {
        /// Error message
        message: String,
    },

    /// Malformed request or reply bytes
    #[error("protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// The daemon accepted the request and reported a failure.
    /// The message is the daemon's own diagnostic and is passed
    /// through to the operator verbatim.
    #[error("{message}")]
    DaemonReported {
        /// Daemon-supplied error message
        message: String,
    },

    /// Malformed invocation input (stdin document)
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// System error from nix
    #[error("system error: {0}")]
    System(#[from] nix::Error),
}

/// Result type alias for netwire operations
pub type Result<T> = std::result::Result<T, Error>;
