//! Netwire Core - Foundation types, errors, and the wire codec
//!
//! This crate provides the core abstractions used throughout netwire.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod message;
pub mod types;

pub use error::{Error, Result};
pub use message::{Command, Message, PluginInput, Reply};
pub use types::ProcessId;
