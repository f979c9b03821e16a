//! Network namespace resolution
//!
//! This crate opens a handle to another process's network namespace so it
//! can be handed to the wiring daemon. It never creates namespaces - the
//! container runtime that cloned the target process owns that.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod resolver;

pub use resolver::{NetnsHandle, ProcessHandle};
