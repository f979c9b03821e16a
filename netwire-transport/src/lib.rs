//! Single-shot Unix-socket transport to the network daemon
//!
//! Sends one request envelope - with the network namespace descriptor
//! attached as SCM_RIGHTS ancillary data on the same `sendmsg` call - and
//! reads one reply document back. Connections are never pooled or reused.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod client;

pub use client::DaemonClient;
