//! Wire envelope and reply codec for the daemon protocol
//!
//! One invocation sends exactly one [`Message`] over the daemon socket and
//! reads exactly one reply document back. The envelope carries the command
//! tag plus an opaque JSON text payload; for `up` the payload is the target
//! pid exactly as supplied on stdin.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

use crate::{Error, ProcessId, Result};

/// Container lifecycle command carried in the envelope.
///
/// Serializes as exactly `"up"` / `"down"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Wire the container network up
    Up,
    /// Tear the container network down
    Down,
}

impl Command {
    /// Wire form of the command tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request envelope sent to the daemon.
///
/// `data` is opaque JSON text carried as a string field; the daemon decodes
/// it without out-of-band context. It is always valid JSON, even when
/// semantically empty (`down` carries `"{}"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Command tag
    #[serde(rename = "Command")]
    pub command: Command,
    /// Opaque command-specific payload (JSON text)
    #[serde(rename = "Data")]
    pub data: String,
}

impl Message {
    /// Build the `up` envelope, carrying the target pid under the fixed
    /// `Pid` field name.
    ///
    /// # Errors
    /// Returns `Error::Protocol` if the payload cannot be serialized.
    pub fn up(input: &PluginInput) -> Result<Self> {
        let data = serde_json::to_string(input).map_err(|e| Error::Protocol {
            message: format!("failed to encode up payload: {e}"),
        })?;
        Ok(Self {
            command: Command::Up,
            data,
        })
    }

    /// Build the `down` envelope with a semantically empty payload.
    #[must_use]
    pub fn down() -> Self {
        Self {
            command: Command::Down,
            data: "{}".to_string(),
        }
    }

    /// Encode the envelope to canonical JSON bytes.
    ///
    /// # Errors
    /// Returns `Error::Protocol` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Protocol {
            message: format!("failed to encode message: {e}"),
        })
    }

    /// Decode an envelope from JSON bytes. Inverse of [`Message::encode`].
    ///
    /// # Errors
    /// Returns `Error::Protocol` on malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Protocol {
            message: format!("failed to decode message: {e}"),
        })
    }
}

/// Invocation input read once from stdin on the `up` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInput {
    /// Process whose network namespace is handed to the daemon
    #[serde(rename = "Pid")]
    pub pid: ProcessId,
}

impl PluginInput {
    /// Read and decode the stdin document.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the document is missing or malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| Error::InvalidInput {
            message: format!("expected {{\"Pid\": <integer>}} on stdin: {e}"),
        })
    }
}

/// Daemon reply, classified into exactly one of two variants.
///
/// The daemon reports failure by populating an `Error` field; anything
/// else that parses as JSON is a success whose raw bytes are relayed to
/// the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Daemon accepted the request; raw reply bytes, relayed verbatim
    Success(Vec<u8>),
    /// Daemon reported a business-level failure
    Failure(String),
}

impl Reply {
    /// Classify raw reply bytes.
    ///
    /// A JSON document with a non-empty string `Error` field is a
    /// [`Reply::Failure`]; any other valid JSON document is a
    /// [`Reply::Success`] carrying the bytes verbatim.
    ///
    /// # Errors
    /// Returns `Error::Protocol` if the bytes are not a JSON document.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| Error::Protocol {
                message: format!("malformed daemon reply: {e}"),
            })?;

        match value.get("Error") {
            Some(serde_json::Value::String(message)) if !message.is_empty() => {
                Ok(Self::Failure(message.clone()))
            }
            _ => Ok(Self::Success(bytes.to_vec())),
        }
    }
}
