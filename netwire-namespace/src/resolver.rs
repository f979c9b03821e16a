//! Opening a handle to a target process's network namespace

use std::fs::{self, File};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::path::PathBuf;

use netwire_core::{Error, ProcessId, Result};

/// Capability naming the process whose namespace is being resolved.
///
/// The namespace owner is created and destroyed by an external actor (the
/// container runtime clones it with new namespace flags and exposes its
/// pid), so the resolver takes a pid-bearing handle rather than spawning
/// anything itself. Tests inject any namespace-bearing process they like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: ProcessId,
}

impl ProcessHandle {
    /// Create a handle for the given pid
    #[must_use]
    pub const fn new(pid: ProcessId) -> Self {
        Self { pid }
    }

    /// Handle for the current process
    #[must_use]
    pub fn current() -> Self {
        Self::new(ProcessId::current())
    }

    /// The target pid
    #[must_use]
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Per-process network namespace file path
    #[must_use]
    pub fn netns_path(&self) -> PathBuf {
        PathBuf::from(format!("/proc/{}/ns/net", self.pid))
    }
}

/// Open, exclusively owned reference to a network namespace.
///
/// Created by the resolver, borrowed by the transport for the send, and
/// dropped (closing the local descriptor) immediately after a successful
/// hand-off - the daemon holds its own, independent copy post-transfer.
#[derive(Debug)]
pub struct NetnsHandle {
    file: File,
}

impl NetnsHandle {
    /// Open a read-only handle to the process's network namespace.
    ///
    /// # Errors
    /// Returns `Error::NamespaceResolution` if the process does not exist,
    /// has exited, or its namespace file is not readable by the caller.
    pub fn open(process: &ProcessHandle) -> Result<Self> {
        let path = process.netns_path();

        let file = File::open(&path).map_err(|source| {
            tracing::error!(
                pid = %process.pid(),
                path = %path.display(),
                error = %source,
                "Failed to open network namespace"
            );
            Error::NamespaceResolution {
                pid: process.pid().as_raw(),
                source,
            }
        })?;

        tracing::debug!(
            pid = %process.pid(),
            fd = file.as_raw_fd(),
            "Opened network namespace handle"
        );

        Ok(Self { file })
    }

    /// Kernel identity of the namespace this handle refers to, e.g.
    /// `net:[4026531905]`. Mostly useful for diagnostics and tests.
    pub fn identity(&self) -> Result<String> {
        let link = fs::read_link(format!("/proc/self/fd/{}", self.file.as_raw_fd()))?;
        Ok(link.to_string_lossy().into_owned())
    }
}

impl AsFd for NetnsHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for NetnsHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netns_path_format() {
        let handle = ProcessHandle::new(ProcessId::from_raw(1234));
        assert_eq!(handle.netns_path(), PathBuf::from("/proc/1234/ns/net"));
    }

    #[test]
    fn test_open_own_namespace() {
        let netns = NetnsHandle::open(&ProcessHandle::current()).unwrap();

        let expected = fs::read_link("/proc/self/ns/net")
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(netns.identity().unwrap(), expected);
    }

    #[test]
    fn test_open_nonexistent_process() {
        // Pids are capped well below this on Linux
        let gone = ProcessHandle::new(ProcessId::from_raw(i32::MAX));
        let err = NetnsHandle::open(&gone).unwrap_err();

        assert!(matches!(
            err,
            Error::NamespaceResolution { pid, .. } if pid == i32::MAX
        ));
    }
}
