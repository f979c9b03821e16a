//! Single-shot client connection to the daemon socket

use std::io::{self, IoSlice, Read, Write};
use std::net::Shutdown;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags};

use netwire_core::{Error, Message, Result};

/// Client side of the daemon protocol: one connection, one request,
/// one reply, then closed.
///
/// Operates in blocking mode with a bounded read/write deadline on the
/// connected stream, so a daemon that never reads or replies surfaces as
/// a transport error instead of hanging the invocation forever.
#[derive(Debug)]
pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect to the daemon socket at `path`.
    ///
    /// Connect on a Unix socket completes synchronously; the deadline
    /// bounds the subsequent send and reply read.
    ///
    /// # Errors
    /// Returns `Error::Transport` if the socket path is absent, nothing is
    /// listening, or the deadline cannot be configured.
    pub fn connect(path: &Path, deadline: Option<Duration>) -> Result<Self> {
        let stream = UnixStream::connect(path).map_err(|e| Error::Transport {
            message: format!("connect to daemon socket {}: {e}", path.display()),
        })?;

        stream
            .set_read_timeout(deadline)
            .and_then(|()| stream.set_write_timeout(deadline))
            .map_err(|e| Error::Transport {
                message: format!("set daemon socket deadline: {e}"),
            })?;

        tracing::debug!(socket = %path.display(), "Connected to daemon");

        Ok(Self { stream })
    }

    /// Send the request envelope, attaching `netns` when present.
    ///
    /// With a descriptor, the full payload and the descriptor go out in a
    /// single `sendmsg` call: the daemon performs one read-with-ancillary
    /// call and must find the descriptor on the identical read that yields
    /// the command bytes. Splitting them across writes would lose the
    /// descriptor on the receiving side.
    ///
    /// The write half is shut down afterwards so the daemon observes
    /// end-of-request.
    ///
    /// # Errors
    /// Returns `Error::Transport` if the send fails or times out.
    pub fn send_request(
        &mut self,
        message: &Message,
        netns: Option<BorrowedFd<'_>>,
    ) -> Result<()> {
        let payload = message.encode()?;

        match netns {
            Some(fd) => self.send_with_fd(&payload, fd)?,
            None => self
                .stream
                .write_all(&payload)
                .map_err(|e| transport_io("send request", &e))?,
        }

        self.stream
            .shutdown(Shutdown::Write)
            .map_err(|e| transport_io("shutdown write half", &e))?;

        tracing::debug!(
            command = %message.command,
            bytes = payload.len(),
            attached_fd = netns.is_some(),
            "Request sent"
        );

        Ok(())
    }

    /// Atomic payload + descriptor send via `sendmsg` + SCM_RIGHTS.
    ///
    /// The kernel duplicates the descriptor into the receiving process; the
    /// local copy stays open and is the caller's to close after the send.
    fn send_with_fd(&mut self, payload: &[u8], fd: BorrowedFd<'_>) -> Result<()> {
        let iov = [IoSlice::new(payload)];
        let fds = [fd.as_raw_fd()];
        let cmsgs = [ControlMessage::ScmRights(&fds)];

        let sent = sendmsg::<()>(
            self.stream.as_raw_fd(),
            &iov,
            &cmsgs,
            MsgFlags::empty(),
            None,
        )
        .map_err(|e| Error::Transport {
            message: format!("sendmsg to daemon: {e}"),
        })?;

        // The descriptor rides with the first in-band byte. Not expected at
        // these payload sizes on AF_UNIX, but finish any remainder plainly.
        if sent < payload.len() {
            self.stream
                .write_all(&payload[sent..])
                .map_err(|e| transport_io("send request remainder", &e))?;
        }

        Ok(())
    }

    /// Read the daemon's reply: accumulate until the bytes form a complete
    /// JSON document or the peer closes the connection.
    ///
    /// # Errors
    /// Returns `Error::Transport` on read failure or deadline expiry, and
    /// `Error::Protocol` if the peer closes without sending a reply.
    pub fn recv_reply(&mut self) -> Result<Vec<u8>> {
        let mut reply = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = self
                .stream
                .read(&mut buf)
                .map_err(|e| transport_io("read daemon reply", &e))?;
            if n == 0 {
                break;
            }
            reply.extend_from_slice(&buf[..n]);

            if serde_json::from_slice::<serde_json::Value>(&reply).is_ok() {
                break;
            }
        }

        if reply.is_empty() {
            return Err(Error::Protocol {
                message: "daemon closed the connection without a reply".to_string(),
            });
        }

        tracing::debug!(bytes = reply.len(), "Reply received");

        Ok(reply)
    }
}

fn transport_io(operation: &str, e: &io::Error) -> Error {
    let message = match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            format!("{operation}: deadline exceeded waiting for daemon")
        }
        _ => format!("{operation}: {e}"),
    };
    Error::Transport { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwire_core::{PluginInput, ProcessId};
    use nix::cmsg_space;
    use nix::sys::socket::{recvmsg, ControlMessageOwned};
    use std::fs::File;
    use std::io::IoSliceMut;
    use std::os::fd::{AsFd, RawFd};
    use std::thread;

    /// Receive one message from `stream`, extracting any SCM_RIGHTS
    /// ancillary descriptors, the way the daemon does: a single
    /// read-with-ancillary-data call.
    fn recv_with_fds(stream: &UnixStream) -> (Vec<u8>, Vec<RawFd>) {
        let mut buf = vec![0u8; 4096];
        let mut cmsg_buf = cmsg_space!([RawFd; 1]);

        let (n, fds) = {
            let mut iov = [IoSliceMut::new(&mut buf)];
            let msg = recvmsg::<()>(
                stream.as_raw_fd(),
                &mut iov,
                Some(&mut cmsg_buf),
                MsgFlags::empty(),
            )
            .unwrap();

            let mut fds = Vec::new();
            for cmsg in msg.cmsgs().unwrap() {
                if let ControlMessageOwned::ScmRights(received) = cmsg {
                    fds.extend(received);
                }
            }
            (msg.bytes, fds)
        };

        (buf[..n].to_vec(), fds)
    }

    fn client_for(stream: UnixStream) -> DaemonClient {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        DaemonClient { stream }
    }

    #[test]
    fn test_connect_fails_on_absent_socket() {
        let dir = tempfile::tempdir().unwrap();
        let err = DaemonClient::connect(&dir.path().join("absent.sock"), None).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_send_request_without_fd() {
        let (local, remote) = UnixStream::pair().unwrap();
        let mut client = client_for(local);

        client.send_request(&Message::down(), None).unwrap();

        let (data, fds) = recv_with_fds(&remote);
        assert!(fds.is_empty(), "down must not attach a descriptor");

        let message = Message::decode(&data).unwrap();
        assert_eq!(message, Message::down());
    }

    #[test]
    fn test_send_request_attaches_fd_to_same_read() {
        let (local, remote) = UnixStream::pair().unwrap();
        let mut client = client_for(local);

        let netns = File::open("/proc/self/ns/net").unwrap();
        let input = PluginInput {
            pid: ProcessId::current(),
        };
        let message = Message::up(&input).unwrap();

        client
            .send_request(&message, Some(netns.as_fd()))
            .unwrap();

        // One read must yield both the command bytes and the descriptor.
        let (data, fds) = recv_with_fds(&remote);
        assert_eq!(Message::decode(&data).unwrap(), message);
        assert_eq!(fds.len(), 1, "expected exactly one attached descriptor");

        let received = fds[0];
        let target = std::fs::read_link(format!("/proc/self/fd/{received}")).unwrap();
        let expected = std::fs::read_link("/proc/self/ns/net").unwrap();
        assert_eq!(target, expected);

        unsafe { libc::close(received) };
    }

    #[test]
    fn test_received_fd_survives_local_close() {
        let (local, remote) = UnixStream::pair().unwrap();
        let mut client = client_for(local);

        let netns = File::open("/proc/self/ns/net").unwrap();
        client
            .send_request(&Message::down(), Some(netns.as_fd()))
            .unwrap();

        // Sender closes its copy right after the send, as the plugin does.
        drop(netns);

        let (_, fds) = recv_with_fds(&remote);
        assert_eq!(fds.len(), 1);
        let received = fds[0];

        // The kernel duplicated the descriptor; it must still resolve.
        assert!(std::fs::read_link(format!("/proc/self/fd/{received}")).is_ok());

        unsafe { libc::close(received) };
    }

    #[test]
    fn test_recv_reply_reads_complete_document() {
        let (local, remote) = UnixStream::pair().unwrap();
        let mut client = client_for(local);

        let writer = thread::spawn(move || {
            let mut remote = remote;
            // Two chunks; the client must accumulate until the document
            // parses, without waiting for EOF.
            remote.write_all(br#"{"Here":"#).unwrap();
            remote.write_all(br#""Be Dragons"}"#).unwrap();
            remote
        });

        let reply = client.recv_reply().unwrap();
        assert_eq!(reply, br#"{"Here":"Be Dragons"}"#.to_vec());
        drop(writer.join().unwrap());
    }

    #[test]
    fn test_recv_reply_empty_close_is_protocol_error() {
        let (local, remote) = UnixStream::pair().unwrap();
        let mut client = client_for(local);

        drop(remote);

        assert!(matches!(
            client.recv_reply().unwrap_err(),
            Error::Protocol { .. }
        ));
    }

    #[test]
    fn test_recv_reply_deadline_expires() {
        let (local, _remote) = UnixStream::pair().unwrap();
        local
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let mut client = DaemonClient { stream: local };

        let err = client.recv_reply().unwrap_err();
        assert!(
            matches!(&err, Error::Transport { message } if message.contains("deadline")),
            "got: {err}"
        );
    }
}
