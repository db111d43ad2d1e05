//! Low-level async NETLINK_ROUTE socket.

use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Receive buffer size; large enough for a full dump batch.
const RECV_BUF_SIZE: usize = 32768;

/// Async rtnetlink socket.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    seq: AtomicU32,
    pid: u32,
}

impl NetlinkSocket {
    /// Open a socket in the caller's network namespace.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Extended ACK is best effort; older kernels reject the option.
        socket.set_ext_ack(true).ok();

        Ok(Self {
            fd: AsyncFd::new(socket)?,
            seq: AtomicU32::new(1),
            pid,
        })
    }

    /// Open a socket inside the network namespace referred to by `ns_fd`.
    ///
    /// The calling thread enters the namespace for the duration of socket
    /// creation and then returns to its original namespace.
    pub fn new_in_namespace(ns_fd: RawFd) -> Result<Self> {
        let current_ns = File::open("/proc/self/ns/net")?;

        // SAFETY: ns_fd refers to an open namespace file supplied by the caller.
        if unsafe { libc::setns(ns_fd, libc::CLONE_NEWNET) } < 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }

        let result = Self::new();

        // SAFETY: current_ns was opened from /proc/self/ns/net above and is still open.
        if unsafe { libc::setns(current_ns.as_raw_fd(), libc::CLONE_NEWNET) } < 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "failed to restore original network namespace"
            );
        }

        result
    }

    /// Open a socket inside the namespace at `ns_path` (e.g. `/var/run/netns/<name>`).
    pub fn new_in_namespace_path<P: AsRef<Path>>(ns_path: P) -> Result<Self> {
        let ns_file = File::open(ns_path.as_ref())?;
        Self::new_in_namespace(ns_file.as_raw_fd())
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a message.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram, which may hold several netlink messages.
    pub async fn recv_msg(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);

        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(buf.to_vec());
                }
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
