//! rtnetlink connection with request/ACK and dump handling.

use std::path::Path;

use super::builder::MessageBuilder;
use super::class::Classes;
use super::error::{Error, Result};
use super::message::{MessageIter, NLMSG_HDRLEN, NlMsgError};
use super::socket::NetlinkSocket;
use super::transport::Transport;
use crate::tc::PschedClock;

/// High-level rtnetlink connection.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Open a connection in the caller's network namespace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Open a connection inside the namespace at `ns_path`.
    ///
    /// ```ignore
    /// let conn = Connection::new_in_namespace_path("/var/run/netns/lab")?;
    /// ```
    pub fn new_in_namespace_path<P: AsRef<Path>>(ns_path: P) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new_in_namespace_path(ns_path)?,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Class operations over this connection, using the running kernel's
    /// scheduler clock.
    pub fn classes(&self) -> Classes<&Self> {
        Classes::new(self, PschedClock::from_system())
    }

    /// Send a request that expects an ACK only (no data response).
    pub async fn request_ack(&self, mut builder: MessageBuilder) -> Result<()> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        loop {
            let response = self.socket.recv_msg().await?;
            if self.process_ack(&response, seq)? {
                return Ok(());
            }
        }
    }

    /// Send a dump request and collect all responses.
    pub async fn dump(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        let mut responses = Vec::new();

        loop {
            let data = self.socket.recv_msg().await?;

            for result in MessageIter::new(&data) {
                let (header, message) = result?;

                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_error() {
                    check_error(&message[NLMSG_HDRLEN..])?;
                    continue;
                }

                if header.is_done() {
                    return Ok(responses);
                }

                responses.push(message.to_vec());
            }
        }
    }

    /// Scan one datagram for the ACK matching `expected_seq`.
    ///
    /// Returns `Ok(true)` once the ACK was found.
    fn process_ack(&self, data: &[u8], expected_seq: u32) -> Result<bool> {
        for result in MessageIter::new(data) {
            let (header, message) = result?;

            if header.nlmsg_seq != expected_seq {
                continue;
            }

            if header.is_error() {
                check_error(&message[NLMSG_HDRLEN..])?;
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn check_error(payload: &[u8]) -> Result<()> {
    let err = NlMsgError::from_bytes(payload)?;
    if err.is_ack() {
        return Ok(());
    }

    if let Some(ext) = NlMsgError::ext_message(payload) {
        tracing::debug!(errno = -err.error, "kernel: {}", ext);
    }
    Err(Error::from_errno(err.error))
}

impl Transport for Connection {
    async fn request_ack(&self, builder: MessageBuilder) -> Result<()> {
        Connection::request_ack(self, builder).await
    }

    async fn dump(&self, builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        Connection::dump(self, builder).await
    }
}
