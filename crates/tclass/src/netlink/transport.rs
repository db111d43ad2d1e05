//! The seam between the class codec and whatever moves bytes to the kernel.

use std::future::Future;

use super::builder::MessageBuilder;
use super::error::Result;

/// Request/response exchange with the kernel.
///
/// Implementations own sequencing, port ids, multi-part reassembly and
/// error-message decoding. [`Connection`](super::Connection) is the real
/// implementation; tests substitute an in-memory one.
pub trait Transport {
    /// Send a request and wait for its acknowledgement.
    ///
    /// A negative kernel ACK surfaces as [`Error::Kernel`](super::Error::Kernel).
    fn request_ack(&self, builder: MessageBuilder) -> impl Future<Output = Result<()>>;

    /// Send a dump request and collect every response message.
    ///
    /// Each element is one complete netlink message, header included. The
    /// terminating `NLMSG_DONE` is not returned.
    fn dump(&self, builder: MessageBuilder) -> impl Future<Output = Result<Vec<Vec<u8>>>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request_ack(&self, builder: MessageBuilder) -> impl Future<Output = Result<()>> {
        (**self).request_ack(builder)
    }

    fn dump(&self, builder: MessageBuilder) -> impl Future<Output = Result<Vec<Vec<u8>>>> {
        (**self).dump(builder)
    }
}
