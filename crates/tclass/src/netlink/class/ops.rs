//! Class verbs over a [`Transport`].

use super::decode::decode_dump;
use super::encode::{ClassCommand, encode_class, encode_list_request};
use super::Class;
use crate::netlink::error::Result;
use crate::netlink::interface_ref::InterfaceRef;
use crate::netlink::transport::Transport;
use crate::tc::PschedClock;
use crate::tc::handle;

/// Class operations bound to a transport and a scheduler clock.
///
/// Each verb builds exactly one request and awaits one transport call.
/// Errors from the transport are returned as they are.
///
/// ```ignore
/// let conn = Connection::new()?;
/// let classes = conn.classes();
///
/// for class in classes.list(Some(&"eth0".into()), 0).await? {
///     println!("{}", class);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Classes<T> {
    transport: T,
    clock: PschedClock,
}

impl<T: Transport> Classes<T> {
    pub fn new(transport: T, clock: PschedClock) -> Self {
        Self { transport, clock }
    }

    /// Clock used for rate tables.
    pub fn clock(&self) -> &PschedClock {
        &self.clock
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a class. Fails if a class with the same handle exists.
    pub async fn add(&self, class: &Class) -> Result<()> {
        self.send(ClassCommand::Add, class).await
    }

    /// Modify an existing class.
    pub async fn change(&self, class: &Class) -> Result<()> {
        self.send(ClassCommand::Change, class).await
    }

    /// Create a class or modify it if it already exists.
    pub async fn replace(&self, class: &Class) -> Result<()> {
        self.send(ClassCommand::Replace, class).await
    }

    /// Delete a class. Only link, handle and parent are sent.
    pub async fn del(&self, class: &Class) -> Result<()> {
        self.send(ClassCommand::Delete, class).await
    }

    /// List classes on `link` (all links when `None`) under `parent`
    /// (all parents when 0).
    ///
    /// `parent` must equal a class's parent handle exactly. Passing the qdisc
    /// handle `1:` keeps its direct children only; nested classes such as
    /// `1:10` under `1:1` are dropped.
    pub async fn list(&self, link: Option<&InterfaceRef>, parent: u32) -> Result<Vec<Class>> {
        let ifindex = match link {
            Some(link) => link.resolve()? as i32,
            None => 0,
        };

        tracing::debug!(
            ifindex,
            parent = %handle::format(parent),
            "class list"
        );

        let responses = self
            .transport
            .dump(encode_list_request(ifindex, parent))
            .await?;
        decode_dump(&responses, parent)
    }

    async fn send(&self, cmd: ClassCommand, class: &Class) -> Result<()> {
        let builder = encode_class(cmd, class, &self.clock)?;

        let attrs = class.attrs();
        tracing::debug!(
            ifindex = attrs.link_index,
            handle = %handle::format(attrs.handle),
            parent = %handle::format(attrs.parent),
            kind = class.kind(),
            "class {}",
            cmd.as_str()
        );

        self.transport.request_ack(builder).await
    }
}
