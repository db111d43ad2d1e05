//! Common test utilities for integration tests.
//!
//! Provides `TestNamespace` for isolated network namespace testing and the
//! `require_root!` guard.

use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

use tclass::netlink::{Connection, InterfaceRef};
use tclass::{Error, Result};

/// Global counter for unique namespace names.
static NAMESPACE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique namespace name for this test.
fn unique_ns_name(prefix: &str) -> String {
    let id = NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    format!("tclass-test-{}-{}-{}", prefix, pid, id)
}

/// A test network namespace, deleted on drop.
pub struct TestNamespace {
    name: String,
}

impl TestNamespace {
    /// Create a new namespace with a unique name derived from `prefix`.
    pub fn new(prefix: &str) -> Result<Self> {
        let name = unique_ns_name(prefix);

        let status = Command::new("ip")
            .args(["netns", "add", &name])
            .status()
            .map_err(|e| Error::Io(io::Error::from(e.kind())))?;

        if !status.success() {
            return Err(Error::InvalidMessage(format!(
                "failed to create namespace: {}",
                name
            )));
        }

        Ok(Self { name })
    }

    fn path(&self) -> PathBuf {
        PathBuf::from("/var/run/netns").join(&self.name)
    }

    /// Open a connection inside this namespace.
    pub fn connection(&self) -> Result<Connection> {
        Connection::new_in_namespace_path(self.path())
    }

    /// Run a command in the namespace and return its output.
    pub fn exec(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = Command::new("ip")
            .args(["netns", "exec", &self.name, cmd])
            .args(args)
            .output()
            .map_err(|e| Error::Io(io::Error::from(e.kind())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::InvalidMessage(format!(
                "command failed: {} {:?}: {}",
                cmd, args, stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Add a dummy interface, bring it up and return its index.
    ///
    /// Sysfs in the test process shows the host namespace, so the index is
    /// read from inside the namespace.
    pub fn add_dummy(&self, name: &str) -> Result<InterfaceRef> {
        self.exec("ip", &["link", "add", name, "type", "dummy"])?;
        self.exec("ip", &["link", "set", name, "up"])?;

        let path = format!("/sys/class/net/{}/ifindex", name);
        let index = self
            .exec("cat", &[&path])?
            .trim()
            .parse()
            .map_err(|_| Error::InvalidMessage(format!("bad ifindex for {}", name)))?;

        Ok(InterfaceRef::Index(index))
    }

    /// Install a root qdisc with handle 1: on `dev`.
    pub fn add_root_qdisc(&self, dev: &str, kind: &str) -> Result<()> {
        self.exec("tc", &["qdisc", "add", "dev", dev, "root", "handle", "1:", kind])?;
        Ok(())
    }
}

impl Drop for TestNamespace {
    fn drop(&mut self) {
        let _ = Command::new("ip").args(["netns", "del", &self.name]).status();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ns_name() {
        let name1 = unique_ns_name("test");
        let name2 = unique_ns_name("test");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("tclass-test-test-"));
    }
}
