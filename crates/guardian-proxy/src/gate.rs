//! Injected read-only client gate.
//!
//! Monitoring systems may maintain flagged-user or blocked-IP lists; this
//! pipeline only ever *consults* such state, it never mutates it. The gate
//! is injected at middleware construction so tests and embedders control it
//! explicitly, with no package-level singletons.

use std::collections::HashSet;

/// Read-only capability deciding whether a client IP is barred outright.
pub trait ClientGate: Send + Sync {
    /// Returns true if requests from this IP must be refused.
    fn is_blocked(&self, ip: &str) -> bool;
}

/// A gate that admits everyone. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl ClientGate for OpenGate {
    fn is_blocked(&self, _ip: &str) -> bool {
        false
    }
}

/// A fixed deny list of client IPs.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    blocked: HashSet<String>,
}

impl DenyList {
    /// Creates a deny list from the given IPs.
    pub fn new(ips: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            blocked: ips.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClientGate for DenyList {
    fn is_blocked(&self, ip: &str) -> bool {
        self.blocked.contains(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_gate_admits_everyone() {
        assert!(!OpenGate.is_blocked("203.0.113.7"));
    }

    #[test]
    fn deny_list_blocks_listed_ips() {
        let gate = DenyList::new(["203.0.113.7", "198.51.100.2"]);
        assert!(gate.is_blocked("203.0.113.7"));
        assert!(!gate.is_blocked("192.0.2.1"));
    }

    #[test]
    fn empty_deny_list_admits_everyone() {
        assert!(!DenyList::default().is_blocked("203.0.113.7"));
    }
}
