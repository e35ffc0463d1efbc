//! Security group snapshot data structures
//!
//! This module defines the local model of a remote security group: the
//! ingress rules it carries and the labelled source entries inside them.
//! Snapshots are fetched read-only from the provider; the only way remote
//! state changes is through the explicit authorize/revoke mutations issued
//! by [`crate::core::reconcile`].
//!
//! # Rule Structure
//!
//! An [`IngressRule`] represents one inbound permission with:
//! - Protocol (TCP, UDP, ICMP, or the provider's `-1` wildcard)
//! - An inclusive port range (absent on wildcard permissions)
//! - A set of [`SourceEntry`] CIDR blocks, each with an optional label
//!
//! The label is the identity key for reconciliation: an operator's entry is
//! found by (port range, label), never by its address, so the entry can be
//! moved to a new address without accumulating duplicates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Network protocol of an ingress rule
///
/// `Copy` trait allows efficient passing by value for this small enum.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Protocol {
    /// Transmission Control Protocol
    #[strum(serialize = "tcp")]
    Tcp,
    /// User Datagram Protocol
    #[strum(serialize = "udp")]
    Udp,
    /// Internet Control Message Protocol
    #[strum(serialize = "icmp")]
    Icmp,
    /// Provider wildcard (`-1`): all protocols, no port semantics
    #[strum(serialize = "-1")]
    All,
}

impl Protocol {
    /// Returns the provider wire string for this protocol.
    pub const fn as_wire(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }

    /// Parses the provider's `IpProtocol` field. Unknown protocol numbers
    /// (e.g. `"50"` for ESP) yield `None`; such rules never carry ports we
    /// can offer to the operator.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "tcp" | "6" => Some(Protocol::Tcp),
            "udp" | "17" => Some(Protocol::Udp),
            "icmp" | "1" => Some(Protocol::Icmp),
            "-1" => Some(Protocol::All),
            _ => None,
        }
    }
}

/// Inclusive port range; equal bounds denote a single port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub fn contains(self, port: u16) -> bool {
        self.start <= port && port <= self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// One CIDR source inside an ingress rule, with the provider's free-text
/// description used as an identity label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    /// CIDR block as the provider reports it, e.g. `"203.0.113.9/32"`
    pub cidr: String,
    /// Free-text description; `Some(label)` marks an operator-owned entry
    pub label: Option<String>,
}

impl SourceEntry {
    pub fn new(cidr: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            label: Some(label.into()),
        }
    }
}

/// One inbound permission of a security group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngressRule {
    pub protocol: Protocol,
    /// Absent on wildcard permissions and port-less protocols (ICMP)
    pub ports: Option<PortRange>,
    pub sources: Vec<SourceEntry>,
}

/// Point-in-time snapshot of a remote security group.
///
/// Rule order is irrelevant; the provider owns the object and this snapshot
/// is trusted only for the duration of a single reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rules: Vec<IngressRule>,
}

impl SecurityGroup {
    /// Returns the set of ports an operator can join: the union of the
    /// inclusive port ranges of every non-wildcard TCP rule, sorted.
    ///
    /// An empty result is a hard precondition failure upstream; there is
    /// nothing to reconcile against a group with no TCP inbound ports.
    pub fn tcp_port_set(&self) -> BTreeSet<u16> {
        let mut ports = BTreeSet::new();
        for rule in &self.rules {
            if rule.protocol != Protocol::Tcp {
                continue;
            }
            if let Some(range) = rule.ports {
                ports.extend(range.start..=range.end);
            }
        }
        ports
    }

    /// True if the group has at least one non-wildcard inbound rule.
    /// Groups failing this are hidden from the selection menu.
    pub fn has_inbound(&self) -> bool {
        self.rules.iter().any(|r| r.protocol != Protocol::All)
    }

    /// Menu line for the selection layer: description, port summary, id.
    pub fn menu_label(&self) -> String {
        let mut ranges: Vec<String> = Vec::new();
        for rule in &self.rules {
            if rule.protocol == Protocol::All {
                continue;
            }
            if let Some(range) = rule.ports {
                ranges.push(range.to_string());
            }
        }
        let ports = if ranges.is_empty() {
            "N/A".to_string()
        } else {
            ranges.join(", ")
        };
        format!("{} Ports: {} ({})", self.description, ports, self.id)
    }
}
