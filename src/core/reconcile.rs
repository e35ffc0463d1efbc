//! Ingress rule reconciliation
//!
//! The one component with a correctness contract. Given a security group
//! snapshot, a port, an identity label and the freshly resolved address,
//! converge the remote group to a state where exactly one entry for
//! (port, label) exists and it points at the current address.
//!
//! # Match key
//!
//! Entries are owned by (rule port-from, label), never by address. That is
//! what lets the same operator's entry follow their address across runs
//! without duplicating, while entries under other labels on the same port
//! are never touched.
//!
//! # Two-phase mutation
//!
//! The provider only exposes add/remove primitives, so replacement is a
//! revoke of every stale match followed by one authorize. Between the two
//! calls the group briefly has zero matching entries, and a crash or
//! authorize failure in that window leaves the operator locked out. That
//! failure is surfaced as [`Error::PartialReconciliation`] carrying the full
//! content of every removed entry; it must never look like success.

use crate::core::error::{Error, Result};
use crate::core::group::{PortRange, SecurityGroup};
use crate::provider::{AuthorizeRequest, SecurityGroupApi};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Identity key an entry is reconciled under: the rule's first port plus the
/// operator label stored in the entry description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchKey<'a> {
    pub port: u16,
    pub label: &'a str,
}

/// One entry scheduled for (or already subjected to) a revoke mutation.
///
/// Carries the matched rule's real port range, not the selected port: the
/// provider needs the exact (proto, from, to, cidr) tuple to remove an
/// entry, and a partial-failure report has to name what actually went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedEntry {
    pub ports: PortRange,
    pub cidr: String,
    pub label: String,
}

/// The minimal mutation set that converges a snapshot to the desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Every stale entry under the match key. Usually zero or one, but
    /// manual edits or prior bugs can accumulate more; all are removed.
    pub revoke: Vec<RevokedEntry>,
    pub authorize: AuthorizeRequest,
}

/// Result of a successful reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The `/32` CIDR that is now authorized
    pub cidr: String,
    /// True if at least one stale entry was revoked first
    pub replaced_prior: bool,
}

/// Projects a resolved host address to its `/32` CIDR string.
pub fn host_cidr(address: Ipv4Addr) -> String {
    Ipv4Network::from(address).to_string()
}

/// Computes the mutations needed to converge `group` to exactly one entry
/// for `key` at `address`. Pure; inspects only the snapshot.
pub fn plan(group: &SecurityGroup, key: MatchKey<'_>, address: Ipv4Addr) -> ReconcilePlan {
    let mut revoke = Vec::new();
    for rule in &group.rules {
        let Some(ports) = rule.ports else {
            continue;
        };
        if ports.start != key.port {
            continue;
        }
        for entry in &rule.sources {
            if entry.label.as_deref() != Some(key.label) {
                continue;
            }
            // The provider stores one entry per (range, cidr); revoking the
            // same pair twice would fail the second call
            let duplicate = revoke
                .iter()
                .any(|r: &RevokedEntry| r.ports == ports && r.cidr == entry.cidr);
            if !duplicate {
                revoke.push(RevokedEntry {
                    ports,
                    cidr: entry.cidr.clone(),
                    label: key.label.to_string(),
                });
            }
        }
    }
    ReconcilePlan {
        revoke,
        authorize: AuthorizeRequest {
            ports: PortRange::single(key.port),
            cidr: host_cidr(address),
            label: key.label.to_string(),
        },
    }
}

/// Applies a reconciliation against the remote provider.
///
/// The snapshot must have been fetched strictly before this call; nothing is
/// re-fetched internally, so the run is vulnerable to races with concurrent
/// external edits. All mutations are sequential. Any failure after the first
/// successful revoke is wrapped in [`Error::PartialReconciliation`] so the
/// removed entries are reported to the operator.
pub async fn reconcile<A: SecurityGroupApi + ?Sized>(
    api: &A,
    group: &SecurityGroup,
    key: MatchKey<'_>,
    address: Ipv4Addr,
) -> Result<Outcome> {
    let plan = plan(group, key, address);
    debug!(
        group = %group.id,
        port = key.port,
        label = key.label,
        stale = plan.revoke.len(),
        "computed reconcile plan"
    );

    let mut removed: Vec<RevokedEntry> = Vec::new();
    for entry in &plan.revoke {
        api.revoke_ingress(&group.id, entry.ports, &entry.cidr)
            .await
            .map_err(|e| partial(std::mem::take(&mut removed), e))?;
        info!(group = %group.id, cidr = %entry.cidr, ports = %entry.ports, "revoked stale entry");
        removed.push(entry.clone());
    }

    let replaced_prior = !removed.is_empty();
    api.authorize_ingress(&group.id, &plan.authorize)
        .await
        .map_err(|e| partial(removed, e))?;
    info!(
        group = %group.id,
        cidr = %plan.authorize.cidr,
        port = key.port,
        replaced_prior,
        "authorized current address"
    );

    Ok(Outcome {
        cidr: plan.authorize.cidr,
        replaced_prior,
    })
}

/// Wraps a mutation failure as partial iff entries were already removed.
fn partial(removed: Vec<RevokedEntry>, source: Error) -> Error {
    if removed.is_empty() {
        source
    } else {
        Error::PartialReconciliation {
            removed,
            source: Box::new(source),
        }
    }
}
