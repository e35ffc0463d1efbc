//! Access-grant orchestration
//!
//! Walks the operator from instance to port and hands the result to the
//! reconciler. Depends only on the provider and selector traits, so the
//! whole flow runs in tests against an in-memory provider and a scripted
//! selector. The caller resolves the public address first; by the time this
//! runs, the only remote calls left are describes and the reconcile
//! mutations.

use crate::core::error::{Error, Result};
use crate::core::group::SecurityGroup;
use crate::core::reconcile::{self, MatchKey};
use crate::provider::ProviderApi;
use crate::select::Selector;
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::info;

/// Final summary rendered to the operator (or emitted as JSON).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccessSummary {
    pub instance_id: String,
    pub group_id: String,
    pub group_name: String,
    pub port: u16,
    pub label: String,
    /// The `/32` CIDR now authorized
    pub cidr: String,
    /// True when a stale entry was replaced, false when freshly created
    pub replaced_prior: bool,
}

/// Runs the full selection + reconciliation sequence.
///
/// `port_override` skips the port menu but must still name a member of the
/// group's derived port set. Every precondition failure aborts before any
/// mutation.
pub async fn grant_access<P: ProviderApi + ?Sized>(
    api: &P,
    selector: &mut dyn Selector,
    label: &str,
    address: Ipv4Addr,
    port_override: Option<u16>,
) -> Result<AccessSummary> {
    if label.is_empty() {
        return Err(Error::Precondition("identity label is empty".to_string()));
    }

    let instances = api.list_instances().await?;
    if instances.is_empty() {
        return Err(Error::Precondition(
            "no EC2 instances found in this profile".to_string(),
        ));
    }
    let labels: Vec<String> = instances.iter().map(|i| i.menu_label()).collect();
    let instance = &instances[selector.pick("Select the EC2 instance:", &labels)?];

    if instance.security_group_ids.is_empty() {
        return Err(Error::Precondition(format!(
            "instance {} has no security groups attached",
            instance.id
        )));
    }
    let groups = api.describe_groups(&instance.security_group_ids).await?;
    let candidates: Vec<&SecurityGroup> = groups.iter().filter(|g| g.has_inbound()).collect();
    if candidates.is_empty() {
        return Err(Error::Precondition(format!(
            "no security group on {} has non-wildcard inbound rules",
            instance.id
        )));
    }
    let labels: Vec<String> = candidates.iter().map(|g| g.menu_label()).collect();
    let group = candidates[selector.pick("Select the security group (inbound only):", &labels)?];

    let ports: Vec<u16> = group.tcp_port_set().into_iter().collect();
    if ports.is_empty() {
        return Err(Error::Precondition(format!(
            "security group {} has no TCP inbound ports to join",
            group.id
        )));
    }
    let port = match port_override {
        Some(port) => {
            if !ports.contains(&port) {
                return Err(Error::Precondition(format!(
                    "port {port} is not among the group's inbound TCP ports ({})",
                    join_ports(&ports)
                )));
            }
            port
        }
        // A single candidate port is auto-selected without prompting
        None if ports.len() == 1 => ports[0],
        None => {
            let labels: Vec<String> = ports.iter().map(ToString::to_string).collect();
            ports[selector.pick("Which port do you want to open?", &labels)?]
        }
    };
    info!(instance = %instance.id, group = %group.id, port, "selection complete");

    let outcome = reconcile::reconcile(api, group, MatchKey { port, label }, address).await?;

    Ok(AccessSummary {
        instance_id: instance.id.clone(),
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        port,
        label: label.to_string(),
        cidr: outcome.cidr,
        replaced_prior: outcome.replaced_prior,
    })
}

fn join_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
