//! EC2 implementation of the provider traits
//!
//! Maps the four control-plane calls the tool needs onto `aws-sdk-ec2`:
//! `DescribeInstances`, `DescribeSecurityGroups`,
//! `AuthorizeSecurityGroupIngress` and `RevokeSecurityGroupIngress`.
//! SDK failures are classified into the crate error taxonomy by error code;
//! anything unrecognized is surfaced verbatim as transient and left to the
//! operator to re-run.

use crate::core::error::{Error, Result};
use crate::core::group::{IngressRule, PortRange, Protocol, SecurityGroup, SourceEntry};
use crate::provider::{AuthorizeRequest, Instance, InstanceApi, SecurityGroupApi};
use async_trait::async_trait;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use aws_sdk_ec2::types::{IpPermission, IpRange};
use tracing::debug;

/// EC2-backed provider bound to one profile's credentials and region.
pub struct Ec2Provider {
    client: aws_sdk_ec2::Client,
}

impl Ec2Provider {
    /// Builds a provider from a named profile in the shared AWS config
    /// files, resolving region and credentials the same way the AWS CLI
    /// does.
    pub async fn from_profile(profile: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_name(profile)
            .load()
            .await;
        Self {
            client: aws_sdk_ec2::Client::new(&config),
        }
    }

    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

/// Classifies an SDK failure by its service error code.
fn classify<E, R>(err: &aws_sdk_ec2::error::SdkError<E, R>, context: &str) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let detail = err
        .message()
        .map_or_else(|| format!("{err:?}"), ToOwned::to_owned);
    match err.code() {
        Some(code) if code.ends_with(".NotFound") => {
            Error::NotFound(format!("{context}: {detail}"))
        }
        Some("UnauthorizedOperation" | "AuthFailure" | "AccessDenied") => {
            Error::PermissionDenied(format!("{context}: {detail}"))
        }
        _ => Error::Transient(format!("{context}: {detail}")),
    }
}

/// Extracts the `Name` tag of an instance, if any.
fn name_tag(instance: &aws_sdk_ec2::types::Instance) -> Option<String> {
    instance
        .tags()
        .iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .map(ToOwned::to_owned)
}

/// Converts one `IpPermission` into the snapshot model. Permissions with an
/// unrecognized protocol are dropped; they can never carry a joinable port.
fn map_permission(perm: &IpPermission) -> Option<IngressRule> {
    let protocol = Protocol::from_wire(perm.ip_protocol()?)?;
    let ports = match (perm.from_port(), perm.to_port()) {
        (Some(from), Some(to)) => {
            // ICMP reports type/code here and wildcards report -1; neither
            // is a port range
            match (u16::try_from(from), u16::try_from(to)) {
                (Ok(start), Ok(end)) if protocol != Protocol::Icmp => {
                    Some(PortRange { start, end })
                }
                _ => None,
            }
        }
        _ => None,
    };
    let sources = perm
        .ip_ranges()
        .iter()
        .filter_map(|r| {
            r.cidr_ip().map(|cidr| SourceEntry {
                cidr: cidr.to_owned(),
                label: r.description().map(ToOwned::to_owned),
            })
        })
        .collect();
    Some(IngressRule {
        protocol,
        ports,
        sources,
    })
}

#[async_trait]
impl InstanceApi for Ec2Provider {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let output = self
            .client
            .describe_instances()
            .send()
            .await
            .map_err(|e| classify(&e, "DescribeInstances"))?;

        let mut instances = Vec::new();
        for reservation in output.reservations() {
            for instance in reservation.instances() {
                let Some(id) = instance.instance_id() else {
                    continue;
                };
                instances.push(Instance {
                    id: id.to_owned(),
                    name: name_tag(instance),
                    security_group_ids: instance
                        .security_groups()
                        .iter()
                        .filter_map(|g| g.group_id())
                        .map(ToOwned::to_owned)
                        .collect(),
                });
            }
        }
        debug!(count = instances.len(), "listed instances");
        Ok(instances)
    }
}

#[async_trait]
impl SecurityGroupApi for Ec2Provider {
    async fn describe_groups(&self, ids: &[String]) -> Result<Vec<SecurityGroup>> {
        let output = self
            .client
            .describe_security_groups()
            .set_group_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(|e| classify(&e, "DescribeSecurityGroups"))?;

        let groups = output
            .security_groups()
            .iter()
            .map(|g| SecurityGroup {
                id: g.group_id().unwrap_or_default().to_owned(),
                name: g.group_name().unwrap_or_default().to_owned(),
                description: g.description().unwrap_or_default().to_owned(),
                rules: g.ip_permissions().iter().filter_map(map_permission).collect(),
            })
            .collect();
        Ok(groups)
    }

    async fn authorize_ingress(&self, group_id: &str, request: &AuthorizeRequest) -> Result<()> {
        let permission = IpPermission::builder()
            .ip_protocol(Protocol::Tcp.as_wire())
            .from_port(i32::from(request.ports.start))
            .to_port(i32::from(request.ports.end))
            .ip_ranges(
                IpRange::builder()
                    .cidr_ip(&request.cidr)
                    .description(&request.label)
                    .build(),
            )
            .build();
        self.client
            .authorize_security_group_ingress()
            .group_id(group_id)
            .ip_permissions(permission)
            .send()
            .await
            .map_err(|e| classify(&e, "AuthorizeSecurityGroupIngress"))?;
        Ok(())
    }

    async fn revoke_ingress(&self, group_id: &str, ports: PortRange, cidr: &str) -> Result<()> {
        self.client
            .revoke_security_group_ingress()
            .group_id(group_id)
            .ip_protocol(Protocol::Tcp.as_wire())
            .from_port(i32::from(ports.start))
            .to_port(i32::from(ports.end))
            .cidr_ip(cidr)
            .send()
            .await
            .map_err(|e| classify(&e, "RevokeSecurityGroupIngress"))?;
        Ok(())
    }
}
