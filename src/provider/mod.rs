//! Provider seam between the reconciliation core and the cloud control plane
//!
//! The core never names the AWS SDK. It sees two narrow async traits:
//! [`InstanceApi`] for listing compute instances and [`SecurityGroupApi`]
//! for the three security group operations the whole tool is built on
//! (describe, authorize, revoke). Tests substitute in-memory fakes; the real
//! implementation lives in [`ec2`].
//!
//! The mutation API is add/remove only. There is no in-place edit primitive,
//! which is why reconciliation is a two-phase revoke/authorize sequence with
//! a documented failure window.

pub mod ec2;

use crate::core::error::Result;
use crate::core::group::{PortRange, SecurityGroup};
use async_trait::async_trait;

/// One compute instance as presented to the selection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    /// Value of the `Name` tag, when present
    pub name: Option<String>,
    pub security_group_ids: Vec<String>,
}

impl Instance {
    /// Menu line: `name (id)`, or just the id for unnamed instances.
    pub fn menu_label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.id),
            None => self.id.clone(),
        }
    }
}

/// A new ingress entry to authorize. Protocol is always TCP; non-TCP
/// mutations are out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
    pub ports: PortRange,
    /// Host CIDR, e.g. `"203.0.113.9/32"`
    pub cidr: String,
    /// Identity label stored as the entry description
    pub label: String,
}

/// Listing of compute instances attached to the selected credentials.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<Instance>>;
}

/// The three remote operations reconciliation depends on.
///
/// `authorize_ingress` and `revoke_ingress` are independent calls that can
/// fail independently; callers must not assume any atomicity across them.
#[async_trait]
pub trait SecurityGroupApi: Send + Sync {
    /// Fetches full snapshots for the given group ids.
    async fn describe_groups(&self, ids: &[String]) -> Result<Vec<SecurityGroup>>;

    /// Adds one labelled TCP ingress entry to the group.
    async fn authorize_ingress(&self, group_id: &str, request: &AuthorizeRequest) -> Result<()>;

    /// Removes the exact TCP (port range, cidr) entry from the group.
    async fn revoke_ingress(&self, group_id: &str, ports: PortRange, cidr: &str) -> Result<()>;
}

/// Union trait for the orchestration flow.
pub trait ProviderApi: InstanceApi + SecurityGroupApi {}

impl<T: InstanceApi + SecurityGroupApi> ProviderApi for T {}
