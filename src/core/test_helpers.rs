//! Shared test utilities for core module tests
//!
//! Provides an in-memory fake provider so reconciliation tests never touch
//! AWS or a terminal. This module is only compiled in test mode;
//! `tests/integration_tests.rs` keeps its own copy.

use crate::core::error::{Error, Result};
use crate::core::group::{IngressRule, PortRange, Protocol, SecurityGroup, SourceEntry};
use crate::provider::{AuthorizeRequest, Instance, InstanceApi, SecurityGroupApi};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory provider that applies authorize/revoke mutations to locally
/// held group snapshots with the same non-atomic semantics as the real API.
pub struct FakeProvider {
    pub instances: Vec<Instance>,
    pub groups: Mutex<Vec<SecurityGroup>>,
    /// When true, every authorize call fails with a transient error. Used
    /// to exercise the revoke-then-authorize failure window.
    pub fail_authorize: bool,
}

impl FakeProvider {
    pub fn new(groups: Vec<SecurityGroup>) -> Self {
        Self {
            instances: Vec::new(),
            groups: Mutex::new(groups),
            fail_authorize: false,
        }
    }

    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    /// Snapshot of a group by id, the way a fresh describe would see it.
    pub fn snapshot(&self, group_id: &str) -> Option<SecurityGroup> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
    }

    /// All (cidr, label) pairs on TCP rules whose range starts at `port`.
    pub fn entries_at(&self, group_id: &str, port: u16) -> Vec<(String, Option<String>)> {
        let groups = self.groups.lock().unwrap();
        let Some(group) = groups.iter().find(|g| g.id == group_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for rule in &group.rules {
            if rule.ports.map(|p| p.start) == Some(port) {
                for entry in &rule.sources {
                    out.push((entry.cidr.clone(), entry.label.clone()));
                }
            }
        }
        out
    }
}

#[async_trait]
impl InstanceApi for FakeProvider {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        Ok(self.instances.clone())
    }
}

#[async_trait]
impl SecurityGroupApi for FakeProvider {
    async fn describe_groups(&self, ids: &[String]) -> Result<Vec<SecurityGroup>> {
        let groups = self.groups.lock().unwrap();
        let found: Vec<SecurityGroup> = groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(Error::NotFound(format!("security groups {ids:?}")));
        }
        Ok(found)
    }

    async fn authorize_ingress(&self, group_id: &str, request: &AuthorizeRequest) -> Result<()> {
        if self.fail_authorize {
            return Err(Error::Transient("injected authorize failure".to_string()));
        }
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Error::NotFound(format!("security group {group_id}")))?;
        group.rules.push(IngressRule {
            protocol: Protocol::Tcp,
            ports: Some(request.ports),
            sources: vec![SourceEntry::new(request.cidr.clone(), request.label.clone())],
        });
        Ok(())
    }

    async fn revoke_ingress(&self, group_id: &str, ports: PortRange, cidr: &str) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Error::NotFound(format!("security group {group_id}")))?;
        let mut hit = false;
        for rule in &mut group.rules {
            if rule.protocol == Protocol::Tcp && rule.ports == Some(ports) {
                let before = rule.sources.len();
                rule.sources.retain(|s| s.cidr != cidr);
                hit |= rule.sources.len() != before;
            }
        }
        group.rules.retain(|r| !r.sources.is_empty() || r.ports.is_none());
        if hit {
            Ok(())
        } else {
            Err(Error::NotFound(format!(
                "no entry {cidr} on tcp {ports} in {group_id}"
            )))
        }
    }
}

/// A single-rule group: TCP on `ports` with the given (cidr, label) sources.
pub fn group_with_entries(
    id: &str,
    ports: PortRange,
    entries: &[(&str, &str)],
) -> SecurityGroup {
    SecurityGroup {
        id: id.to_string(),
        name: format!("{id}-name"),
        description: "Bastion access".to_string(),
        rules: vec![IngressRule {
            protocol: Protocol::Tcp,
            ports: Some(ports),
            sources: entries
                .iter()
                .map(|(cidr, label)| SourceEntry::new(*cidr, *label))
                .collect(),
        }],
    }
}
