//! sgopen - time-of-use ingress access for EC2 security groups
//!
//! Grants the operator's current public IP inbound access to an EC2
//! instance by reconciling exactly one ingress rule in a security group:
//! any stale entry previously created under the same identity label is
//! revoked, then a fresh `/32` entry for the current address is authorized.
//!
//! # Architecture
//!
//! - [`core`] - Snapshot model, reconciliation engine, error taxonomy
//! - [`provider`] - Async provider traits and the EC2 implementation
//! - [`flow`] - Selection + reconciliation orchestration over the traits
//! - [`resolver`] - Public address discovery via a checkip echo endpoint
//! - [`select`] - Pluggable operator selection (terminal or scripted)
//! - [`profiles`] - AWS credentials profile discovery
//!
//! # Safety Model
//!
//! The provider API only exposes add/remove primitives, so replacing an
//! entry is inherently two-phase. A failure between revoke and authorize is
//! reported with the removed rule's full content instead of pretending
//! success; re-running the tool converges remote state again.

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

pub mod core;
pub mod flow;
pub mod profiles;
pub mod provider;
pub mod resolver;
pub mod select;

// Re-export commonly used types
pub use crate::core::error::{Error, ErrorAdvice, Result};
pub use crate::core::group::{IngressRule, PortRange, Protocol, SecurityGroup, SourceEntry};
pub use crate::core::reconcile::{MatchKey, Outcome, ReconcilePlan};
