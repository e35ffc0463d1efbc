//! Core reconciliation functionality
//!
//! This module contains the types and logic that carry the tool's one
//! correctness contract. It provides:
//!
//! - [`group`]: Snapshot model of a remote security group and port-set derivation
//! - [`reconcile`]: Match-key planning and the two-phase revoke/authorize engine
//! - [`error`]: Error taxonomy and operator-facing advice

pub mod error;
pub mod group;
pub mod reconcile;

#[cfg(test)]
pub mod test_helpers;
