use crate::core::reconcile::RevokedEntry;
use thiserror::Error;

/// Core error types for sgopen
///
/// Every variant is fatal to the current run: there is no retry loop or
/// recovery supervisor anywhere. The tool is idempotent, so the operator's
/// recovery path for transient failures is simply to re-run it.
#[derive(Debug, Error)]
pub enum Error {
    /// A precondition failed before any remote mutation (no instances, no
    /// attached groups, no TCP inbound ports, no AWS profiles)
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The selected remote object vanished between listing and use
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials lack the rights for the attempted operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Transient provider/network failure, surfaced verbatim, never retried
    #[error("provider error: {0}")]
    Transient(String),

    /// The revoke phase succeeded but a later mutation failed, leaving the
    /// operator without an active entry. Carries everything that was
    /// removed so it can be re-authorized by hand.
    #[error("reconciliation aborted after revoking {} prior entries: {source}", .removed.len())]
    PartialReconciliation {
        removed: Vec<RevokedEntry>,
        source: Box<Error>,
    },

    /// The public address echo endpoint failed or returned garbage
    #[error("address resolution failed: {0}")]
    AddressResolution(String),

    /// I/O operation failed (credentials file, terminal input)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operator-facing advice attached to a fatal error
#[derive(Debug, Clone)]
pub struct ErrorAdvice {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorAdvice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl Error {
    /// Translates an error into a message plus concrete next steps.
    /// Printed by the CLI on every fatal exit.
    pub fn advice(&self) -> ErrorAdvice {
        match self {
            Error::Precondition(msg) => ErrorAdvice::new(msg.clone())
                .with_suggestion("Check that the selected profile points at the right account")
                .with_suggestion("Verify the instance has a security group with TCP inbound rules"),

            Error::NotFound(msg) => ErrorAdvice::new(format!("Remote object not found: {msg}"))
                .with_suggestion("The instance or security group may have been deleted mid-run")
                .with_suggestion("Re-run to pick from a fresh listing"),

            Error::PermissionDenied(msg) => {
                ErrorAdvice::new(format!("AWS rejected the operation: {msg}"))
                    .with_suggestion(
                        "The profile needs ec2:DescribeInstances, ec2:DescribeSecurityGroups, \
                         ec2:AuthorizeSecurityGroupIngress and ec2:RevokeSecurityGroupIngress",
                    )
                    .with_suggestion(
                        "Check for expired session credentials: aws sts get-caller-identity",
                    )
            }

            Error::Transient(msg) => ErrorAdvice::new(format!("Provider call failed: {msg}"))
                .with_suggestion("This tool never retries; re-running it is safe and idempotent"),

            Error::PartialReconciliation { removed, source } => {
                let mut advice = ErrorAdvice::new(format!(
                    "Your old rule was revoked but the new one was NOT created ({source}). \
                     You are currently locked out."
                ));
                for entry in removed {
                    advice = advice.with_suggestion(format!(
                        "Removed entry to restore manually: tcp port {} source {} ({})",
                        entry.ports, entry.cidr, entry.label
                    ));
                }
                advice.with_suggestion(
                    "Re-running the tool will recreate the entry for your current address",
                )
            }

            Error::AddressResolution(msg) => {
                ErrorAdvice::new(format!("Could not determine your public IP: {msg}"))
                    .with_suggestion("Check outbound connectivity to the checkip endpoint")
                    .with_suggestion(
                        "Override the endpoint with SGOPEN_CHECKIP_URL if it is blocked",
                    )
            }

            Error::Io(e) => ErrorAdvice::new(format!("I/O error: {e}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
