//! sgopen - grant your current public IP access to an EC2 instance
//!
//! Interactive flow:
//! 1. Pick an AWS profile from `~/.aws/credentials`
//! 2. Pick an EC2 instance from that account
//! 3. Pick a security group and inbound TCP port
//! 4. Reconcile: revoke any stale entry under your identity label, then
//!    authorize your current address as a `/32`
//! 5. Print a summary of what was created or updated
//!
//! # Usage
//!
//! ```bash
//! sgopen                          # Fully interactive
//! sgopen --profile client-a       # Skip the profile menu
//! sgopen --port 22                # Skip the port menu
//! sgopen --label alice --json     # Explicit label, machine-readable summary
//! ```
//!
//! The identity label defaults to `$USER` and is the key stale entries are
//! matched under; keep it stable across runs or old entries are orphaned.

use clap::Parser;
use sgopen::core::error::Error;
use sgopen::flow::{self, AccessSummary};
use sgopen::provider::ec2::Ec2Provider;
use sgopen::select::{Selector, TerminalSelector};
use sgopen::{profiles, resolver};
use std::process::ExitCode;
use tracing::info;

/// Fallback identity label when neither `--label` nor `$USER` is set.
const DEFAULT_LABEL: &str = "sgopen-access";

#[derive(Parser)]
#[command(name = "sgopen")]
#[command(about = "Open an EC2 security group to your current public IP", long_about = None)]
struct Cli {
    /// AWS profile to use (skips the profile menu)
    #[arg(short, long)]
    profile: Option<String>,

    /// Inbound TCP port to open; must be one of the group's existing ports
    #[arg(long)]
    port: Option<u16>,

    /// Identity label stored on the rule entry (default: $USER)
    #[arg(short, long)]
    label: Option<String>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let advice = e.advice();
            eprintln!("Error: {}", advice.user_message);
            for suggestion in &advice.suggestions {
                eprintln!("  - {suggestion}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut selector = TerminalSelector;

    let profile = match cli.profile {
        Some(profile) => profile,
        None => {
            let available = profiles::list_profiles()?;
            if available.is_empty() {
                return Err(Error::Precondition(
                    "no AWS profiles found in the credentials file".to_string(),
                ));
            }
            let index = selector.pick("Select the AWS profile:", &available)?;
            available[index].clone()
        }
    };

    let label = cli
        .label
        .or_else(|| std::env::var("USER").ok())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());

    // Resolve before touching the control plane: a failure here must abort
    // the run while remote state is still untouched
    let address = resolver::resolve_public_address(&resolver::checkip_url()).await?;
    info!(%address, profile, label, "starting access grant");

    let api = Ec2Provider::from_profile(&profile).await;
    let summary = flow::grant_access(&api, &mut selector, &label, address, cli.port).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary).map_err(|e| {
            Error::Transient(format!("summary serialization failed: {e}"))
        })?);
    } else {
        print_summary(&profile, &summary);
    }
    Ok(())
}

fn print_summary(profile: &str, summary: &AccessSummary) {
    println!();
    println!("Access granted.");
    println!("  Profile:        {profile}");
    println!("  Instance:       {}", summary.instance_id);
    println!(
        "  Security group: {} ({})",
        summary.group_name, summary.group_id
    );
    println!("  Port:           {}", summary.port);
    println!("  Your IP:        {}", summary.cidr);
    println!(
        "  Rule {} for label {:?}.",
        if summary.replaced_prior {
            "updated"
        } else {
            "created"
        },
        summary.label
    );
}
