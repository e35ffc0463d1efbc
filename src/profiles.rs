//! AWS profile discovery
//!
//! Lists the section headers of the shared credentials file so the operator
//! can pick which account to act on. Only the names are read here; actual
//! credential resolution is left entirely to `aws-config`.

use crate::core::error::Result;
use directories::BaseDirs;
use std::path::PathBuf;

/// Environment override honored by the AWS CLI and SDKs alike.
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Path of the shared credentials file, if a home directory exists.
pub fn credentials_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CREDENTIALS_FILE_ENV) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".aws").join("credentials"))
}

/// Returns the profile names in the credentials file. A missing file is not
/// an error; it reads as zero profiles and the caller reports the
/// precondition failure.
pub fn list_profiles() -> Result<Vec<String>> {
    let Some(path) = credentials_path() else {
        return Ok(Vec::new());
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(parse_sections(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Extracts `[section]` headers from INI-style text, in file order.
fn parse_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if !name.is_empty() {
                sections.push(name.to_string());
            }
        }
    }
    sections
}
