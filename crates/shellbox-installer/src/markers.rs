use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use shellbox_core::compare_versions;

/// Outcome of comparing an installed component's marker against the version
/// bundled in this binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerStatus {
    Current,
    /// No readable marker on disk: not installed, or forced to re-check.
    Missing,
    /// The bundled version is strictly newer than the installed one.
    Stale { installed: String },
}

/// One trimmed version string; `None` on a missing, unreadable, or empty
/// marker. Never an error: "cannot confirm" conservatively reads as "not
/// installed" so the gate selects the reinstall path instead of aborting.
pub fn read_marker(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn check_marker(path: &Path, bundled: &str) -> MarkerStatus {
    let Some(installed) = read_marker(path) else {
        return MarkerStatus::Missing;
    };
    // Only a strictly newer bundle invalidates the install; an installed
    // version above the bundled one is never silently downgraded.
    if compare_versions(bundled, &installed) == Ordering::Greater {
        MarkerStatus::Stale { installed }
    } else {
        MarkerStatus::Current
    }
}

pub fn write_marker(path: &Path, version: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", version.trim()))
        .with_context(|| format!("failed to write version marker: {}", path.display()))
}

/// Deleting a marker forces the next gate evaluation onto the install path.
pub fn delete_marker(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove version marker: {}", path.display()))?;
    }
    Ok(())
}
