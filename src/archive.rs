//! Archive membership validation for the archive-check task.
//!
//! Runs in addition to the snapshot comparison. An absent archive defers to
//! the filesystem check, which already reflects the missing file; a garbage
//! archive fails with its own diagnostic.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tar::Archive;

/// Outcome of the archive membership check.
#[derive(Debug)]
pub enum ArchiveCheck {
    Passed,
    /// Archive absent on disk; no information beyond the snapshot
    /// comparison.
    Deferred,
    /// Check failed; diagnostics are learner-facing lines.
    Failed(Vec<String>),
}

/// Compare the base names of every regular-file member, as a set, against
/// the required names. Internal directory structure is ignored.
pub fn check_members(archive_path: &Path, required: &[&str]) -> Result<ArchiveCheck> {
    let file = match File::open(archive_path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ArchiveCheck::Deferred),
        Err(err) => {
            return Err(err).with_context(|| format!("open archive {}", archive_path.display()))
        }
    };

    let mut members = BTreeSet::new();
    let mut archive = Archive::new(file);
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return Ok(invalid_archive(archive_path)),
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => return Ok(invalid_archive(archive_path)),
        };
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = match entry.path() {
            Ok(path) => path.into_owned(),
            Err(_) => return Ok(invalid_archive(archive_path)),
        };
        if let Some(name) = path.file_name() {
            members.insert(name.to_string_lossy().into_owned());
        }
    }

    let required: BTreeSet<String> = required.iter().map(|name| name.to_string()).collect();
    if members == required {
        tracing::debug!(archive = %archive_path.display(), "archive members match");
        return Ok(ArchiveCheck::Passed);
    }
    Ok(ArchiveCheck::Failed(vec![
        format!(
            "{} does not contain the correct files",
            archive_label(archive_path)
        ),
        format!("contains: {}", render_set(&members)),
        format!("should be: {}", render_set(&required)),
    ]))
}

fn invalid_archive(path: &Path) -> ArchiveCheck {
    ArchiveCheck::Failed(vec![format!(
        "{} is not a valid tar archive",
        archive_label(path)
    )])
}

fn archive_label(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

fn render_set(set: &BTreeSet<String>) -> String {
    let names: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", names.join(", "))
}
