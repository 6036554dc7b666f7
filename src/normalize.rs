//! Canonical snapshot form for captured output.
//!
//! Snapshots are compared byte-for-byte, so normalization must be a pure
//! function of the capture content: prefix stripping happens before sorting
//! so that normalizing an already-normalized snapshot yields itself.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Strip the leading repeated `./` segments from a captured path line.
///
/// Lines that are exactly `.` or `./` name the listing root itself and are
/// preserved verbatim.
pub fn strip_dot_prefix(line: &str) -> &str {
    if line == "." || line == "./" {
        return line;
    }
    let mut rest = line;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest
}

/// Normalize a raw capture into prefix-stripped, byte-order-sorted lines.
///
/// No other transformation: no whitespace trimming beyond line splitting,
/// no case folding.
pub fn normalize(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = raw
        .lines()
        .map(|line| strip_dot_prefix(line).to_string())
        .collect();
    lines.sort_unstable();
    lines
}

/// Read a raw capture file and write its normalized snapshot.
pub fn normalize_file(raw_path: &Path, norm_path: &Path) -> Result<()> {
    let raw = fs::read_to_string(raw_path)
        .with_context(|| format!("read capture {}", raw_path.display()))?;
    write_snapshot(norm_path, &normalize(&raw))
}

/// Write snapshot lines to disk, one per line.
pub fn write_snapshot(path: &Path, lines: &[String]) -> Result<()> {
    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("write snapshot {}", path.display()))?;
    Ok(())
}
