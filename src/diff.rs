//! Failure snapshots and diff presentation.
//!
//! Everything here is presentation: the verdict is decided before the
//! reporter runs, and nothing in this module can change it. A viewer that
//! fails to launch degrades to the textual diff.

use crate::config::DiffCapabilities;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Failure-snapshot file names under the output directory.
pub const ACTUAL_SNAPSHOT: &str = "actual.out";
pub const EXPECTED_SNAPSHOT: &str = "expected.out";
pub const HTML_DIFF: &str = "diff.html";

/// Diff presentation requested by the caller.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffStyle {
    /// Side-by-side viewer, then HTML, then unified text.
    #[default]
    Auto,
    /// External side-by-side viewer only.
    SideBySide,
    /// HTML diff file only.
    Html,
    /// Unified textual diff on stdout.
    Unified,
    /// Persist snapshots without rendering.
    Off,
}

/// Well-known snapshot copies persisted for a failed run.
#[derive(Debug)]
pub struct FailureReport {
    pub actual: PathBuf,
    pub expected: PathBuf,
}

/// Persist the actual/expected snapshots to their well-known locations,
/// overwriting any prior run's files, and render the requested diff.
pub fn report_failure(
    output_dir: &Path,
    actual_snapshot: &Path,
    expected_snapshot: &Path,
    style: DiffStyle,
    caps: &DiffCapabilities,
) -> Result<FailureReport> {
    let actual = output_dir.join(ACTUAL_SNAPSHOT);
    let expected = output_dir.join(EXPECTED_SNAPSHOT);
    fs::copy(actual_snapshot, &actual)
        .with_context(|| format!("persist actual snapshot {}", actual.display()))?;
    fs::copy(expected_snapshot, &expected)
        .with_context(|| format!("persist expected snapshot {}", expected.display()))?;

    let expected_lines = read_lines(&expected)?;
    let actual_lines = read_lines(&actual)?;

    match style {
        DiffStyle::Off => {}
        DiffStyle::Unified => print!("{}", unified_diff(&expected_lines, &actual_lines)),
        DiffStyle::Html => {
            write_html_diff(output_dir, &expected_lines, &actual_lines)?;
        }
        DiffStyle::SideBySide => match &caps.viewer {
            Some(viewer) => {
                if let Err(err) = launch_viewer(viewer, &expected, &actual) {
                    tracing::warn!("diff viewer failed: {err:#}");
                    print!("{}", unified_diff(&expected_lines, &actual_lines));
                }
            }
            None => {
                tracing::warn!("no side-by-side viewer available");
                print!("{}", unified_diff(&expected_lines, &actual_lines));
            }
        },
        DiffStyle::Auto => {
            let viewer_shown = match &caps.viewer {
                Some(viewer) => match launch_viewer(viewer, &expected, &actual) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!("diff viewer failed: {err:#}");
                        false
                    }
                },
                None => false,
            };
            if !viewer_shown {
                if caps.graphical {
                    write_html_diff(output_dir, &expected_lines, &actual_lines)?;
                } else {
                    print!("{}", unified_diff(&expected_lines, &actual_lines));
                }
            }
        }
    }

    Ok(FailureReport { actual, expected })
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read snapshot {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn launch_viewer(viewer: &[String], expected: &Path, actual: &Path) -> Result<()> {
    let (program, args) = viewer
        .split_first()
        .ok_or_else(|| anyhow!("empty diff viewer command"))?;
    let status = Command::new(program)
        .args(args)
        .arg(expected)
        .arg(actual)
        .status()
        .with_context(|| format!("spawn diff viewer {program}"))?;
    if !status.success() {
        return Err(anyhow!("diff viewer exited with failure"));
    }
    Ok(())
}

/// Edit operation from walking the line-level LCS.
enum DiffOp<'a> {
    Keep(&'a str),
    Remove(&'a str),
    Add(&'a str),
}

fn diff_ops<'a>(expected: &'a [String], actual: &'a [String]) -> Vec<DiffOp<'a>> {
    // Longest-common-subsequence table; snapshots are small enough that the
    // quadratic table is fine.
    let mut table = vec![vec![0usize; actual.len() + 1]; expected.len() + 1];
    for (i, expected_line) in expected.iter().enumerate().rev() {
        for (j, actual_line) in actual.iter().enumerate().rev() {
            table[i][j] = if expected_line == actual_line {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < expected.len() && j < actual.len() {
        if expected[i] == actual[j] {
            ops.push(DiffOp::Keep(&expected[i]));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            ops.push(DiffOp::Remove(&expected[i]));
            i += 1;
        } else {
            ops.push(DiffOp::Add(&actual[j]));
            j += 1;
        }
    }
    for line in &expected[i..] {
        ops.push(DiffOp::Remove(line));
    }
    for line in &actual[j..] {
        ops.push(DiffOp::Add(line));
    }
    ops
}

/// Unified-style textual diff of the expected snapshot against the actual
/// one.
pub fn unified_diff(expected: &[String], actual: &[String]) -> String {
    let mut out = String::new();
    out.push_str("--- expected\n+++ actual\n");
    for op in diff_ops(expected, actual) {
        let (marker, line) = match op {
            DiffOp::Keep(line) => (' ', line),
            DiffOp::Remove(line) => ('-', line),
            DiffOp::Add(line) => ('+', line),
        };
        out.push(marker);
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn write_html_diff(output_dir: &Path, expected: &[String], actual: &[String]) -> Result<()> {
    let path = output_dir.join(HTML_DIFF);
    fs::write(&path, html_diff(expected, actual))
        .with_context(|| format!("write html diff {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote html diff");
    Ok(())
}

/// Side-by-side HTML rendering of the snapshot diff.
pub fn html_diff(expected: &[String], actual: &[String]) -> String {
    let mut rows = String::new();
    for op in diff_ops(expected, actual) {
        let row = match op {
            DiffOp::Keep(line) => {
                let cell = escape_html(line);
                format!("<tr class=\"ctx\"><td>{cell}</td><td>{cell}</td></tr>\n")
            }
            DiffOp::Remove(line) => {
                format!(
                    "<tr class=\"del\"><td>{}</td><td></td></tr>\n",
                    escape_html(line)
                )
            }
            DiffOp::Add(line) => {
                format!(
                    "<tr class=\"add\"><td></td><td>{}</td></tr>\n",
                    escape_html(line)
                )
            }
        };
        rows.push_str(&row);
    }

    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\">\
         <title>verification diff</title>\n<style>\n\
         table {{ border-collapse: collapse; font-family: monospace; }}\n\
         td {{ border: 1px solid #ccc; padding: 2px 8px; white-space: pre; }}\n\
         .del td {{ background: #fdd; }}\n\
         .add td {{ background: #dfd; }}\n\
         </style></head>\n<body>\n\
         <table>\n<tr><th>expected</th><th>actual</th></tr>\n{rows}</table>\n\
         </body></html>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
