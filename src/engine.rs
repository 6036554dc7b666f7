//! Verdict engine: the one state machine behind every grading variant.
//!
//! The run walks `CAPTURE_FS -> CHECK_FS` and, for SELECT tasks whose
//! filesystem is untouched, `CAPTURE_STDOUT -> CHECK_STDOUT`. Comparison
//! mismatches are verdicts, never errors; only environment/OS failures
//! propagate out of [`run`].

use crate::archive::{self, ArchiveCheck};
use crate::capture;
use crate::config::{DiffCapabilities, GraderPaths};
use crate::diff::{self, DiffStyle};
use crate::normalize;
use crate::task::{self, Task, TaskCatalog, TaskKind};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Fixed task time budget for time-limited runs.
pub const TASK_TIME_LIMIT: Duration = Duration::from_secs(5 * 60);

/// Normalized snapshot file names under the output directory.
pub const NORM_FILESYSTEM: &str = "norm_filesystem";
pub const NORM_STDOUT: &str = "norm_stdout";

/// Machine-readable run report written beside the snapshots.
pub const REPORT_FILE: &str = "report.json";

const RUN_REPORT_SCHEMA_VERSION: u32 = 1;

/// Separator printed ahead of learner-facing diagnostics.
pub const DIAGNOSTIC_RULE: &str =
    "-----------------------------------------------------------------------";

/// Warning for SELECT tasks whose filesystem no longer matches the pristine
/// state.
pub const FS_CHANGED_WARNING: &str =
    "WARNING: you have either changed directories or have modified the task filesystem; please reset";

/// Final classification of a run.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    FailFilesystem,
    FailSelectFsChanged,
    FailSelectOutput,
}

/// Exit-status conventions understood by calling harnesses.
#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitCodeScheme {
    /// Distinct small integer per branch so a calling harness can react
    /// differently to each failure mode.
    #[default]
    Distinct,
    /// Tutor-harness convention: pass=1, failure with time remaining=0,
    /// out of time=2.
    Coarse,
}

impl ExitCodeScheme {
    /// Status for unanticipated OS/process failures.
    pub fn fatal_code(self) -> i32 {
        match self {
            Self::Distinct => 1,
            Self::Coarse => 3,
        }
    }

    /// Status for a decided verdict. `time_exhausted` is only ever set on
    /// non-passing runs.
    pub fn code_for(self, verdict: Verdict, time_exhausted: bool) -> i32 {
        match self {
            Self::Distinct => {
                if time_exhausted {
                    6
                } else {
                    match verdict {
                        Verdict::Pass => 0,
                        Verdict::FailFilesystem => 3,
                        Verdict::FailSelectFsChanged => 4,
                        Verdict::FailSelectOutput => 5,
                    }
                }
            }
            Self::Coarse => {
                if time_exhausted {
                    2
                } else if verdict == Verdict::Pass {
                    1
                } else {
                    0
                }
            }
        }
    }
}

/// Knobs distinguishing the grading variants.
#[derive(Debug, Clone, Copy)]
pub struct GraderConfig {
    /// Enforce the fixed time budget on non-passing runs.
    pub time_limited: bool,
    /// Diff presentation on failure.
    pub diff_style: DiffStyle,
    /// Exit-status convention expected by the calling harness.
    pub exit_codes: ExitCodeScheme,
}

/// Inputs for a single verification run.
#[derive(Debug)]
pub struct VerifyRequest {
    pub task_code: String,
    /// Seconds since the learner started the task.
    pub elapsed_seconds: Option<u64>,
    /// Learner command words, re-joined verbatim for the shell.
    pub command: Vec<String>,
}

/// Outcome of a run, ready for exit-status mapping.
#[derive(Debug)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub time_exhausted: bool,
    pub exit_code: i32,
    /// Learner-facing diagnostic lines (archive mismatches, filesystem
    /// warnings).
    pub diagnostics: Vec<String>,
}

/// Run the full verification state machine for one request.
pub fn run(
    paths: &GraderPaths,
    config: &GraderConfig,
    caps: &DiffCapabilities,
    request: &VerifyRequest,
) -> Result<RunOutcome> {
    let catalog = TaskCatalog::new(paths.catalog_dir.clone());
    let task = catalog.task(&request.task_code);
    let mut diagnostics = Vec::new();

    // CAPTURE_FS
    let raw_fs = capture::capture_filesystem(&paths.task_root, &paths.output_dir)?;
    let norm_fs = paths.output_dir.join(NORM_FILESYSTEM);
    normalize::normalize_file(&raw_fs, &norm_fs)?;

    // CHECK_FS: snapshot comparison plus any registered structural check.
    let mut fs_matched = snapshots_match(&norm_fs, &task.expected_fs)?;
    if let Some(check) = task::extra_check_for(&task.code) {
        let archive_path = paths.task_root.join(check.archive_rel);
        match archive::check_members(&archive_path, check.required_members)? {
            ArchiveCheck::Passed | ArchiveCheck::Deferred => {}
            ArchiveCheck::Failed(mut lines) => {
                diagnostics.append(&mut lines);
                fs_matched = false;
            }
        }
    }
    tracing::debug!(task = %task.code, kind = ?task.kind, fs_matched, "filesystem check done");

    let norm_stdout = paths.output_dir.join(NORM_STDOUT);
    let mut stdout_captured = false;
    let verdict = match task.kind {
        TaskKind::Filesystem => {
            if fs_matched {
                Verdict::Pass
            } else {
                Verdict::FailFilesystem
            }
        }
        TaskKind::Select => {
            if !fs_matched {
                // The learner was expected to answer via output without
                // touching state; re-running their command against a
                // corrupted tree would be meaningless.
                diagnostics.push(FS_CHANGED_WARNING.to_string());
                Verdict::FailSelectFsChanged
            } else {
                // CAPTURE_STDOUT
                let raw_stdout =
                    capture::capture_stdout(&paths.task_root, &request.command, &paths.output_dir)?;
                normalize::normalize_file(&raw_stdout, &norm_stdout)?;
                stdout_captured = true;

                // CHECK_STDOUT
                if snapshots_match(&norm_stdout, &task.expected_select)? {
                    Verdict::Pass
                } else {
                    Verdict::FailSelectOutput
                }
            }
        }
    };

    if verdict != Verdict::Pass {
        let (actual, expected): (&Path, &Path) = match verdict {
            Verdict::FailSelectOutput => (&norm_stdout, &task.expected_select),
            _ => (&norm_fs, &task.expected_fs),
        };
        diff::report_failure(&paths.output_dir, actual, expected, config.diff_style, caps)?;
    }

    let time_exhausted = config.time_limited
        && verdict != Verdict::Pass
        && request
            .elapsed_seconds
            .is_some_and(|seconds| Duration::from_secs(seconds) >= TASK_TIME_LIMIT);

    let outcome = RunOutcome {
        verdict,
        time_exhausted,
        exit_code: config.exit_codes.code_for(verdict, time_exhausted),
        diagnostics,
    };
    write_report(paths, config, request, &task, &outcome, stdout_captured)?;
    tracing::info!(
        task = %task.code,
        verdict = ?outcome.verdict,
        exit_code = outcome.exit_code,
        "verification done"
    );
    Ok(outcome)
}

/// Byte-for-byte comparison of a normalized snapshot against its expected
/// fixture. A missing fixture is an environment failure, not a mismatch.
fn snapshots_match(norm_path: &Path, expected_path: &Path) -> Result<bool> {
    let actual = fs::read(norm_path)
        .with_context(|| format!("read snapshot {}", norm_path.display()))?;
    let expected = fs::read(expected_path)
        .with_context(|| format!("read expected fixture {}", expected_path.display()))?;
    Ok(actual == expected)
}

#[derive(Serialize)]
struct RunReport<'a> {
    schema_version: u32,
    task: &'a str,
    kind: TaskKind,
    verdict: Verdict,
    exit_code: i32,
    exit_scheme: ExitCodeScheme,
    time_limited: bool,
    time_exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_seconds: Option<u64>,
    diagnostics: &'a [String],
    raw_filesystem: String,
    norm_filesystem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    norm_stdout: Option<String>,
}

fn write_report(
    paths: &GraderPaths,
    config: &GraderConfig,
    request: &VerifyRequest,
    task: &Task,
    outcome: &RunOutcome,
    stdout_captured: bool,
) -> Result<()> {
    let report = RunReport {
        schema_version: RUN_REPORT_SCHEMA_VERSION,
        task: &task.code,
        kind: task.kind,
        verdict: outcome.verdict,
        exit_code: outcome.exit_code,
        exit_scheme: config.exit_codes,
        time_limited: config.time_limited,
        time_exhausted: outcome.time_exhausted,
        elapsed_seconds: request.elapsed_seconds,
        diagnostics: &outcome.diagnostics,
        raw_filesystem: capture::RAW_FILESYSTEM.to_string(),
        norm_filesystem: NORM_FILESYSTEM.to_string(),
        raw_stdout: stdout_captured.then(|| capture::RAW_STDOUT.to_string()),
        norm_stdout: stdout_captured.then(|| NORM_STDOUT.to_string()),
    };
    let path = paths.output_dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
