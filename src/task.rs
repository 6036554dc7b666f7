//! Task model, classification, and per-task extra checks.
//!
//! Task codes are opaque strings assigned by the task catalog. Which codes
//! are graded on filesystem state is a fixed policy here, as is the registry
//! of structural checks that run beyond the snapshot comparison.

use serde::Serialize;
use std::path::PathBuf;

/// Task codes graded on the resulting filesystem tree; every other code is
/// graded on command output.
const FILESYSTEM_TASKS: &[&str] = &[
    "2", "3", "4", "5", "6", "11", "12", "15", "17", "20", "22",
];

/// Base names every member of the archive-check task's tarball must
/// collectively match.
pub const REQUIRED_ARCHIVE_MEMBERS: &[&str] = &[
    "index.html",
    "home.html",
    "labs.html",
    "lesson.html",
    "menu.html",
    "navigation.html",
];

/// Structural check attached to a task code, run in addition to the
/// snapshot comparison.
#[derive(Debug)]
pub struct ExtraCheck {
    /// Archive location relative to the task working root.
    pub archive_rel: &'static str,
    /// Required member base names.
    pub required_members: &'static [&'static str],
}

const EXTRA_CHECKS: &[(&str, ExtraCheck)] = &[(
    "2",
    ExtraCheck {
        archive_rel: "html.tar",
        required_members: REQUIRED_ARCHIVE_MEMBERS,
    },
)];

/// Look up the structural check registered for a task code, if any.
pub fn extra_check_for(code: &str) -> Option<&'static ExtraCheck> {
    EXTRA_CHECKS
        .iter()
        .find(|(registered, _)| *registered == code)
        .map(|(_, check)| check)
}

/// How a task is graded.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Graded solely on resulting directory/file state.
    Filesystem,
    /// Graded on command output, contingent on the filesystem staying
    /// unmodified.
    Select,
}

/// A task resolved against the catalog: its kind plus both candidate
/// expected-result fixtures.
#[derive(Debug)]
pub struct Task {
    pub code: String,
    pub kind: TaskKind,
    pub expected_fs: PathBuf,
    /// Only consulted for [`TaskKind::Select`] tasks.
    pub expected_select: PathBuf,
}

/// Expected-fixture layout under the catalog root.
#[derive(Debug)]
pub struct TaskCatalog {
    root: PathBuf,
}

impl TaskCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a task code to its kind.
    pub fn classify(code: &str) -> TaskKind {
        if FILESYSTEM_TASKS.contains(&code) {
            TaskKind::Filesystem
        } else {
            TaskKind::Select
        }
    }

    /// Resolve a task code to its kind and expected-result fixtures.
    pub fn task(&self, code: &str) -> Task {
        Task {
            code: code.to_string(),
            kind: Self::classify(code),
            expected_fs: self
                .root
                .join("fs_status")
                .join(format!("task{code}.fs.out")),
            expected_select: self
                .root
                .join("select_targets")
                .join(format!("task{code}.select.out")),
        }
    }
}
