//! Environment-derived grader configuration.
//!
//! Environment lookups happen here, once, at startup; the engine only ever
//! sees the resolved paths and capabilities.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Fallback side-by-side viewer probed on PATH when `DIFF_TOOL` is unset.
const DEFAULT_VIEWER: &str = "meld";

/// Directory layout for one verification run.
#[derive(Debug, Clone)]
pub struct GraderPaths {
    /// Learner's working filesystem root; the listing and learner commands
    /// run here.
    pub task_root: PathBuf,
    /// Per-run captures and snapshots.
    pub output_dir: PathBuf,
    /// Expected-fixture catalog root.
    pub catalog_dir: PathBuf,
}

impl GraderPaths {
    /// Resolve the layout from `TASK_DIR` and `REPO_DIR`.
    pub fn from_env() -> Result<Self> {
        let task_root = PathBuf::from(required_var("TASK_DIR")?);
        let repo_dir = PathBuf::from(required_var("REPO_DIR")?);
        Ok(Self {
            task_root,
            output_dir: repo_dir.join("user_output"),
            catalog_dir: repo_dir.join("verify_out"),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("environment variable {name} is not set"))
}

/// Diff presentation abilities probed from the calling environment.
#[derive(Debug, Clone, Default)]
pub struct DiffCapabilities {
    /// Side-by-side viewer command, when one is configured or installed.
    pub viewer: Option<Vec<String>>,
    /// Whether a graphical display is available for the HTML diff.
    pub graphical: bool,
}

impl DiffCapabilities {
    /// Probe `DIFF_TOOL`, fall back to `meld` on PATH, and check `DISPLAY`.
    pub fn probe() -> Self {
        Self {
            viewer: resolve_viewer(),
            graphical: env::var("DISPLAY").is_ok_and(|value| !value.is_empty()),
        }
    }
}

fn resolve_viewer() -> Option<Vec<String>> {
    if let Ok(value) = env::var("DIFF_TOOL") {
        if !value.trim().is_empty() {
            if let Ok(words) = shell_words::split(&value) {
                if !words.is_empty() {
                    return Some(words);
                }
            }
        }
    }
    which::which(DEFAULT_VIEWER)
        .ok()
        .map(|path| vec![path.display().to_string()])
}
