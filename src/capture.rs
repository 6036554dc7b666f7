//! Raw output capture for the listing command and the learner command.
//!
//! Each capture redirects child stdout straight to a file in the user
//! output directory; stderr is discarded. A child's exit status never
//! decides pass/fail on its own — only the later comparison does — so it is
//! logged and otherwise ignored.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Raw capture file names under the user output directory.
pub const RAW_FILESYSTEM: &str = "filesystem";
pub const RAW_STDOUT: &str = "stdout";

/// Run `find .` inside the task root, capturing its stdout.
pub fn capture_filesystem(task_root: &Path, output_dir: &Path) -> Result<PathBuf> {
    let raw_path = prepare_capture_path(output_dir, RAW_FILESYSTEM)?;
    let stdout = open_capture_file(&raw_path)?;
    let status = Command::new("find")
        .arg(".")
        .current_dir(task_root)
        .stdout(stdout)
        .stderr(Stdio::null())
        .status()
        .context("spawn find")?;
    tracing::debug!(exit = ?status.code(), "captured filesystem listing");
    Ok(raw_path)
}

/// Run the learner's command through the shell, capturing its stdout.
///
/// The words are re-joined with spaces exactly as typed so the shell keeps
/// interpreting globs, pipes, and redirections; this crate never parses
/// shell syntax itself.
pub fn capture_stdout(
    task_root: &Path,
    command_words: &[String],
    output_dir: &Path,
) -> Result<PathBuf> {
    let raw_path = prepare_capture_path(output_dir, RAW_STDOUT)?;
    let stdout = open_capture_file(&raw_path)?;
    let command_line = command_words.join(" ");
    let status = Command::new("sh")
        .arg("-c")
        .arg(&command_line)
        .current_dir(task_root)
        .stdout(stdout)
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("spawn learner command: {command_line}"))?;
    tracing::debug!(exit = ?status.code(), %command_line, "captured learner command output");
    Ok(raw_path)
}

fn prepare_capture_path(output_dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    Ok(output_dir.join(name))
}

fn open_capture_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("open capture file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_capture_lists_the_task_root() {
        let task_root = tempfile::tempdir().expect("task root");
        let output = tempfile::tempdir().expect("output dir");
        fs::create_dir(task_root.path().join("newdir")).expect("mkdir");

        let raw = capture_filesystem(task_root.path(), output.path()).expect("capture");
        let content = fs::read_to_string(raw).expect("read capture");
        assert!(content.lines().any(|line| line == "."));
        assert!(content.lines().any(|line| line == "./newdir"));
    }

    #[test]
    fn stdout_capture_records_command_output() {
        let task_root = tempfile::tempdir().expect("task root");
        let output = tempfile::tempdir().expect("output dir");

        let words = vec!["echo".to_string(), "hello".to_string()];
        let raw = capture_stdout(task_root.path(), &words, output.path()).expect("capture");
        assert_eq!(fs::read_to_string(raw).expect("read capture"), "hello\n");
    }

    #[test]
    fn failing_command_is_not_a_capture_error() {
        let task_root = tempfile::tempdir().expect("task root");
        let output = tempfile::tempdir().expect("output dir");

        let words = vec!["false".to_string()];
        let raw = capture_stdout(task_root.path(), &words, output.path()).expect("capture");
        assert_eq!(fs::read_to_string(raw).expect("read capture"), "");
    }

    #[test]
    fn capture_creates_the_output_directory() {
        let task_root = tempfile::tempdir().expect("task root");
        let base = tempfile::tempdir().expect("base dir");
        let output = base.path().join("user_output");

        capture_filesystem(task_root.path(), &output).expect("capture");
        assert!(output.join(RAW_FILESYSTEM).is_file());
    }
}
