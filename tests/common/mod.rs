//! Shared test infrastructure for engine integration tests.

use std::fs;
use std::path::PathBuf;
use taskgrade::config::{DiffCapabilities, GraderPaths};
use taskgrade::diff::DiffStyle;
use taskgrade::engine::{self, ExitCodeScheme, GraderConfig, RunOutcome, VerifyRequest};
use tempfile::TempDir;

/// Throwaway task catalog plus working filesystem for one test.
pub struct GraderFixture {
    _root: TempDir,
    pub paths: GraderPaths,
}

// Each integration test binary compiles its own copy of this module and
// uses a different subset of the helpers.
#[allow(dead_code)]
impl GraderFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create fixture root");
        let task_root = root.path().join("task_fs");
        let catalog_dir = root.path().join("verify_out");
        fs::create_dir_all(&task_root).expect("create task root");
        fs::create_dir_all(catalog_dir.join("fs_status")).expect("create fs_status");
        fs::create_dir_all(catalog_dir.join("select_targets")).expect("create select_targets");
        let paths = GraderPaths {
            task_root,
            output_dir: root.path().join("user_output"),
            catalog_dir,
        };
        Self { _root: root, paths }
    }

    /// Write the expected filesystem fixture for a task code.
    pub fn write_expected_fs(&self, code: &str, lines: &[&str]) {
        write_fixture(
            self.paths
                .catalog_dir
                .join("fs_status")
                .join(format!("task{code}.fs.out")),
            lines,
        );
    }

    /// Write the expected stdout fixture for a SELECT task code.
    pub fn write_expected_select(&self, code: &str, lines: &[&str]) {
        write_fixture(
            self.paths
                .catalog_dir
                .join("select_targets")
                .join(format!("task{code}.select.out")),
            lines,
        );
    }

    /// Run a task with the default distinct exit codes and no time budget.
    pub fn run_task(&self, code: &str, command: &[&str]) -> RunOutcome {
        self.run_with(code, command, None, ExitCodeScheme::Distinct)
    }

    pub fn run_with(
        &self,
        code: &str,
        command: &[&str],
        elapsed: Option<u64>,
        exit_codes: ExitCodeScheme,
    ) -> RunOutcome {
        let config = GraderConfig {
            time_limited: elapsed.is_some(),
            diff_style: DiffStyle::Off,
            exit_codes,
        };
        let request = VerifyRequest {
            task_code: code.to_string(),
            elapsed_seconds: elapsed,
            command: command.iter().map(|word| word.to_string()).collect(),
        };
        engine::run(&self.paths, &config, &DiffCapabilities::default(), &request)
            .expect("verification run")
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.paths.output_dir.join(name)
    }
}

impl Default for GraderFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_fixture(path: PathBuf, lines: &[&str]) {
    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }
    fs::write(path, text).expect("write fixture");
}
