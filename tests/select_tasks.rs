//! Grading of SELECT-kind tasks: output-graded, contingent on an untouched
//! filesystem.

mod common;

use common::GraderFixture;
use std::fs;
use taskgrade::engine::{Verdict, FS_CHANGED_WARNING};

fn seed_data_file(fixture: &GraderFixture) {
    fs::write(fixture.paths.task_root.join("data.txt"), "alpha\nbeta\n").expect("seed data");
    fixture.write_expected_fs("1", &[".", "data.txt"]);
}

#[test]
fn passes_with_matching_output_and_untouched_tree() {
    let fixture = GraderFixture::new();
    seed_data_file(&fixture);
    fixture.write_expected_select("1", &["hello"]);

    let outcome = fixture.run_task("1", &["echo", "hello"]);

    assert_eq!(outcome.verdict, Verdict::Pass);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn filesystem_change_short_circuits_before_running_the_command() {
    let fixture = GraderFixture::new();
    seed_data_file(&fixture);
    fs::write(fixture.paths.task_root.join("stray.txt"), "oops").expect("write stray");
    fixture.write_expected_select("1", &["hello"]);

    let outcome = fixture.run_task("1", &["echo", "hello"]);

    assert_eq!(outcome.verdict, Verdict::FailSelectFsChanged);
    assert_eq!(outcome.exit_code, 4);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|line| line == FS_CHANGED_WARNING));
    // The learner command is never re-executed against a corrupted tree.
    assert!(!fixture.output_file("stdout").exists());
}

#[test]
fn wrong_output_fails_after_matching_tree() {
    let fixture = GraderFixture::new();
    seed_data_file(&fixture);
    fixture.write_expected_select("1", &["hello"]);

    let outcome = fixture.run_task("1", &["echo", "goodbye"]);

    assert_eq!(outcome.verdict, Verdict::FailSelectOutput);
    assert_eq!(outcome.exit_code, 5);
    assert_eq!(
        fs::read_to_string(fixture.output_file("actual.out")).expect("read actual"),
        "goodbye\n"
    );
    assert_eq!(
        fs::read_to_string(fixture.output_file("expected.out")).expect("read expected"),
        "hello\n"
    );
}

#[test]
fn output_comparison_ignores_line_order() {
    let fixture = GraderFixture::new();
    seed_data_file(&fixture);
    fixture.write_expected_select("1", &["alpha", "beta"]);

    // tac-style reversed output still matches after normalization.
    let outcome = fixture.run_task("1", &["printf", "'beta\\nalpha\\n'"]);

    assert_eq!(outcome.verdict, Verdict::Pass);
}

#[test]
fn shell_words_pass_through_for_pipelines() {
    let fixture = GraderFixture::new();
    seed_data_file(&fixture);
    fixture.write_expected_select("1", &["2"]);

    let outcome = fixture.run_task("1", &["cat", "data.txt", "|", "wc", "-l"]);

    assert_eq!(outcome.verdict, Verdict::Pass);
}
