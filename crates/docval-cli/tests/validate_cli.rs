// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end tests against the built `docval` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn docval(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docval"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run docval")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn binding_carries_to_later_example() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("guide.md"),
        "# Guide\n\nDefine a value:\n\n>>> let answer = 6 * 7\n\nThen use it:\n\n>>> answer\n42\n",
    )
    .unwrap();

    let out = docval(dir.path(), &["validate", "guide.md"]);
    assert_eq!(out.status.code(), Some(0), "stdout: {}", stdout(&out));
    assert!(stdout(&out).contains("1 files, 2 examples, 2 passed, 0 failed, 0 errored"));
}

#[test]
fn mismatch_shows_diff_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), "Intro\n\n>>> 1 + 1\n3\n").unwrap();

    let out = docval(dir.path(), &["validate", "doc.md"]);
    assert_eq!(out.status.code(), Some(1));
    let text = stdout(&out);
    assert!(text.contains("doc.md:3"), "{}", text);
    assert!(text.contains("--- expected"));
    assert!(text.contains("-3"));
    assert!(text.contains("+2"));
}

#[test]
fn timeout_aborts_the_rest_of_the_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), ">>> loop { }\n\n>>> 1\n1\n").unwrap();

    let out = docval(dir.path(), &["validate", "--timeout-ms", "100", "doc.md"]);
    assert_eq!(out.status.code(), Some(1));
    let text = stdout(&out);
    assert!(text.contains("error: timeout"), "{}", text);
    assert!(text.contains("skipped: session aborted"));
}

#[test]
fn unterminated_fence_does_not_hide_examples() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), "```docval run\n>>> 1 + 2\n3\n").unwrap();

    let out = docval(dir.path(), &["validate", "doc.md"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    let text = stdout(&out);
    assert!(text.contains("skipped: unparseable"));
    assert!(text.contains("1 passed"));
}

#[test]
fn expected_error_annotation_passes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("errors.md"),
        ">>> [1, 2][5]\nTraceback (most recent call last):\n  line 1, in example\nIndexError: list index 5 out of range for length 2\n",
    )
    .unwrap();

    let out = docval(dir.path(), &["validate", "errors.md"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
}

#[test]
fn directories_are_expanded() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs/nested")).unwrap();
    fs::write(dir.path().join("docs/a.md"), ">>> 1\n1\n").unwrap();
    fs::write(dir.path().join("docs/nested/b.txt"), ">>> 2\n2\n").unwrap();
    fs::write(dir.path().join("docs/image.png"), "").unwrap();

    let out = docval(dir.path(), &["validate", "docs"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("2 files, 2 examples, 2 passed"));
}

#[test]
fn python_doctests_are_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/util.py"),
        "def half(x):\n    \"\"\"\n    >>> import math\n    >>> math.floor(2.5)\n    2\n    \"\"\"\n",
    )
    .unwrap();

    let out = docval(dir.path(), &["validate", "src"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    assert!(stdout(&out).contains("skipped: no executor for language 'python'"));
}

#[test]
fn no_inputs_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();

    let out = docval(dir.path(), &["validate", "empty"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("no input files"));
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), ">>> \"a\" + \"b\"\n\"ab\"\n\n>>> missing\n").unwrap();

    let out = docval(dir.path(), &["validate", "--format", "json", "doc.md"]);
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["total_examples"], 2);
    assert_eq!(json["total_passed"], 1);
    assert_eq!(json["total_errored"], 1);
    let results = &json["file_reports"][0]["results"];
    assert_eq!(results[0]["status"], "pass");
    assert_eq!(results[1]["status"], "error");
    assert_eq!(results[1]["description"], "NameError: undefined variable 'missing'");
}

#[test]
fn config_file_and_flag_overrides() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("docval.toml"), "equivalence = \"normalize-whitespace\"\n").unwrap();
    fs::write(dir.path().join("doc.md"), ">>> [1, 2, 3]\n[1,  2,\n 3]\n").unwrap();

    let out = docval(dir.path(), &["validate", "doc.md"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));

    let out = docval(dir.path(), &["validate", "--equivalence", "exact", "doc.md"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unknown_config_key_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("custom.toml"), "timeout = 10\n").unwrap();
    fs::write(dir.path().join("doc.md"), ">>> 1\n1\n").unwrap();

    let out = docval(dir.path(), &["validate", "--config", "custom.toml", "doc.md"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("custom.toml"));
}

#[test]
fn missing_style_checker_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("docval.toml"), "[style]\ncommand = \"docval-no-such-checker\"\n").unwrap();
    fs::write(dir.path().join("mod.py"), "\"\"\"Docs.\"\"\"\n").unwrap();

    let out = docval(dir.path(), &["style", "mod.py"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("docval-no-such-checker"));
}

#[cfg(unix)]
#[test]
fn shell_examples_run_in_one_shell() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cli.md"),
        "```console run\n$ NAME=docs\n$ echo \"hello $NAME\"\nhello docs\n```\n",
    )
    .unwrap();

    let out = docval(dir.path(), &["validate", "cli.md"]);
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    assert!(stdout(&out).contains("2 examples, 2 passed"));
}

#[cfg(unix)]
#[test]
fn style_forwards_checker_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("docval.toml"),
        "[style]\ncommand = \"sh\"\nargs = [\"-c\", \"exit 4\"]\n",
    )
    .unwrap();
    fs::write(dir.path().join("mod.py"), "\"\"\"Docs.\"\"\"\n").unwrap();

    let out = docval(dir.path(), &["style", "mod.py"]);
    assert_eq!(out.status.code(), Some(4));
}
