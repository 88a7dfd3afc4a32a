//! Tests for the command-line front end, run against the built binary.

use std::process::Command;

fn ptyscript_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ptyscript"));
    cmd.env("PTYSCRIPT_CONFIG", "/nonexistent/ptyscript/session.toml");
    cmd
}

#[test]
fn test_help_shows_step_option() {
    let output = ptyscript_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--step"));
    assert!(stdout.contains("answer:PROMPT=>RESPONSE"));
}

#[test]
fn test_invalid_step_is_rejected() {
    let output = ptyscript_cmd()
        .args(["--step", "wiggle:x", "--", "true"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown step kind 'wiggle'"));
}

#[cfg(unix)]
#[test]
fn test_answers_prompt_and_prints_output() {
    let output = ptyscript_cmd()
        .args([
            "--timeout-secs",
            "5",
            "--step",
            "answer:Name? =>bob",
            "--",
            "sh",
            "-c",
            "printf 'Name? '; read n; echo \"hi $n\"",
        ])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("hi bob"), "stdout: {stdout}");
}

#[cfg(unix)]
#[test]
fn test_exit_code_is_propagated() {
    let output = ptyscript_cmd()
        .args(["--", "sh", "-c", "exit 4"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(4));
}
