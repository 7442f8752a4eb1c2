//! Shared test harness for inspection CLI integration tests.
//!
//! Spawns the compiled `vcsr` binary against temporary repositories and
//! captures its output for assertion. Environment variables are pinned for
//! deterministic output across machines and CI runners.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Discover the path to the compiled `vcsr` binary.
pub fn vcsr_bin() -> PathBuf {
    let mut path = std::env::current_exe()
        .unwrap()
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    path.push("vcsr");
    path
}

fn pin_env(cmd: &mut Command) {
    cmd.env("TZ", "UTC").env("LC_ALL", "C").env("LANG", "C");
}

/// Run the `vcsr` binary in `dir` with the given arguments.
pub fn vcsr(dir: &Path, args: &[&str]) -> CommandResult {
    let mut cmd = Command::new(vcsr_bin());
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd);
    let output = cmd.output().expect("failed to run vcsr");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Create a temporary bare git repository and return (tempdir, repo_path).
pub fn setup_bare_repo() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let status = Command::new("git")
        .args(["init", "--bare"])
        .current_dir(dir.path())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git init failed");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Use C git to write a blob and return its hex OID.
pub fn git_hash_object(repo_dir: &Path, content: &[u8]) -> String {
    use std::io::Write;
    let mut child = Command::new("git")
        .args(["hash-object", "-w", "--stdin"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(content).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "git hash-object failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Use C git to repack all objects into a packfile and prune the loose copies.
pub fn git_repack(repo_dir: &Path) {
    let status = Command::new("git")
        .args(["repack", "-a", "-d"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git repack failed");

    let status = Command::new("git")
        .args(["prune-packed"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git prune-packed failed");
}
