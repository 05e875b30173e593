#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// Checks if git is available on the system.
pub fn is_git_available() -> bool {
  Command::new("git").arg("--version").status().is_ok()
}

/// Runs a git command in the given directory, returning an error with stderr on
/// failure.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
  run_git_with_env(dir, args, &[])
}

/// Like [`run_git`], with extra environment variables for the child.
pub fn run_git_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<()> {
  let output = Command::new("git")
    .args(args)
    .envs(env.iter().copied())
    .current_dir(dir)
    .output()
    .with_context(|| format!("Failed to execute git {:?}", args))?;

  if !output.status.success() {
    anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}

/// Initializes a git repository in the given directory with deterministic
/// settings.
///
/// Configures:
/// - Default branch name set to `main`
/// - User name and email for commits
/// - Disables commit signing for test isolation
pub fn init_git_repo(dir: &Path) -> Result<()> {
  run_git(dir, &["init"])?;
  run_git(dir, &["config", "init.defaultBranch", "main"])?;
  run_git(dir, &["branch", "-M", "main"])?;
  run_git(dir, &["config", "user.name", "Test User"])?;
  run_git(dir, &["config", "user.email", "test@example.com"])?;
  // Disable commit signing for test isolation
  run_git(dir, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Stages everything and commits it as `author` (`Name <email>`) in `year`.
pub fn git_commit_as(dir: &Path, author: &str, year: i32, message: &str) -> Result<()> {
  let date = format!("{year}-06-01T12:00:00+00:00");
  run_git(dir, &["add", "-A"])?;
  run_git_with_env(
    dir,
    &["commit", "--author", author, "-m", message],
    &[("GIT_AUTHOR_DATE", date.as_str()), ("GIT_COMMITTER_DATE", date.as_str())],
  )
}

/// Writes `contents` to `path` below `dir`, creating parent directories.
pub fn write_file(dir: &Path, path: &str, contents: &str) -> Result<()> {
  let full = dir.join(path);
  if let Some(parent) = full.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(&full, contents).with_context(|| format!("Failed to write {}", full.display()))
}
