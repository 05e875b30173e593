mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use chrono::{Datelike, Utc};
use common::{git_commit_as, init_git_repo, is_git_available, write_file};
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

const CONFIG: &str = r#"[project]
name = "demo"

[copyright]
long = ["This file is part of %(project)s."]
short = ["%(project)s comes with ABSOLUTELY NO WARRANTY."]

[files]
ignored = ["./.git", "./vendor"]
pyfile = "demo/_license.py"

[authors]
with-email = false
"#;

const A_PY: &str = "#!/usr/bin/env python\n# Copyright (C) 2000 Nobody\n\nprint('a')\n";
const VENDOR_PY: &str = "# Copyright (C) 2000 Vendor\nprint('v')\n";
const UNTRACKED_PY: &str = "# Copyright (C) 2000 Nobody\n";

/// A git project with history in 2008 and 2010 and one untracked file.
fn setup_project() -> Result<TempDir> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  init_git_repo(root)?;

  write_file(root, ".update-copyright.toml", CONFIG)?;
  write_file(root, "a.py", A_PY)?;
  write_file(root, "plain.py", "print('no block')\n")?;
  write_file(root, "vendor/v.py", VENDOR_PY)?;
  git_commit_as(root, "Jack <jack@example.com>", 2008, "Initial import")?;

  write_file(root, "a.py", &A_PY.replace("print('a')", "print('a!')"))?;
  git_commit_as(root, "Jill <jill@example.com>", 2010, "Shout")?;

  write_file(root, "untracked.py", UNTRACKED_PY)?;
  Ok(temp_dir)
}

fn update_copyright(root: &Path) -> Result<Command> {
  let mut cmd = Command::cargo_bin("update-copyright")?;
  cmd.arg("--root").arg(root).arg("--colors=never").current_dir(root);
  Ok(cmd)
}

fn expected_a_py() -> String {
  format!(
    concat!(
      "#!/usr/bin/env python\n",
      "# Copyright (C) 2008-{} Jack\n",
      "#                         Jill\n",
      "#\n",
      "# This file is part of demo.\n",
      "\n",
      "print('a!')\n",
    ),
    Utc::now().year()
  )
}

#[test]
fn test_updates_blocks_authors_and_pyfile() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }
  let temp_dir = setup_project()?;
  let root = temp_dir.path();

  update_copyright(root)?
    .assert()
    .success()
    .stdout(predicate::str::contains("Updated 1 file"))
    .stdout(predicate::str::contains("./a.py"));

  assert_eq!(fs::read_to_string(root.join("a.py"))?, expected_a_py());
  assert_eq!(
    fs::read_to_string(root.join("AUTHORS"))?,
    "demo was written by:\nJack\nJill\n"
  );

  let module = fs::read_to_string(root.join("demo/_license.py"))?;
  assert!(module.starts_with("# Copyright (C) 2008-"));
  assert!(module.contains("def short_license(info, wrap=True, **kwargs):"));

  // Files without a block, ignored files and unversioned files are untouched.
  assert_eq!(fs::read_to_string(root.join("plain.py"))?, "print('no block')\n");
  assert_eq!(fs::read_to_string(root.join("vendor/v.py"))?, VENDOR_PY);
  assert_eq!(fs::read_to_string(root.join("untracked.py"))?, UNTRACKED_PY);

  Ok(())
}

#[test]
fn test_second_run_is_a_no_op() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }
  let temp_dir = setup_project()?;
  let root = temp_dir.path();

  update_copyright(root)?.assert().success();
  let first = fs::read_to_string(root.join("a.py"))?;

  update_copyright(root)?
    .assert()
    .success()
    .stdout(predicate::str::contains("All copyright notices are up to date."))
    .stdout(predicate::str::contains("0 created, 0 updated"));
  assert_eq!(fs::read_to_string(root.join("a.py"))?, first);

  Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }
  let temp_dir = setup_project()?;
  let root = temp_dir.path();
  let diff_path = root.join("changes.diff");

  update_copyright(root)?
    .arg("--dry-run")
    .arg("--save-diff")
    .arg(&diff_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Checking"))
    .stdout(predicate::str::contains("Would update 1 file"))
    .stdout(predicate::str::contains("Would create 2 files"));

  assert_eq!(
    fs::read_to_string(root.join("a.py"))?,
    A_PY.replace("print('a')", "print('a!')")
  );
  assert!(!root.join("AUTHORS").exists());
  assert!(!root.join("demo/_license.py").exists());

  let diff = fs::read_to_string(&diff_path)?;
  assert!(diff.contains("--- a/a.py"));
  assert!(diff.contains("+# Copyright (C) 2008-"));

  Ok(())
}

#[test]
fn test_explicit_files_without_authors_or_pyfile() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }
  let temp_dir = setup_project()?;
  let root = temp_dir.path();

  update_copyright(root)?
    .args(["--no-authors", "--no-pyfile", "a.py"])
    .assert()
    .success();

  assert_eq!(fs::read_to_string(root.join("a.py"))?, expected_a_py());
  assert!(!root.join("AUTHORS").exists());
  assert!(!root.join("demo/_license.py").exists());

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }
  let temp_dir = setup_project()?;
  let root = temp_dir.path();
  let report_path = root.join("report.json");

  update_copyright(root)?
    .arg("--quiet")
    .arg("--report-json")
    .arg(&report_path)
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
  assert_eq!(report["summary"]["created"], 2);
  assert_eq!(report["summary"]["updated"], 1);
  assert_eq!(report["summary"]["dry_run"], false);

  let files = report["files"].as_array().expect("files array");
  let untracked = files
    .iter()
    .find(|file| file["path"] == "untracked.py")
    .expect("untracked.py is reported");
  assert_eq!(untracked["action"], "skipped");

  Ok(())
}

#[test]
fn test_unknown_vcs_fails_before_writing() -> Result<()> {
  let temp_dir = tempdir()?;
  let root = temp_dir.path();
  write_file(root, ".update-copyright.toml", "[project]\nvcs = \"CVS\"\n")?;
  write_file(root, "a.py", A_PY)?;

  update_copyright(root)?
    .assert()
    .failure()
    .stderr(predicate::str::contains("CVS"));

  assert_eq!(fs::read_to_string(root.join("a.py"))?, A_PY);
  assert!(!root.join("AUTHORS").exists());

  Ok(())
}

#[test]
fn test_missing_explicit_config_fails() -> Result<()> {
  let temp_dir = tempdir()?;

  update_copyright(temp_dir.path())?
    .arg("--config")
    .arg(temp_dir.path().join("nope.toml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Config file not found"));

  Ok(())
}
