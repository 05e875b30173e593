//! # Mercurial Backend
//!
//! Runs `hg log` with custom templates. `HGPLAIN` is set so user
//! configuration cannot change the output format.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::command::Invocation;
use super::{VcsBackend, VcsError, relative_path};

const YEAR_TEMPLATE: &str = "{date|shortdate}\n";
const AUTHOR_TEMPLATE: &str = "{author}\n";

/// History source backed by the `hg` command.
#[derive(Debug, Clone)]
pub struct MercurialBackend {
  root: PathBuf,
  program: String,
}

impl MercurialBackend {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      program: "hg".to_string(),
    }
  }

  fn log(&self, template: &str, path: Option<&Path>) -> Result<String, VcsError> {
    let mut invocation = Invocation::new(&self.program)
      .env("HGPLAIN", "1")
      .args(["log", "--template", template]);
    if let Some(path) = path {
      invocation = invocation.arg("--follow").arg(relative_path(path));
    }
    Ok(invocation.run(&self.root)?.stdout)
  }
}

/// Parse `YYYY-MM-DD` lines into their years.
pub fn parse_years(output: &str) -> Result<BTreeSet<i32>, VcsError> {
  output
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(|line| {
      line
        .trim()
        .split('-')
        .next()
        .and_then(|year| year.parse().ok())
        .ok_or_else(|| VcsError::Parse {
          vcs: "Mercurial",
          line: line.to_string(),
        })
    })
    .collect()
}

pub fn parse_authors(output: &str) -> BTreeSet<String> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

impl VcsBackend for MercurialBackend {
  fn name(&self) -> &'static str {
    "Mercurial"
  }

  fn years(&self, path: Option<&Path>) -> Result<BTreeSet<i32>, VcsError> {
    parse_years(&self.log(YEAR_TEMPLATE, path)?)
  }

  fn authors(&self, path: Option<&Path>) -> Result<BTreeSet<String>, VcsError> {
    Ok(parse_authors(&self.log(AUTHOR_TEMPLATE, path)?))
  }

  /// Anything on stderr (or a failed command) means Mercurial does not know
  /// the file.
  fn is_versioned(&self, path: &Path) -> bool {
    Invocation::new(&self.program)
      .env("HGPLAIN", "1")
      .args(["log", "--limit", "1", "--follow"])
      .arg(relative_path(path))
      .run(&self.root)
      .is_ok_and(|output| output.stderr.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_years() {
    let years: Vec<i32> = parse_years("2012-03-04\n2009-12-31\n2012-01-01\n\n")
      .expect("valid output")
      .into_iter()
      .collect();
    assert_eq!(years, vec![2009, 2012]);
  }

  #[test]
  fn test_parse_years_rejects_garbage() {
    assert!(matches!(
      parse_years("not a date\n"),
      Err(VcsError::Parse { vcs: "Mercurial", .. })
    ));
  }

  #[test]
  fn test_parse_authors() {
    let authors: Vec<String> = parse_authors("Amy <a@x>\nBob\nAmy <a@x>\n").into_iter().collect();
    assert_eq!(authors, vec!["Amy <a@x>", "Bob"]);
  }

  #[test]
  fn test_missing_hg_is_not_versioned() {
    let mut backend = MercurialBackend::new(Path::new("."));
    backend.program = "update-copyright-no-such-hg".to_string();
    assert!(!backend.is_versioned(Path::new("a.txt")));
    assert!(matches!(backend.years(None), Err(VcsError::Spawn { .. })));
  }
}
