//! # Bazaar Backend
//!
//! Runs `bzr log --long --levels=0` and parses the revision records. Merged
//! revisions are indented below their merge point; each record's fields
//! share the indentation of its separator line.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};

use super::command::Invocation;
use super::{VcsBackend, VcsError, relative_path};

const SEPARATOR: &str = "------------------------------------------------------------";
const TIMESTAMP_FORMAT: &str = "%a %Y-%m-%d %H:%M:%S %z";

/// One revision from `bzr log`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Revision {
  pub committer: Option<String>,
  pub authors: Vec<String>,
  /// Commit year in UTC.
  pub year: Option<i32>,
}

impl Revision {
  /// The authors if recorded, otherwise the committer.
  pub fn apparent_authors(&self) -> Vec<String> {
    if self.authors.is_empty() {
      self.committer.iter().cloned().collect()
    } else {
      self.authors.clone()
    }
  }
}

/// Parse the output of `bzr log --long --levels=0`.
///
/// # Errors
///
/// Returns [`VcsError::Parse`] for an unreadable timestamp.
pub fn parse_log(output: &str) -> Result<Vec<Revision>, VcsError> {
  let mut revisions = Vec::new();
  let mut current: Option<(usize, Revision)> = None;

  for line in output.lines() {
    let indent = line.len() - line.trim_start().len();
    let body = line.trim();

    if body == SEPARATOR {
      if let Some((_, revision)) = current.take() {
        revisions.push(revision);
      }
      current = Some((indent, Revision::default()));
      continue;
    }

    let Some((field_indent, revision)) = current.as_mut() else {
      continue;
    };
    if indent != *field_indent {
      continue;
    }
    let Some((key, value)) = body.split_once(':') else {
      continue;
    };
    let value = value.trim();

    match key {
      "committer" => revision.committer = Some(value.to_string()),
      "author" => revision.authors.push(value.to_string()),
      "authors" => revision
        .authors
        .extend(value.split(", ").filter(|a| !a.is_empty()).map(str::to_string)),
      "timestamp" => {
        let stamp = DateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| VcsError::Parse {
          vcs: "Bazaar",
          line: line.to_string(),
        })?;
        revision.year = Some(stamp.with_timezone(&Utc).year());
      }
      _ => {}
    }
  }

  if let Some((_, revision)) = current {
    revisions.push(revision);
  }
  Ok(revisions)
}

/// History source backed by the `bzr` command.
#[derive(Debug, Clone)]
pub struct BazaarBackend {
  root: PathBuf,
  program: String,
}

impl BazaarBackend {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      program: "bzr".to_string(),
    }
  }

  fn log(&self, path: Option<&Path>) -> Result<Vec<Revision>, VcsError> {
    let mut invocation = Invocation::new(&self.program).args(["log", "--long", "--levels=0"]);
    if let Some(path) = path {
      invocation = invocation.arg(relative_path(path));
    }
    parse_log(&invocation.run(&self.root)?.stdout)
  }
}

impl VcsBackend for BazaarBackend {
  fn name(&self) -> &'static str {
    "Bazaar"
  }

  fn years(&self, path: Option<&Path>) -> Result<BTreeSet<i32>, VcsError> {
    Ok(self.log(path)?.iter().filter_map(|revision| revision.year).collect())
  }

  fn authors(&self, path: Option<&Path>) -> Result<BTreeSet<String>, VcsError> {
    Ok(self.log(path)?.iter().flat_map(Revision::apparent_authors).collect())
  }

  fn is_versioned(&self, path: &Path) -> bool {
    Invocation::new(&self.program)
      .args(["log", "--limit=1"])
      .arg(relative_path(path))
      .run(&self.root)
      .is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LOG: &str = "\
------------------------------------------------------------
revno: 3 [merge]
committer: Amy <amy@a.org>
branch nick: trunk
timestamp: Fri 2010-01-01 00:30:00 +0100
message:
  merge feature
  author: not a field
    ------------------------------------------------------------
    revno: 2.1.1
    committer: Bob <bob@b.org>
    authors: Carol <carol@c.org>, Dan <dan@d.org>
    branch nick: feature
    timestamp: Sat 2008-05-03 10:00:00 -0400
    message:
      feature work
------------------------------------------------------------
revno: 1
committer: Amy <amy@a.org>
author: Eve <eve@e.org>
branch nick: trunk
timestamp: Mon 2007-02-05 09:00:00 +0000
message:
  initial
";

  #[test]
  fn test_parse_log() {
    let revisions = parse_log(LOG).expect("valid log");
    assert_eq!(revisions.len(), 3);

    // 00:30 at +0100 is still 2009 in UTC.
    assert_eq!(revisions[0].year, Some(2009));
    assert_eq!(revisions[0].apparent_authors(), vec!["Amy <amy@a.org>"]);

    assert_eq!(revisions[1].year, Some(2008));
    assert_eq!(
      revisions[1].apparent_authors(),
      vec!["Carol <carol@c.org>", "Dan <dan@d.org>"]
    );

    assert_eq!(revisions[2].year, Some(2007));
    assert_eq!(revisions[2].apparent_authors(), vec!["Eve <eve@e.org>"]);
  }

  #[test]
  fn test_parse_empty_log() {
    assert!(parse_log("").expect("empty log").is_empty());
  }

  #[test]
  fn test_parse_bad_timestamp() {
    let log = format!("{SEPARATOR}\nrevno: 1\ntimestamp: yesterday\n");
    assert!(matches!(parse_log(&log), Err(VcsError::Parse { vcs: "Bazaar", .. })));
  }

  #[test]
  fn test_missing_bzr_is_not_versioned() {
    let mut backend = BazaarBackend::new(Path::new("."));
    backend.program = "update-copyright-no-such-bzr".to_string();
    assert!(!backend.is_versioned(Path::new("a.txt")));
  }
}
