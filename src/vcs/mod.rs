//! # VCS Module
//!
//! Backends that answer two questions about a file (or, given no file, about
//! the whole project): in which years was it committed to, and by whom.
//!
//! The module is organized into several submodules:
//! - [`git`] - Git history read through `git2`, honouring `.mailmap`
//! - [`mercurial`] - Mercurial history read through the `hg` command
//! - [`bazaar`] - Bazaar history read through the `bzr` command
//! - [`command`] - Captured external process invocation
//!
//! [`History`] layers the configured override tables and alias resolution on
//! top of whichever backend the project uses.

pub mod bazaar;
pub mod command;
pub mod git;
pub mod mercurial;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

pub use bazaar::BazaarBackend;
pub use git::GitBackend;
pub use mercurial::MercurialBackend;
use tracing::debug;

use crate::authors::AliasResolver;
use crate::copyright::current_year;

/// Errors raised while querying version control.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
  /// The external tool could not be started.
  #[error("Failed to run {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  /// The external tool exited with an unexpected status.
  #[error("{program} {args:?} exited with status {status:?}: {stderr}")]
  CommandFailed {
    program: String,
    args: Vec<String>,
    status: Option<i32>,
    stderr: String,
  },

  /// libgit2 reported an error.
  #[error("Git error: {0}")]
  Git(#[from] git2::Error),

  /// The tool's output could not be understood.
  #[error("Unexpected {vcs} output: {line:?}")]
  Parse { vcs: &'static str, line: String },
}

/// Supported version control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vcs {
  Git,
  Bazaar,
  Mercurial,
}

impl Vcs {
  /// Name used in configuration files and the `%(vcs)s` placeholder.
  pub const fn name(self) -> &'static str {
    match self {
      Vcs::Git => "Git",
      Vcs::Bazaar => "Bazaar",
      Vcs::Mercurial => "Mercurial",
    }
  }

  /// Metadata directory that marks a repository root.
  pub const fn metadata_dir(self) -> &'static str {
    match self {
      Vcs::Git => ".git",
      Vcs::Bazaar => ".bzr",
      Vcs::Mercurial => ".hg",
    }
  }

  /// Open the backend for a repository containing `root`.
  pub fn open(self, root: &Path) -> Result<Box<dyn VcsBackend>, VcsError> {
    Ok(match self {
      Vcs::Git => Box::new(GitBackend::discover(root)?),
      Vcs::Bazaar => Box::new(BazaarBackend::new(root)),
      Vcs::Mercurial => Box::new(MercurialBackend::new(root)),
    })
  }
}

impl fmt::Display for Vcs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Error returned when parsing an unknown VCS name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown VCS: {0} (expected Git, Bazaar or Mercurial)")]
pub struct ParseVcsError(pub String);

impl FromStr for Vcs {
  type Err = ParseVcsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "git" => Ok(Vcs::Git),
      "bazaar" | "bzr" => Ok(Vcs::Bazaar),
      "mercurial" | "hg" => Ok(Vcs::Mercurial),
      _ => Err(ParseVcsError(s.to_string())),
    }
  }
}

/// Contract shared by the version control backends.
///
/// Paths are relative to the project root the backend was opened for.
/// `None` queries the whole project.
pub trait VcsBackend {
  /// Human readable name, e.g. `"Git"`.
  fn name(&self) -> &'static str;

  /// Calendar years of the commits that touched `path`, following renames.
  fn years(&self, path: Option<&Path>) -> Result<BTreeSet<i32>, VcsError>;

  /// Distinct author identities of the commits that touched `path`.
  fn authors(&self, path: Option<&Path>) -> Result<BTreeSet<String>, VcsError>;

  /// Whether the backend has any history for `path`.
  fn is_versioned(&self, path: &Path) -> bool;
}

/// Path split into its normal components, so `./a/b` and `a/b` match.
pub type PathKey = Vec<String>;

/// Split a path into a [`PathKey`].
pub fn path_key(path: &Path) -> PathKey {
  let mut key = PathKey::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => key.push(part.to_string_lossy().into_owned()),
      Component::ParentDir => {
        key.pop();
      }
      Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
    }
  }
  key
}

/// Manual additions that compensate for incomplete or rewritten history.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Hacks {
  /// Extra authors per file.
  pub authors: BTreeMap<PathKey, Vec<String>>,
  /// Extra years per file.
  pub years: BTreeMap<PathKey, Vec<i32>>,
}

/// A backend combined with the override tables and alias resolution.
pub struct History {
  backend: Box<dyn VcsBackend>,
  hacks: Hacks,
  resolver: AliasResolver,
  with_email: bool,
}

impl History {
  pub fn new(backend: Box<dyn VcsBackend>, hacks: Hacks, resolver: AliasResolver, with_email: bool) -> Self {
    Self {
      backend,
      hacks,
      resolver,
      with_email,
    }
  }

  pub fn name(&self) -> &'static str {
    self.backend.name()
  }

  pub fn is_versioned(&self, path: &Path) -> bool {
    self.backend.is_versioned(path)
  }

  /// Earliest year of activity on `path` (or on the project for `None`).
  ///
  /// Year hacks for the file (or all year hacks, for the whole project) are
  /// folded in first. Without any recorded year the current year is used.
  pub fn original_year(&self, path: Option<&Path>) -> Result<i32, VcsError> {
    let mut years = self.backend.years(path)?;
    match path {
      None => years.extend(self.hacks.years.values().flatten().copied()),
      Some(path) => {
        if let Some(extra) = self.hacks.years.get(&path_key(path)) {
          years.extend(extra.iter().copied());
        }
      }
    }

    let year = years.first().copied().unwrap_or_else(|| {
      debug!("No recorded years for {:?}, using the current year", path);
      current_year()
    });
    Ok(year)
  }

  /// Canonical, sorted authors of `path` (or of the project for `None`).
  pub fn authors(&self, path: Option<&Path>) -> Result<Vec<String>, VcsError> {
    let mut authors = self.backend.authors(path)?;
    match path {
      None => authors.extend(self.hacks.authors.values().flatten().cloned()),
      Some(path) => {
        if let Some(extra) = self.hacks.authors.get(&path_key(path)) {
          authors.extend(extra.iter().cloned());
        }
      }
    }
    Ok(self.resolver.resolve(&authors, self.with_email))
  }
}


/// Convert a project-relative path into the form the backends expect.
pub(crate) fn relative_path(path: &Path) -> PathBuf {
  path_key(path).iter().collect()
}

#[cfg(test)]
mod tests {
  use super::fake::FakeBackend;
  use super::*;
  use crate::authors::{AliasTable, StripOrder};

  fn history(backend: FakeBackend, hacks: Hacks, with_email: bool) -> History {
    let mut aliases = AliasTable::new();
    aliases.insert(Some("Amy <amy@new.org>"), ["Amy <amy@old.org>"]);
    History::new(
      Box::new(backend),
      hacks,
      AliasResolver::new(aliases, StripOrder::ResolveThenStrip),
      with_email,
    )
  }

  fn backend() -> FakeBackend {
    FakeBackend::default()
      .with_file("src/a.py", &[2010, 2012], &["Amy <amy@old.org>", "Bob <bob@b.org>"])
      .with_file("src/b.py", &[2011], &["Amy <amy@new.org>"])
  }

  #[test]
  fn test_vcs_from_str() {
    assert_eq!("Git".parse::<Vcs>().unwrap(), Vcs::Git);
    assert_eq!("mercurial".parse::<Vcs>().unwrap(), Vcs::Mercurial);
    assert_eq!("Bazaar".parse::<Vcs>().unwrap(), Vcs::Bazaar);
    assert!("Subversion".parse::<Vcs>().is_err());
  }

  #[test]
  fn test_path_key() {
    assert_eq!(path_key(Path::new("./a/b/c")), vec!["a", "b", "c"]);
    assert_eq!(path_key(Path::new("a/b/c")), vec!["a", "b", "c"]);
    assert_eq!(path_key(Path::new("a/./x/../c")), vec!["a", "c"]);
  }

  #[test]
  fn test_original_year_for_file() {
    let history = history(backend(), Hacks::default(), true);
    assert_eq!(history.original_year(Some(Path::new("./src/a.py"))).unwrap(), 2010);
    assert_eq!(history.original_year(None).unwrap(), 2010);
  }

  #[test]
  fn test_original_year_with_hacks() {
    let mut hacks = Hacks::default();
    hacks.years.insert(path_key(Path::new("src/b.py")), vec![2008]);
    let history = history(backend(), hacks, true);

    assert_eq!(history.original_year(Some(Path::new("src/b.py"))).unwrap(), 2008);
    assert_eq!(history.original_year(Some(Path::new("src/a.py"))).unwrap(), 2010);
    assert_eq!(history.original_year(None).unwrap(), 2008);
  }

  #[test]
  fn test_original_year_defaults_to_current_year() {
    let history = history(FakeBackend::default(), Hacks::default(), true);
    assert_eq!(history.original_year(Some(Path::new("new.py"))).unwrap(), current_year());
  }

  #[test]
  fn test_authors_resolve_aliases() {
    let history = history(backend(), Hacks::default(), true);
    assert_eq!(
      history.authors(Some(Path::new("src/a.py"))).unwrap(),
      vec!["Amy <amy@new.org>", "Bob <bob@b.org>"]
    );
  }

  #[test]
  fn test_authors_with_hacks_and_without_email() {
    let mut hacks = Hacks::default();
    hacks
      .authors
      .insert(path_key(Path::new("src/b.py")), vec!["Carol".to_string()]);
    let history = history(backend(), hacks, false);

    assert_eq!(history.authors(Some(Path::new("src/b.py"))).unwrap(), vec!["Amy", "Carol"]);
    assert_eq!(history.authors(None).unwrap(), vec!["Amy", "Bob", "Carol"]);
  }

  #[test]
  fn test_relative_path() {
    assert_eq!(relative_path(Path::new("./src/a.py")), PathBuf::from("src/a.py"));
  }
}
