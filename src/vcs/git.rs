//! # Git Backend
//!
//! Reads commit history through `git2`. Author identities go through the
//! repository's `.mailmap`, and per-file queries follow the file across
//! renames.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset};
use git2::{Commit, Delta, DiffFindOptions, ErrorCode, Mailmap, Oid, Repository, Signature, Sort, Tree};
use tracing::debug;

use super::{VcsBackend, VcsError, relative_path};

/// History source backed by a Git repository.
pub struct GitBackend {
  repo: Repository,
  /// Location of the project root inside the work tree.
  prefix: PathBuf,
  mailmap: Option<Mailmap>,
}

/// How a commit relates to the path being followed.
enum Touch {
  No,
  Yes,
  RenamedFrom(PathBuf),
}

impl GitBackend {
  /// Open the repository containing `root`.
  ///
  /// # Errors
  ///
  /// Returns an error if `root` is not inside a Git repository.
  pub fn discover(root: &Path) -> Result<Self, VcsError> {
    let repo = Repository::discover(root)?;
    let prefix = match repo.workdir() {
      Some(workdir) => {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
        pathdiff::diff_paths(&root, &workdir).unwrap_or_default()
      }
      None => PathBuf::new(),
    };
    let mailmap = repo.mailmap().ok();
    debug!("Opened Git repository at {} (prefix {:?})", repo.path().display(), prefix);

    Ok(Self { repo, prefix, mailmap })
  }

  fn repo_path(&self, path: &Path) -> PathBuf {
    self.prefix.join(relative_path(path))
  }

  fn head_tree(&self) -> Option<Tree<'_>> {
    self.repo.head().ok()?.peel_to_tree().ok()
  }

  /// Visit every commit reachable from HEAD that touched `path`, or every
  /// commit for `None`.
  fn walk(&self, path: Option<&Path>, mut visit: impl FnMut(&Commit<'_>)) -> Result<(), VcsError> {
    // An unborn HEAD makes `push_head` fail with a generic error, so it is
    // recognised through `head()` first.
    match self.repo.head() {
      Ok(_) => {}
      Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
        debug!("Repository has no commits yet");
        return Ok(());
      }
      Err(e) => return Err(e.into()),
    }

    let mut revwalk = self.repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    // A project below the work tree root only owns the history of its own
    // directory.
    let mut followed = match path {
      Some(path) => Some(self.repo_path(path)),
      None if !self.prefix.as_os_str().is_empty() => Some(self.prefix.clone()),
      None => None,
    };
    for oid in revwalk {
      let commit = self.repo.find_commit(oid?)?;
      let Some(current) = followed.as_mut() else {
        visit(&commit);
        continue;
      };

      match self.touches(&commit, current)? {
        Touch::No => {}
        Touch::Yes => visit(&commit),
        Touch::RenamedFrom(old) => {
          debug!("Following {} back to {}", current.display(), old.display());
          visit(&commit);
          *current = old;
        }
      }
    }
    Ok(())
  }

  fn touches(&self, commit: &Commit<'_>, path: &Path) -> Result<Touch, VcsError> {
    let tree = commit.tree()?;
    let Some(current) = entry_id(&tree, path) else {
      return Ok(Touch::No);
    };

    let mut first_parent_tree = None;
    for parent in commit.parents() {
      let parent_tree = parent.tree()?;
      if entry_id(&parent_tree, path) == Some(current) {
        return Ok(Touch::No);
      }
      first_parent_tree.get_or_insert(parent_tree);
    }

    let Some(parent_tree) = first_parent_tree else {
      return Ok(Touch::Yes);
    };
    if entry_id(&parent_tree, path).is_some() {
      return Ok(Touch::Yes);
    }

    let mut diff = self.repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?;
    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))?;

    let renamed_from = diff
      .deltas()
      .filter(|delta| delta.status() == Delta::Renamed && delta.new_file().path() == Some(path))
      .find_map(|delta| delta.old_file().path().map(Path::to_path_buf));

    Ok(renamed_from.map_or(Touch::Yes, Touch::RenamedFrom))
  }

  fn author(&self, commit: &Commit<'_>) -> Signature<'static> {
    self
      .mailmap
      .as_ref()
      .and_then(|mailmap| commit.author_with_mailmap(mailmap).ok())
      .unwrap_or_else(|| commit.author().to_owned())
  }
}

fn entry_id(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
  tree.get_path(path).ok().map(|entry| entry.id())
}

/// Year of the signature in the author's own time zone.
fn signature_year(signature: &Signature<'_>) -> Option<i32> {
  let when = signature.when();
  let offset = FixedOffset::east_opt(when.offset_minutes() * 60)?;
  let date = DateTime::from_timestamp(when.seconds(), 0)?.with_timezone(&offset);
  Some(date.year())
}

fn format_identity(signature: &Signature<'_>) -> String {
  format!(
    "{} <{}>",
    String::from_utf8_lossy(signature.name_bytes()),
    String::from_utf8_lossy(signature.email_bytes())
  )
}

impl VcsBackend for GitBackend {
  fn name(&self) -> &'static str {
    "Git"
  }

  fn years(&self, path: Option<&Path>) -> Result<BTreeSet<i32>, VcsError> {
    let mut years = BTreeSet::new();
    self.walk(path, |commit| {
      if let Some(year) = signature_year(&self.author(commit)) {
        years.insert(year);
      }
    })?;
    Ok(years)
  }

  fn authors(&self, path: Option<&Path>) -> Result<BTreeSet<String>, VcsError> {
    let mut authors = BTreeSet::new();
    self.walk(path, |commit| {
      authors.insert(format_identity(&self.author(commit)));
    })?;
    Ok(authors)
  }

  fn is_versioned(&self, path: &Path) -> bool {
    self
      .head_tree()
      .is_some_and(|tree| entry_id(&tree, &self.repo_path(path)).is_some())
  }
}
