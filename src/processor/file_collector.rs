//! # File Collector Module
//!
//! This module lists the files a run should consider and decides which of
//! them are excluded by the configured ignore rules.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Ignore rules from the `[files]` configuration section.
///
/// Path patterns are `glob` patterns with fnmatch semantics (`*` also matches
/// `/`) tested against the `./`-relative form of a path and of each of its
/// parent directories, so `./.git` covers everything below `.git`.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
  paths: Vec<glob::Pattern>,
  filenames: Vec<String>,
}

impl IgnoreRules {
  /// Compile the ignore patterns.
  ///
  /// # Errors
  ///
  /// Returns an error if a pattern is not a valid glob.
  pub fn new(paths: &[String], filenames: &[String]) -> Result<Self> {
    let paths = paths
      .iter()
      .map(|pattern| {
        let trimmed = pattern.trim_end_matches('/');
        glob::Pattern::new(trimmed).with_context(|| format!("Invalid ignore pattern: {}", pattern))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      paths,
      filenames: filenames.to_vec(),
    })
  }

  /// Why `path` (relative to the project root) is ignored, if it is.
  pub fn reason(&self, path: &Path) -> Option<String> {
    if let Some(name) = path.file_name().map(|name| name.to_string_lossy())
      && self.filenames.iter().any(|ignored| *ignored == name)
    {
      return Some(format!("ignored file name {}", name));
    }

    let dotted = dotted_path(path);
    let mut candidate = dotted.as_str();
    loop {
      if let Some(pattern) = self.paths.iter().find(|pattern| pattern.matches(candidate)) {
        return Some(format!("matches ignore pattern {}", pattern.as_str()));
      }
      match candidate.rfind('/') {
        Some(index) if index > 1 => candidate = &candidate[..index],
        _ => return None,
      }
    }
  }

  /// Whether a directory and everything below it is ignored by a path
  /// pattern.
  fn prunes(&self, dir: &Path) -> bool {
    let dotted = dotted_path(dir);
    self.paths.iter().any(|pattern| pattern.matches(&dotted))
  }
}

/// Render a project-relative path as `./a/b` with forward slashes.
pub fn dotted_path(path: &Path) -> String {
  let parts: Vec<String> = path
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect();

  if parts.is_empty() {
    ".".to_string()
  } else {
    format!("./{}", parts.join("/"))
  }
}

/// File collector for directory traversal.
///
/// The `FileCollector` handles:
/// - Resolving user-provided paths against the project root
/// - Traversing directories to collect files in sorted order
/// - Pruning directories excluded by the ignore rules
pub struct FileCollector<'a> {
  project_root: PathBuf,
  rules: &'a IgnoreRules,
}

impl<'a> FileCollector<'a> {
  pub fn new(project_root: &Path, rules: &'a IgnoreRules) -> Self {
    Self {
      project_root: project_root.to_path_buf(),
      rules,
    }
  }

  /// Collect project-relative file paths.
  ///
  /// With no explicit paths the whole project is walked. Explicit
  /// directories are walked as well; explicit files are returned as given.
  ///
  /// # Errors
  ///
  /// Returns an error if an explicit path lies outside the project root.
  pub fn collect(&self, explicit: &[PathBuf], current_dir: &Path) -> Result<Vec<PathBuf>> {
    if explicit.is_empty() {
      return Ok(self.traverse_directory(Path::new("")));
    }

    let mut files = Vec::new();
    for path in explicit {
      let absolute = if path.is_absolute() {
        path.clone()
      } else {
        current_dir.join(path)
      };
      let relative = normalize_relative_path(&absolute, &self.project_root);
      if relative.components().next() == Some(Component::ParentDir) {
        anyhow::bail!("{} is outside the project root {}", path.display(), self.project_root.display());
      }

      if absolute.is_dir() {
        files.extend(self.traverse_directory(&relative));
      } else {
        files.push(relative);
      }
    }
    Ok(files)
  }

  /// Walk `dir` (relative to the project root) without following symlinks.
  pub fn traverse_directory(&self, dir: &Path) -> Vec<PathBuf> {
    let start = if dir.as_os_str().is_empty() {
      self.project_root.clone()
    } else {
      self.project_root.join(dir)
    };
    debug!("Scanning directory: {}", start.display());
    let start_time = std::time::Instant::now();

    let walker = WalkDir::new(&start)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
          return true;
        }
        let relative = entry.path().strip_prefix(&self.project_root).unwrap_or(entry.path());
        if self.rules.prunes(relative) {
          trace!("Pruning ignored directory {}", dotted_path(relative));
          return false;
        }
        true
      });

    let mut files = Vec::new();
    for entry in walker {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          tracing::warn!("Error while scanning {}: {}", start.display(), e);
          continue;
        }
      };
      if entry.file_type().is_file()
        && let Ok(relative) = entry.path().strip_prefix(&self.project_root)
      {
        files.push(relative.to_path_buf());
      }
    }

    debug!(
      "Found {} files in {}ms",
      files.len(),
      start_time.elapsed().as_millis()
    );
    files
  }
}

/// Normalizes a path to be relative to a given directory.
///
/// # Parameters
///
/// * `path` - The path to normalize
/// * `base` - The directory to make the path relative to
///
/// # Returns
///
/// The normalized relative path.
pub fn normalize_relative_path(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    if let Ok(stripped) = path.strip_prefix(base) {
      return clean(stripped);
    }

    let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    if let Some(rel_path) = pathdiff::diff_paths(&canonical_path, &canonical_base) {
      return clean(&rel_path);
    }
  }

  clean(path)
}

/// Drop `.` segments and fold `..` into the preceding segment when possible.
fn clean(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
          normalized.pop();
        } else {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn rules() -> IgnoreRules {
    IgnoreRules::new(
      &["./a/".to_string(), "./.git".to_string(), "*.min.js".to_string()],
      &["x".to_string(), "COPYING".to_string()],
    )
    .unwrap()
  }

  #[test]
  fn test_dotted_path() {
    assert_eq!(dotted_path(Path::new("a/b")), "./a/b");
    assert_eq!(dotted_path(Path::new("./a/b")), "./a/b");
    assert_eq!(dotted_path(Path::new("")), ".");
  }

  #[test]
  fn test_ignore_rules() {
    let rules = rules();
    assert!(rules.reason(Path::new("a/z")).is_some());
    assert!(rules.reason(Path::new("ab/z")).is_none());
    assert!(rules.reason(Path::new("ab/x")).is_some());
    assert!(rules.reason(Path::new("ab/xy")).is_none());
    assert!(rules.reason(Path::new("z")).is_none());
    assert!(rules.reason(Path::new(".git/objects/ab/cdef")).is_some());
    assert!(rules.reason(Path::new("web/js/app.min.js")).is_some());
    assert!(rules.reason(Path::new("COPYING")).is_some());
  }

  #[test]
  fn test_invalid_pattern() {
    assert!(IgnoreRules::new(&["[".to_string()], &[]).is_err());
  }

  #[test]
  fn test_normalize_relative_path() {
    assert_eq!(
      normalize_relative_path(Path::new("/root/project/src/./a.py"), Path::new("/root/project")),
      PathBuf::from("src/a.py")
    );
    assert_eq!(normalize_relative_path(Path::new("./src/../b.py"), Path::new("/x")), PathBuf::from("b.py"));
  }

  #[test]
  fn test_traverse_sorted_and_pruned() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    for path in ["b.py", "a.py", "src/c.py", ".git/HEAD", "a/skipped.py"] {
      let full = root.join(path);
      fs::create_dir_all(full.parent().unwrap()).unwrap();
      fs::write(full, "").unwrap();
    }

    let rules = rules();
    let collector = FileCollector::new(root, &rules);
    let files = collector.collect(&[], root).unwrap();

    assert_eq!(
      files,
      vec![PathBuf::from("a.py"), PathBuf::from("b.py"), PathBuf::from("src/c.py")]
    );
  }

  #[test]
  fn test_collect_explicit_paths() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/c.py"), "").unwrap();
    fs::write(root.join("top.py"), "").unwrap();

    let rules = IgnoreRules::default();
    let collector = FileCollector::new(root, &rules);
    let files = collector
      .collect(&[PathBuf::from("top.py"), PathBuf::from("src")], root)
      .unwrap();

    assert_eq!(files, vec![PathBuf::from("top.py"), PathBuf::from("src/c.py")]);
  }

  #[test]
  fn test_collect_rejects_paths_outside_root() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("project");
    fs::create_dir_all(&root).unwrap();

    let rules = IgnoreRules::default();
    let collector = FileCollector::new(&root, &rules);
    assert!(collector.collect(&[PathBuf::from("../elsewhere.py")], &root).is_err());
  }
}
