//! # Processor Module
//!
//! This module contains the file-level plumbing shared by every update:
//! listing candidate files, reading them in the project's encoding, and
//! writing regenerated contents back only when they differ.
//!
//! The module is organized into several submodules:
//! - [`file_io`] - Encoded file reading and writing
//! - [`file_collector`] - Directory traversal and ignore rules
//!
//! The [`ContentWriter`] struct is the write-back guard: it compares,
//! reports, logs the diff and honours dry runs.

mod file_collector;
mod file_io;

use std::path::{Path, PathBuf};

use anyhow::Result;
pub use file_collector::{FileCollector, IgnoreRules, dotted_path, normalize_relative_path};
pub use file_io::{Encoding, FileIO, ParseEncodingError, ReadError};
use tracing::{debug, info};

use crate::diff::{DiffManager, unified_diff};
use crate::report::FileAction;

/// Writes regenerated file contents back to the project.
pub struct ContentWriter {
  /// Root that relative paths are resolved against.
  project_root: PathBuf,

  /// Encoding used for every read and write.
  encoding: Encoding,

  /// Whether to only report what would change
  dry_run: bool,

  /// Optional display/persistence of diffs
  diff_manager: Option<DiffManager>,
}

impl ContentWriter {
  pub fn new(project_root: &Path, encoding: Encoding, dry_run: bool, diff_manager: Option<DiffManager>) -> Self {
    Self {
      project_root: project_root.to_path_buf(),
      encoding,
      dry_run,
      diff_manager,
    }
  }

  pub const fn dry_run(&self) -> bool {
    self.dry_run
  }

  /// Absolute location of a project-relative path.
  pub fn resolve(&self, path: &Path) -> PathBuf {
    self.project_root.join(path)
  }

  /// Read a project-relative file, `None` if it does not exist.
  pub fn get_contents(&self, path: &Path) -> Result<Option<String>, ReadError> {
    FileIO::read_text(&self.resolve(path), self.encoding)
  }

  /// Write `contents` to `path` unless they equal the current contents.
  ///
  /// `original` is the already-read current contents; when `None` the file is
  /// read here. Returns [`FileAction::Created`] for a file that did not
  /// exist, [`FileAction::Updated`] for a changed file and
  /// [`FileAction::Unchanged`] when nothing differs. In a dry run the action
  /// is reported but nothing is written.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or written, or if the diff
  /// cannot be saved.
  pub fn set_contents(&self, path: &Path, contents: &str, original: Option<&str>) -> Result<FileAction> {
    let existing = match original {
      Some(original) => Some(original.to_string()),
      None => self.get_contents(path)?,
    };

    if existing.as_deref() == Some(contents) {
      debug!("{} is up to date", dotted_path(path));
      return Ok(FileAction::Unchanged);
    }

    let action = if existing.is_some() {
      info!("Updating {}", dotted_path(path));
      FileAction::Updated
    } else {
      info!("Creating {}", dotted_path(path));
      FileAction::Created
    };

    let diff = unified_diff(path, existing.as_deref(), contents);
    debug!("\n{}", diff);
    if let Some(ref manager) = self.diff_manager {
      manager.record(&diff)?;
    }

    if !self.dry_run {
      FileIO::write_text(&self.resolve(path), contents, self.encoding)?;
    }
    Ok(action)
  }
}
