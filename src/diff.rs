//! # Diff Module
//!
//! This module contains functionality for creating and rendering diffs between
//! original and updated file contents. Every change is logged as a unified
//! diff at debug level; `--show-diff` and `--save-diff` expose them directly.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use similar::TextDiff;

/// Render a unified diff with `a/` and `b/` headers.
///
/// A file that did not exist before is diffed against `/dev/null`.
pub fn unified_diff(path: &Path, original: Option<&str>, new: &str) -> String {
  let display = path.to_string_lossy().replace('\\', "/");
  let display = display.trim_start_matches("./");
  let old_header = match original {
    Some(_) => format!("a/{display}"),
    None => "/dev/null".to_string(),
  };
  let new_header = format!("b/{display}");

  TextDiff::from_lines(original.unwrap_or(""), new)
    .unified_diff()
    .context_radius(3)
    .header(&old_header, &new_header)
    .to_string()
}

/// Manages diff display and persistence for file changes.
///
/// This struct handles:
/// - Displaying diffs to stderr with colorization
/// - Appending diffs to a file
pub struct DiffManager {
  /// Whether to print diffs to stderr
  pub show_diff: bool,

  /// Path to append diffs to
  pub save_diff_path: Option<PathBuf>,
}

impl DiffManager {
  /// Creates a new DiffManager.
  ///
  /// An existing diff file is truncated so that a run's diff file only
  /// describes that run.
  pub fn new(show_diff: bool, save_diff_path: Option<PathBuf>) -> Result<Self> {
    if let Some(ref path) = save_diff_path {
      std::fs::write(path, "").with_context(|| format!("Failed to create diff file: {}", path.display()))?;
    }
    Ok(Self {
      show_diff,
      save_diff_path,
    })
  }

  /// Displays and/or saves a rendered unified diff.
  ///
  /// Multiple diffs from different files are appended to the same file,
  /// creating a single consolidated patch.
  pub fn record(&self, diff: &str) -> Result<()> {
    if self.show_diff {
      for line in diff.lines() {
        let colored = if line.starts_with("+++") || line.starts_with("---") {
          format!("{}", line.if_supports_color(Stream::Stderr, |l| l.bold()))
        } else if line.starts_with('+') {
          format!("{}", line.if_supports_color(Stream::Stderr, |l| l.green()))
        } else if line.starts_with('-') {
          format!("{}", line.if_supports_color(Stream::Stderr, |l| l.red()))
        } else if line.starts_with("@@") {
          format!("{}", line.if_supports_color(Stream::Stderr, |l| l.cyan()))
        } else {
          line.to_string()
        };
        eprintln!("{}", colored);
      }
    }

    if let Some(ref diff_path) = self.save_diff_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(diff_path)
        .with_context(|| format!("Failed to open diff file: {}", diff_path.display()))?;
      file
        .write_all(diff.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", diff_path.display()))?;
    }

    Ok(())
  }
}
