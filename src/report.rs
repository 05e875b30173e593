//! # Report Module
//!
//! This module records what happened to every file a run looked at and can
//! write that record as a JSON report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Information about a processed file for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
  /// Path to the file, relative to the project root
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  /// Action taken on the file
  pub action: FileAction,
  /// Why the file was skipped, if it was
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub reason: Option<String>,
}

impl FileReport {
  pub fn new(path: impl Into<PathBuf>, action: FileAction) -> Self {
    Self {
      path: path.into(),
      action,
      reason: None,
    }
  }

  pub fn skipped(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      action: FileAction::Skipped,
      reason: Some(reason.into()),
    }
  }
}

/// Possible actions taken on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  /// The file did not exist and was written (or would be, in a dry run)
  Created,
  /// The file's contents changed
  Updated,
  /// The regenerated contents equal the existing contents
  Unchanged,
  /// The file was not processed
  Skipped,
}

/// Helper module for serializing/deserializing PathBuf
mod path_serialization {
  use std::path::PathBuf;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy().replace('\\', "/"))
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
  }
}

/// Summary of the processing results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
  /// Total number of files looked at
  pub total_files: usize,
  pub created: usize,
  pub updated: usize,
  pub unchanged: usize,
  pub skipped: usize,
  /// Whether the run only checked, without writing
  pub dry_run: bool,
  /// Total processing time
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  /// Processing time in seconds for serialization
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Timestamp when the report was generated
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<i64>,
}

impl ProcessingSummary {
  /// Create a ProcessingSummary from a collection of FileReports
  pub fn from_reports(files: &[FileReport], dry_run: bool, processing_time: Duration) -> Self {
    let count = |action: FileAction| files.iter().filter(|file| file.action == action).count();

    Self {
      total_files: files.len(),
      created: count(FileAction::Created),
      updated: count(FileAction::Updated),
      unchanged: count(FileAction::Unchanged),
      skipped: count(FileAction::Skipped),
      dry_run,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Some(Local::now().timestamp()),
    }
  }

  /// Number of files whose contents differ (or would differ) after the run.
  pub const fn changed(&self) -> usize {
    self.created + self.updated
  }
}

#[derive(Serialize)]
struct Report<'a> {
  summary: &'a ProcessingSummary,
  files: &'a [FileReport],
}

/// Render the report as pretty-printed JSON.
pub fn render_json(files: &[FileReport], summary: &ProcessingSummary) -> Result<String> {
  serde_json::to_string_pretty(&Report { summary, files }).context("Failed to serialize report")
}

/// Write the JSON report to `output_path`.
pub fn write_json_report(output_path: &Path, files: &[FileReport], summary: &ProcessingSummary) -> Result<()> {
  let content = render_json(files, summary)?;
  fs::write(output_path, content).with_context(|| format!("Failed to write report to {}", output_path.display()))
}
