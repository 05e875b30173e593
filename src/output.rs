//! # Output Module
//!
//! This module centralizes all user-facing output for update-copyright.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show what changed without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::processor::dotted_path;
use crate::report::{FileAction, FileReport, ProcessingSummary};

/// Symbols used in output
pub mod symbols {
  /// File created
  pub const CREATED: &str = "+";
  /// File rewritten
  pub const UPDATED: &str = "\u{21bb}"; // ↻
  /// Nothing left to do
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Skipped
  pub const SKIPPED: &str = "-";
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Updating N files..." or "Checking N files..." message.
pub fn print_start_message(file_count: usize, dry_run: bool) {
  if is_quiet() {
    return;
  }

  let verb = if dry_run { "Checking" } else { "Updating" };
  println!("{} {} {}...", verb, file_count, plural(file_count));
}

const fn plural(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Print one group of files under a header, truncated unless verbose.
fn print_file_list(header: String, files: &[&FileReport]) {
  println!("{}", header);

  let show_all = is_verbose();
  let limit = if show_all { files.len() } else { DEFAULT_FILE_LIST_LIMIT };

  for file in files.iter().take(limit) {
    match (&file.reason, show_all) {
      (Some(reason), true) => println!("  {} ({})", dotted_path(&file.path), reason),
      _ => println!("  {}", dotted_path(&file.path)),
    }
  }

  if !show_all && files.len() > limit {
    println!(
      "  {} ... and {} more (use -v to see all)",
      "".if_supports_color(Stream::Stdout, |s| s.dimmed()),
      files.len() - limit
    );
  }
}

/// Print a blank line unless quiet.
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print the lists of created and updated files (and, when verbose, the
/// skipped ones).
pub fn print_changed_files(categorized: &CategorizedReports<'_>, dry_run: bool) {
  if is_quiet() {
    return;
  }

  if !categorized.created.is_empty() {
    let count = categorized.created.len();
    print_file_list(
      format!(
        "{} {} {} {}:",
        symbols::CREATED.if_supports_color(Stream::Stdout, |s| s.green()),
        if dry_run { "Would create" } else { "Created" },
        count,
        plural(count)
      ),
      &categorized.created,
    );
  }

  if !categorized.updated.is_empty() {
    let count = categorized.updated.len();
    print_file_list(
      format!(
        "{} {} {} {}:",
        symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.yellow()),
        if dry_run { "Would update" } else { "Updated" },
        count,
        plural(count)
      ),
      &categorized.updated,
    );
  }

  if is_verbose() && !categorized.skipped.is_empty() {
    let count = categorized.skipped.len();
    print_file_list(
      format!(
        "{} Skipped {} {}:",
        symbols::SKIPPED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        count,
        plural(count)
      ),
      &categorized.skipped,
    );
  }
}

/// Print the success message when nothing needed changing.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All copyright notices are up to date.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Format the summary line.
///
/// Format: "Summary: X created, Y updated, Z unchanged, W skipped (T.TTs)"
pub fn summary_line(summary: &ProcessingSummary) -> String {
  let created = summary.created.if_supports_color(Stream::Stdout, |s| s.green());
  let updated = summary.updated.if_supports_color(Stream::Stdout, |s| s.yellow());
  let unchanged = summary.unchanged.if_supports_color(Stream::Stdout, |s| s.cyan());
  let skipped = summary.skipped.if_supports_color(Stream::Stdout, |s| s.dimmed());

  format!(
    "Summary: {} created, {} updated, {} unchanged, {} skipped ({:.2}s)",
    created,
    updated,
    unchanged,
    skipped,
    summary.processing_time.as_secs_f64()
  )
}

/// Print the processing summary.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }
  println!("{}", summary_line(summary));
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

/// File reports grouped by action.
pub struct CategorizedReports<'a> {
  pub created: Vec<&'a FileReport>,
  pub updated: Vec<&'a FileReport>,
  pub unchanged: Vec<&'a FileReport>,
  pub skipped: Vec<&'a FileReport>,
}

impl<'a> CategorizedReports<'a> {
  /// Categorize a slice of file reports, keeping their order.
  pub fn from_reports(reports: &'a [FileReport]) -> Self {
    let mut categorized = Self {
      created: Vec::new(),
      updated: Vec::new(),
      unchanged: Vec::new(),
      skipped: Vec::new(),
    };

    for report in reports {
      match report.action {
        FileAction::Created => categorized.created.push(report),
        FileAction::Updated => categorized.updated.push(report),
        FileAction::Unchanged => categorized.unchanged.push(report),
        FileAction::Skipped => categorized.skipped.push(report),
      }
    }
    categorized
  }

  pub fn has_changes(&self) -> bool {
    !self.created.is_empty() || !self.updated.is_empty()
  }
}
