//! # Update Command
//!
//! This module implements the update command: regenerate AUTHORS, the
//! copyright blocks of project files and the license module.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::config::load_config;
use crate::diff::DiffManager;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{
  CategorizedReports, print_all_files_ok, print_blank_line, print_changed_files, print_hint, print_start_message,
  print_summary,
};
use crate::project::ProjectBuilder;
use crate::report::{ProcessingSummary, write_json_report};
use crate::workspace::resolve_workspace;

/// Arguments for the update command
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
  /// Files or directories to update. Directories are processed recursively.
  /// Defaults to the whole project.
  #[arg(required = false)]
  pub files: Vec<PathBuf>,

  /// Project root (default: nearest directory holding a repository or a
  /// .update-copyright.toml)
  #[arg(long, value_name = "DIR")]
  pub root: Option<PathBuf>,

  /// Path to config file (default: .update-copyright.toml in the project
  /// root)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Dry run mode: report what would change without writing anything
  #[arg(long, short = 'n')]
  pub dry_run: bool,

  /// Show the diff of every change
  #[arg(long)]
  pub show_diff: bool,

  /// Save the diff of every change to a file
  #[arg(long, short = 'o', value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Do not regenerate the AUTHORS file
  #[arg(long)]
  pub no_authors: bool,

  /// Do not update copyright blocks in project files
  #[arg(long)]
  pub no_files: bool,

  /// Do not regenerate the license module
  #[arg(long)]
  pub no_pyfile: bool,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,

  /// Write a JSON report of every file and the summary to the given path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,
}

/// Run the update command with the given arguments
pub fn run_update(args: UpdateArgs) -> Result<()> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
  let workspace = resolve_workspace(args.root.as_deref(), &current_dir)?;
  let root = workspace.root().to_path_buf();
  debug!("Using project root: {}", root.display());

  let mut config = load_config(args.config.as_deref(), &root, args.no_config)?;
  if config.project.vcs.is_none()
    && let Some(vcs) = workspace.detected_vcs()
  {
    debug!("Detected {} repository", vcs);
    config.project.vcs = Some(vcs.name().to_string());
  }

  let update_authors = config.files.authors && !args.no_authors;
  let update_files = config.files.files && !args.no_files;
  let update_pyfile = !args.no_pyfile;

  let diff_manager = if args.show_diff || args.save_diff.is_some() {
    Some(DiffManager::new(args.show_diff, args.save_diff.clone())?)
  } else {
    None
  };

  let project = ProjectBuilder::new(&root)
    .config(config)
    .dry_run(args.dry_run)
    .diff_manager(diff_manager)
    .build()?;
  project
    .validate()
    .with_context(|| "Invalid copyright text in configuration")?;

  let files = if update_files {
    project.collect_files(&args.files, &current_dir)?
  } else {
    Vec::new()
  };

  let planned = files.len() + usize::from(update_authors) + usize::from(update_pyfile && project.has_pyfile());
  print_start_message(planned, args.dry_run);

  let start_time = Instant::now();
  let mut reports = Vec::with_capacity(planned);

  if update_authors {
    reports.push(project.update_authors()?);
  }
  if update_files {
    reports.extend(project.update_collected(&files)?);
  }
  if update_pyfile && let Some(report) = project.update_pyfile()? {
    reports.push(report);
  }

  let summary = ProcessingSummary::from_reports(&reports, args.dry_run, start_time.elapsed());
  let categorized = CategorizedReports::from_reports(&reports);

  print_blank_line();
  if categorized.has_changes() {
    print_changed_files(&categorized, args.dry_run);
  } else {
    print_all_files_ok();
  }
  print_blank_line();
  print_summary(&summary);

  if args.dry_run && categorized.has_changes() {
    print_blank_line();
    print_hint("Run without --dry-run to apply these changes.");
  }

  if let Some(ref output_path) = args.report_json {
    write_json_report(output_path, &reports, &summary)
      .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;
    info_log!("Generated JSON report at {}", output_path.display());
  }

  Ok(())
}
