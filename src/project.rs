//! # Project Module
//!
//! A [`Project`] ties together the configuration, the version control
//! history and the write-back guard, and drives the three updates a run can
//! perform: the AUTHORS file, the copyright blocks of project files, and the
//! generated license module.
//!
//! Projects are assembled with a [`ProjectBuilder`]; everything is fixed at
//! construction, so no table is patched while files are being processed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};

use crate::authors::AliasResolver;
use crate::config::Config;
use crate::copyright::{
  AuthorFormat, CopyrightError, CopyrightParams, Info, copyright_string, current_year, project_info, tag_copyright,
  update_copyright,
};
use crate::diff::DiffManager;
use crate::processor::{ContentWriter, FileCollector, IgnoreRules, ReadError, dotted_path};
use crate::report::{FileAction, FileReport};
use crate::stub::python_module;
use crate::vcs::{History, VcsBackend, VcsError};

/// Name of the generated authors listing.
pub const AUTHORS_FILE: &str = "AUTHORS";

/// Assembles a [`Project`] from a [`Config`] and run options.
pub struct ProjectBuilder {
  root: PathBuf,
  config: Config,
  backend: Option<Box<dyn VcsBackend>>,
  dry_run: bool,
  diff_manager: Option<DiffManager>,
  final_year: Option<i32>,
}

impl ProjectBuilder {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      config: Config::default(),
      backend: None,
      dry_run: false,
      diff_manager: None,
      final_year: None,
    }
  }

  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Use `backend` instead of opening the configured VCS.
  pub fn backend(mut self, backend: Box<dyn VcsBackend>) -> Self {
    self.backend = Some(backend);
    self
  }

  pub const fn dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  pub fn diff_manager(mut self, diff_manager: Option<DiffManager>) -> Self {
    self.diff_manager = diff_manager;
    self
  }

  /// Override the final year of every range, which defaults to the current
  /// year.
  pub const fn final_year(mut self, year: i32) -> Self {
    self.final_year = Some(year);
    self
  }

  /// Validate the configuration, open the backend and build the project.
  ///
  /// # Errors
  ///
  /// Returns an error for an invalid configuration, an invalid ignore
  /// pattern, or a repository the backend cannot open.
  pub fn build(self) -> Result<Project> {
    let config = self.config;
    config.validate()?;

    let vcs = config.vcs()?;
    let backend = match self.backend {
      Some(backend) => backend,
      None => vcs
        .open(&self.root)
        .with_context(|| format!("Failed to open {} repository at {}", vcs, self.root.display()))?,
    };

    let name = config.project.name.clone().unwrap_or_else(|| {
      self
        .root
        .canonicalize()
        .ok()
        .and_then(|root| root.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string())
    });
    let info = project_info(&name, backend.name());

    let resolver = AliasResolver::new(config.aliases.clone(), config.authors.strip_order);
    let history = History::new(backend, config.hacks(), resolver, config.authors.with_email);

    let rules = IgnoreRules::new(&config.files.ignored, &config.files.ignored_files)?;
    let writer = ContentWriter::new(&self.root, config.encoding()?, self.dry_run, self.diff_manager);

    debug!("Project {} uses {} at {}", name, history.name(), self.root.display());

    Ok(Project {
      root: self.root,
      name,
      info,
      history,
      long: config.copyright.long.to_vec(),
      short: config.copyright.short.to_vec(),
      prefix: config.copyright.prefix.clone(),
      width: config.copyright.width,
      rules,
      pyfile: config.files.pyfile.clone(),
      writer,
      final_year: self.final_year.unwrap_or_else(current_year),
    })
  }
}

/// A configured project ready to be updated.
pub struct Project {
  root: PathBuf,
  name: String,
  info: Info,
  history: History,
  long: Vec<String>,
  short: Vec<String>,
  prefix: String,
  width: usize,
  rules: IgnoreRules,
  pyfile: Option<PathBuf>,
  writer: ContentWriter,
  final_year: i32,
}

impl Project {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub const fn dry_run(&self) -> bool {
    self.writer.dry_run()
  }

  pub const fn has_pyfile(&self) -> bool {
    self.pyfile.is_some()
  }

  fn params<'a>(&'a self, original_year: i32, authors: &'a [String]) -> CopyrightParams<'a> {
    CopyrightParams::new(original_year, self.final_year, authors, &self.long, &self.info)
      .with_prefix(&self.prefix)
      .with_width(self.width)
  }

  /// Render the long and short texts once so a broken template fails the run
  /// before any file is written.
  pub fn validate(&self) -> Result<(), CopyrightError> {
    let authors = vec![self.name.clone()];
    let params = self.params(self.final_year, &authors);
    copyright_string(&params)?;
    copyright_string(
      &CopyrightParams {
        text: &self.short,
        ..params
      }
      .with_author_format(AuthorFormat::Short),
    )?;
    Ok(())
  }

  /// Why `path` is excluded from header updates, if it is.
  pub fn ignored(&self, path: &Path) -> Option<String> {
    if let Some(reason) = self.rules.reason(path) {
      return Some(reason);
    }
    if !self.history.is_versioned(path) {
      return Some(format!("not versioned in {}", self.history.name()));
    }
    None
  }

  /// Regenerate the AUTHORS file from the whole-project history.
  pub fn update_authors(&self) -> Result<FileReport> {
    let authors = self
      .history
      .authors(None)
      .context("Failed to read project authors")?;
    let contents = format!("{} was written by:\n{}\n", self.name, authors.join("\n"));

    let path = Path::new(AUTHORS_FILE);
    let action = self.writer.set_contents(path, &contents, None)?;
    Ok(FileReport::new(path, action))
  }

  /// List the files `update_collected` would consider.
  ///
  /// With no explicit paths the whole project root is walked.
  pub fn collect_files(&self, explicit: &[PathBuf], current_dir: &Path) -> Result<Vec<PathBuf>> {
    FileCollector::new(&self.root, &self.rules).collect(explicit, current_dir)
  }

  /// Update the copyright blocks of `explicit` files, or of every project
  /// file when none are given.
  pub fn update_files(&self, explicit: &[PathBuf], current_dir: &Path) -> Result<Vec<FileReport>> {
    let files = self.collect_files(explicit, current_dir)?;
    self.update_collected(&files)
  }

  /// Update already collected project-relative files, skipping ignored and
  /// unversioned ones.
  pub fn update_collected(&self, files: &[PathBuf]) -> Result<Vec<FileReport>> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
      if let Some(reason) = self.ignored(path) {
        trace!("Skipping {}: {}", dotted_path(path), reason);
        reports.push(FileReport::skipped(path, reason));
        continue;
      }
      reports.push(self.update_file(path)?);
    }
    Ok(reports)
  }

  /// Update the copyright block of a single project-relative file.
  ///
  /// Files without a block are left as they are.
  pub fn update_file(&self, path: &Path) -> Result<FileReport> {
    let contents = match self.writer.get_contents(path) {
      Ok(Some(contents)) => contents,
      Ok(None) => return Ok(FileReport::skipped(path, "file does not exist")),
      Err(ReadError::Decode { encoding, .. }) => {
        warn!("Skipping {}: not valid {} text", dotted_path(path), encoding);
        return Ok(FileReport::skipped(path, format!("not {} text", encoding)));
      }
      Err(e) => return Err(e.into()),
    };

    if tag_copyright(&contents, &self.prefix).is_none() {
      trace!("No copyright block in {}", dotted_path(path));
      return Ok(FileReport::new(path, FileAction::Unchanged));
    }

    let (original_year, authors) = match self.file_history(path) {
      Ok(history) => history,
      Err(e) => {
        debug!("Treating {} as unversioned: {}", dotted_path(path), e);
        return Ok(FileReport::skipped(path, "history unavailable"));
      }
    };

    let updated = update_copyright(&contents, &self.params(original_year, &authors))?;
    let action = self.writer.set_contents(path, &updated, Some(&contents))?;
    Ok(FileReport::new(path, action))
  }

  fn file_history(&self, path: &Path) -> Result<(i32, Vec<String>), VcsError> {
    Ok((self.history.original_year(Some(path))?, self.history.authors(Some(path))?))
  }

  /// Regenerate the Python license module, when one is configured.
  pub fn update_pyfile(&self) -> Result<Option<FileReport>> {
    let Some(pyfile) = self.pyfile.as_deref() else {
      info!("No pyfile location configured, skipping the license module");
      return Ok(None);
    };

    let original_year = self
      .history
      .original_year(None)
      .context("Failed to read project history")?;
    let authors = self
      .history
      .authors(None)
      .context("Failed to read project authors")?;
    let contents = python_module(&self.params(original_year, &authors), &self.short)?;

    let action = self.writer.set_contents(pyfile, &contents, None)?;
    Ok(Some(FileReport::new(pyfile, action)))
  }
}
