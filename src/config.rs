//! # Configuration Module
//!
//! This module provides configuration support for update-copyright: the
//! project name and VCS, the copyright text, which files to touch, and the
//! alias and override tables used to correct the recorded history.
//!
//! Configuration can be specified in a `.update-copyright.toml` file or via
//! the `UPDATE_COPYRIGHT_CONFIG` environment variable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::authors::{AliasTable, StripOrder};
use crate::copyright::{DEFAULT_PREFIX, DEFAULT_WIDTH};
use crate::processor::Encoding;
use crate::vcs::{Hacks, Vcs, path_key};
use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".update-copyright.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "UPDATE_COPYRIGHT_CONFIG";

/// A list of paragraphs, written either as a TOML array or as one multi-line
/// string with a paragraph per line.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Paragraphs {
  Text(String),
  List(Vec<String>),
}

impl Default for Paragraphs {
  fn default() -> Self {
    Self::List(Vec::new())
  }
}

impl Paragraphs {
  pub fn to_vec(&self) -> Vec<String> {
    match self {
      Paragraphs::Text(text) => text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
      Paragraphs::List(list) => list.clone(),
    }
  }
}

/// A single value or a list of values.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
  pub fn to_vec(&self) -> Vec<T> {
    match self {
      OneOrMany::One(value) => vec![value.clone()],
      OneOrMany::Many(values) => values.clone(),
    }
  }
}

/// `[project]` section.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectSection {
  /// Project name; defaults to the name of the project root directory.
  pub name: Option<String>,
  /// `Git`, `Bazaar` or `Mercurial`; defaults to Git.
  pub vcs: Option<String>,
}

/// `[copyright]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CopyrightSection {
  /// Paragraphs following the header in file blocks and the license module.
  pub long: Paragraphs,
  /// Paragraphs for the short license blurb.
  pub short: Paragraphs,
  pub prefix: String,
  pub width: usize,
  pub encoding: String,
}

impl Default for CopyrightSection {
  fn default() -> Self {
    Self {
      long: Paragraphs::default(),
      short: Paragraphs::default(),
      prefix: DEFAULT_PREFIX.to_string(),
      width: DEFAULT_WIDTH,
      encoding: "utf-8".to_string(),
    }
  }
}

/// `[files]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilesSection {
  /// Regenerate the AUTHORS file.
  pub authors: bool,
  /// Update copyright blocks in project files.
  pub files: bool,
  /// Glob patterns matched against `./`-relative paths.
  pub ignored: Vec<String>,
  /// File names skipped wherever they appear.
  pub ignored_files: Vec<String>,
  /// Location of the generated Python license module.
  pub pyfile: Option<PathBuf>,
}

impl Default for FilesSection {
  fn default() -> Self {
    Self {
      authors: true,
      files: true,
      ignored: vec!["./.git".to_string(), "./.hg".to_string(), "./.bzr".to_string()],
      ignored_files: vec!["COPYING".to_string()],
      pyfile: None,
    }
  }
}

/// `[authors]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct AuthorsSection {
  pub with_email: bool,
  pub strip_order: StripOrder,
}

impl Default for AuthorsSection {
  fn default() -> Self {
    Self {
      with_email: true,
      strip_order: StripOrder::default(),
    }
  }
}

/// Main configuration struct for update-copyright.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub project: ProjectSection,

  #[serde(default)]
  pub copyright: CopyrightSection,

  #[serde(default)]
  pub files: FilesSection,

  #[serde(default)]
  pub authors: AuthorsSection,

  /// Canonical identity to the identities folded into it. The empty key
  /// discards its aliases.
  #[serde(default)]
  pub aliases: AliasTable,

  /// Extra authors per path.
  #[serde(default, rename = "author-hacks")]
  pub author_hacks: BTreeMap<String, Vec<String>>,

  /// Extra years per path.
  #[serde(default, rename = "year-hacks")]
  pub year_hacks: BTreeMap<String, OneOrMany<i32>>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// The VCS name is not supported.
  #[error("Unknown VCS '{0}' (expected Git, Bazaar or Mercurial)")]
  UnknownVcs(String),

  /// The prefix has no visible leader to recognise a block by.
  #[error("Invalid prefix {0:?}: the prefix must contain a non-whitespace leader")]
  InvalidPrefix(String),

  /// Wrapping to zero columns is meaningless.
  #[error("Invalid width {0}: the width must be at least 1")]
  InvalidWidth(usize),

  /// The encoding is not supported.
  #[error("Unsupported encoding '{0}' (expected utf-8 or latin-1)")]
  InvalidEncoding(String),
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Returns
  ///
  /// The loaded configuration, or an error if the file cannot be read,
  /// parsed or validated.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    config.validate()?;

    verbose_log!(
      "Loaded {} alias groups, {} author hacks, {} year hacks",
      config.aliases.len(),
      config.author_hacks.len(),
      config.year_hacks.len()
    );

    Ok(config)
  }

  /// Validate the configuration.
  ///
  /// Checks that:
  /// - The VCS name is known
  /// - The prefix has a non-whitespace leader
  /// - The width is positive
  /// - The encoding is supported
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.vcs()?;
    self.encoding()?;

    if self.copyright.prefix.trim_end().is_empty() {
      return Err(ConfigError::InvalidPrefix(self.copyright.prefix.clone()));
    }
    if self.copyright.width == 0 {
      return Err(ConfigError::InvalidWidth(self.copyright.width));
    }
    Ok(())
  }

  /// The configured VCS, Git when unset.
  pub fn vcs(&self) -> Result<Vcs, ConfigError> {
    match &self.project.vcs {
      None => Ok(Vcs::Git),
      Some(name) => name.parse().map_err(|_| ConfigError::UnknownVcs(name.clone())),
    }
  }

  pub fn encoding(&self) -> Result<Encoding, ConfigError> {
    self
      .copyright
      .encoding
      .parse()
      .map_err(|_| ConfigError::InvalidEncoding(self.copyright.encoding.clone()))
  }

  /// The author and year override tables keyed by normalised path.
  pub fn hacks(&self) -> Hacks {
    Hacks {
      authors: self
        .author_hacks
        .iter()
        .map(|(path, authors)| (path_key(Path::new(path)), authors.clone()))
        .collect(),
      years: self
        .year_hacks
        .iter()
        .map(|(path, years)| (path_key(Path::new(path)), years.to_vec()))
        .collect(),
    }
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `UPDATE_COPYRIGHT_CONFIG` environment variable
/// 3. `.update-copyright.toml` in the project root
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
pub fn discover_config_path(explicit_path: Option<&Path>, project_root: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    if path.exists() {
      verbose_log!("Using explicit config path: {}", path.display());
      return Some(path.to_path_buf());
    }
    verbose_log!("Explicit config path does not exist: {}", path.display());
    return None;
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let project_config = project_root.join(DEFAULT_CONFIG_FILENAME);
  if project_config.exists() {
    verbose_log!("Using project config: {}", project_config.display());
    return Some(project_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, or return the defaults.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback to the defaults.
pub fn load_config(explicit_path: Option<&Path>, project_root: &Path, no_config: bool) -> Result<Config> {
  if no_config {
    verbose_log!("Config file discovery disabled (--no-config)");
    return Ok(Config::default());
  }

  if let Some(path) = explicit_path
    && !path.exists()
  {
    anyhow::bail!("Config file not found: {}", path.display());
  }

  match discover_config_path(explicit_path, project_root) {
    Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display())),
    None => Ok(Config::default()),
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  const FULL_CONFIG: &str = r#"
[project]
name = "demo"
vcs = "Mercurial"

[copyright]
long = ["This file is part of %(project)s.", "Second paragraph."]
short = """
%(project)s comes with ABSOLUTELY NO WARRANTY.
Short second paragraph.
"""
prefix = "// "
width = 72
encoding = "latin-1"

[files]
authors = false
ignored = ["./vendor", "*.min.js"]
ignored-files = ["LICENSE"]
pyfile = "demo/_license.py"

[authors]
with-email = false
strip-order = "strip-then-resolve"

[aliases]
"J Doe <jdoe@a.com>" = ["Johnny <jdoe@b.edu>", "J"]
"" = ["Anonymous <a@a.com>"]

[author-hacks]
"./src/module.py" = ["John Doe"]

[year-hacks]
"src/module.py" = 2008
"src/other.py" = [2001, 2003]
"#;

  #[test]
  fn test_parse_full_config() {
    let config: Config = toml::from_str(FULL_CONFIG).expect("valid config should parse");
    config.validate().expect("valid config should validate");

    assert_eq!(config.project.name.as_deref(), Some("demo"));
    assert_eq!(config.vcs().expect("known vcs"), Vcs::Mercurial);
    assert_eq!(config.encoding().expect("known encoding"), Encoding::Latin1);
    assert_eq!(config.copyright.long.to_vec().len(), 2);
    assert_eq!(
      config.copyright.short.to_vec(),
      vec!["%(project)s comes with ABSOLUTELY NO WARRANTY.", "Short second paragraph."]
    );
    assert_eq!(config.copyright.prefix, "// ");
    assert_eq!(config.copyright.width, 72);

    assert!(!config.files.authors);
    assert!(config.files.files);
    assert_eq!(config.files.ignored, vec!["./vendor", "*.min.js"]);
    assert_eq!(config.files.ignored_files, vec!["LICENSE"]);
    assert_eq!(config.files.pyfile, Some(PathBuf::from("demo/_license.py")));

    assert!(!config.authors.with_email);
    assert_eq!(config.authors.strip_order, StripOrder::StripThenResolve);

    let reversed = config.aliases.reverse();
    assert_eq!(reversed["J"].as_deref(), Some("J Doe <jdoe@a.com>"));
    assert_eq!(reversed["Anonymous <a@a.com>"], None);
  }

  #[test]
  fn test_hacks_use_normalised_paths() {
    let config: Config = toml::from_str(FULL_CONFIG).expect("valid config should parse");
    let hacks = config.hacks();

    let key = path_key(Path::new("src/module.py"));
    assert_eq!(hacks.authors[&key], vec!["John Doe"]);
    assert_eq!(hacks.years[&key], vec![2008]);
    assert_eq!(hacks.years[&path_key(Path::new("src/other.py"))], vec![2001, 2003]);
  }

  #[test]
  fn test_parse_empty_config() {
    let config: Config = toml::from_str("").expect("empty config should parse");
    config.validate().expect("defaults should validate");

    assert_eq!(config.vcs().expect("default vcs"), Vcs::Git);
    assert_eq!(config.encoding().expect("default encoding"), Encoding::Utf8);
    assert_eq!(config.copyright.prefix, DEFAULT_PREFIX);
    assert_eq!(config.copyright.width, DEFAULT_WIDTH);
    assert!(config.copyright.long.to_vec().is_empty());
    assert!(config.files.authors);
    assert!(config.files.files);
    assert!(config.files.ignored.contains(&"./.git".to_string()));
    assert!(config.authors.with_email);
    assert!(config.aliases.is_empty());
  }

  #[test]
  fn test_validate_unknown_vcs() {
    let config: Config = toml::from_str("[project]\nvcs = \"CVS\"\n").expect("config should parse");
    assert!(matches!(config.validate(), Err(ConfigError::UnknownVcs(name)) if name == "CVS"));
  }

  #[test]
  fn test_validate_blank_prefix() {
    let config: Config = toml::from_str("[copyright]\nprefix = \"  \"\n").expect("config should parse");
    assert!(matches!(config.validate(), Err(ConfigError::InvalidPrefix(_))));
  }

  #[test]
  fn test_validate_zero_width() {
    let config: Config = toml::from_str("[copyright]\nwidth = 0\n").expect("config should parse");
    assert!(matches!(config.validate(), Err(ConfigError::InvalidWidth(0))));
  }

  #[test]
  fn test_validate_unknown_encoding() {
    let config: Config = toml::from_str("[copyright]\nencoding = \"ebcdic\"\n").expect("config should parse");
    assert!(matches!(config.validate(), Err(ConfigError::InvalidEncoding(_))));
  }

  #[test]
  fn test_load_config_from_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    std::fs::write(&config_path, "[project]\nname = \"demo\"\n").expect("write config");

    let config = Config::load(&config_path).expect("load should succeed");
    assert_eq!(config.project.name.as_deref(), Some("demo"));
  }

  #[test]
  fn test_load_config_file_not_found() {
    let result = Config::load(Path::new("/nonexistent/path/.update-copyright.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
  }

  #[test]
  fn test_load_config_invalid_toml() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    std::fs::write(&config_path, "[project\n").expect("write config");

    assert!(matches!(Config::load(&config_path), Err(ConfigError::ParseError { .. })));
  }

  #[test]
  fn test_discover_config_explicit_path() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join("custom-config.toml");
    std::fs::write(&config_path, "").expect("write config");

    let result = discover_config_path(Some(&config_path), temp_dir.path());
    assert_eq!(result, Some(config_path));
  }

  #[test]
  fn test_discover_config_project_root() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    std::fs::write(&config_path, "").expect("write config");

    let result = discover_config_path(None, temp_dir.path());
    assert_eq!(result, Some(config_path));
  }

  #[test]
  fn test_load_config_no_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("create temp dir");
    std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILENAME), "[project\n").expect("write config");

    let config = load_config(None, temp_dir.path(), true).expect("defaults");
    assert!(config.project.name.is_none());
  }

  #[test]
  fn test_load_config_missing_explicit_path_is_error() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let missing = temp_dir.path().join("missing.toml");
    assert!(load_config(Some(&missing), temp_dir.path(), false).is_err());
  }
}
