//! # update-copyright
//!
//! A tool that keeps the copyright blurbs of a version-controlled project in
//! step with its history.
//!
//! `update-copyright` asks the project's VCS (Git, Mercurial or Bazaar) which
//! years and which people touched each file, folds author aliases into one
//! canonical name, and rewrites the `Copyright` comment block of every file
//! that has one. It also regenerates the project-wide `AUTHORS` file and,
//! optionally, a Python module exposing the license text.
//!
//! Files without a copyright block are never touched, and a file is only
//! written when its regenerated contents differ.
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use update_copyright::config::load_config;
//! use update_copyright::project::ProjectBuilder;
//!
//! fn main() -> anyhow::Result<()> {
//!     let root = Path::new(".");
//!     let config = load_config(None, root, false)?;
//!
//!     let project = ProjectBuilder::new(root).config(config).dry_run(true).build()?;
//!     project.validate()?;
//!
//!     for report in project.update_files(&[], root)? {
//!         println!("{:?} {}", report.action, report.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`project`] - Drives the AUTHORS, file and license module updates
//! * [`copyright`] - Copyright block formatting and replacement
//! * [`authors`] - Alias consolidation
//! * [`vcs`] - Git, Mercurial and Bazaar history backends
//! * [`config`] - `.update-copyright.toml` loading
//!
//! [`project`]: crate::project
//! [`copyright`]: crate::copyright
//! [`authors`]: crate::authors
//! [`vcs`]: crate::vcs
//! [`config`]: crate::config

pub mod authors;
pub mod cli;
pub mod config;
pub mod copyright;
pub mod diff;
pub mod logging;
pub mod output;
pub mod processor;
pub mod project;
pub mod report;
pub mod stub;
pub mod vcs;
pub mod workspace;
