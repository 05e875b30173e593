//! # Workspace Module
//!
//! This module decides which directory update-copyright treats as the
//! project root, and which version control system lives there.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::config::DEFAULT_CONFIG_FILENAME;
use crate::vcs::Vcs;

/// Backends probed in order when looking for repository metadata.
const PROBE_ORDER: [Vcs; 3] = [Vcs::Git, Vcs::Mercurial, Vcs::Bazaar];

/// The resolved project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  root: PathBuf,
  vcs: Option<Vcs>,
}

impl Workspace {
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// The VCS whose metadata directory sits in the root, if any.
  pub const fn detected_vcs(&self) -> Option<Vcs> {
    self.vcs
  }
}

/// The VCS whose metadata directory is directly inside `dir`.
pub fn detect_vcs(dir: &Path) -> Option<Vcs> {
  PROBE_ORDER
    .into_iter()
    .find(|vcs| dir.join(vcs.metadata_dir()).exists())
}

/// Resolve the project root.
///
/// An explicit root is used as given. Otherwise the nearest ancestor of
/// `current_dir` holding a `.update-copyright.toml` or a `.git`, `.hg` or
/// `.bzr` directory is the root, falling back to `current_dir` itself.
pub fn resolve_workspace(explicit_root: Option<&Path>, current_dir: &Path) -> Result<Workspace> {
  if let Some(root) = explicit_root {
    let root = if root.is_absolute() {
      root.to_path_buf()
    } else {
      current_dir.join(root)
    };
    if !root.is_dir() {
      anyhow::bail!("Project root is not a directory: {}", root.display());
    }
    let vcs = detect_vcs(&root);
    return Ok(Workspace { root, vcs });
  }

  for dir in current_dir.ancestors() {
    let vcs = detect_vcs(dir);
    if vcs.is_some() || dir.join(DEFAULT_CONFIG_FILENAME).is_file() {
      debug!("Using project root {}", dir.display());
      return Ok(Workspace {
        root: dir.to_path_buf(),
        vcs,
      });
    }
  }

  debug!("No repository found, using {}", current_dir.display());
  Ok(Workspace {
    root: current_dir.to_path_buf(),
    vcs: None,
  })
}
