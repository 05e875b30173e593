//! # update-copyright
//!
//! Keep the copyright blurbs of a version-controlled project current.

use anyhow::Result;
use update_copyright::cli::{Cli, run_update};

fn main() -> Result<()> {
  let cli = Cli::parse_args();
  run_update(cli.update_args)
}
