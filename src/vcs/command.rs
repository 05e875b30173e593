//! External process invocation for the command-line backends.
//!
//! Commands run with an explicit working directory, so the process's own
//! current directory is never changed. Stdin is closed and both output
//! streams are captured in full instead of leaking to the console.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::trace;

use super::VcsError;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
  pub status: i32,
  pub stdout: String,
  pub stderr: String,
}

/// A command line to run against a repository.
#[derive(Debug, Clone)]
pub struct Invocation {
  program: String,
  args: Vec<OsString>,
  envs: Vec<(OsString, OsString)>,
  expect: Vec<i32>,
}

impl Invocation {
  /// A new invocation that only accepts exit status 0.
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      envs: Vec::new(),
      expect: vec![0],
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
    self
  }

  pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
    self
      .envs
      .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
    self
  }

  /// Replace the set of exit codes treated as success.
  pub fn expect(mut self, codes: &[i32]) -> Self {
    self.expect = codes.to_vec();
    self
  }

  fn display_args(&self) -> Vec<String> {
    self.args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
  }

  /// Run the command in `cwd`, capturing stdout and stderr.
  ///
  /// # Errors
  ///
  /// Returns [`VcsError::Spawn`] if the program cannot be started and
  /// [`VcsError::CommandFailed`] if it exits with a status outside the
  /// expected set (or is killed by a signal).
  pub fn run(&self, cwd: &Path) -> Result<CommandOutput, VcsError> {
    trace!("Running {} {:?} in {}", self.program, self.display_args(), cwd.display());

    let output = Command::new(&self.program)
      .args(&self.args)
      .envs(self.envs.iter().map(|(k, v)| (k, v)))
      .current_dir(cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .output()
      .map_err(|source| VcsError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    match output.status.code() {
      Some(status) if self.expect.contains(&status) => Ok(CommandOutput { status, stdout, stderr }),
      status => Err(VcsError::CommandFailed {
        program: self.program.clone(),
        args: self.display_args(),
        status,
        stderr: stderr.trim().to_string(),
      }),
    }
  }
}
