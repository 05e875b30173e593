//! # File I/O Module
//!
//! This module provides file reading and writing utilities for the processor.
//! Contents are decoded and encoded with the project's configured text
//! encoding.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

/// Text encodings a project's files may use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
  #[default]
  Utf8,
  /// ISO-8859-1: every byte is the code point of the same value.
  Latin1,
}

/// Error returned when parsing an unknown encoding name.
#[derive(Debug, thiserror::Error)]
#[error("Unsupported encoding: {0}")]
pub struct ParseEncodingError(pub String);

impl FromStr for Encoding {
  type Err = ParseEncodingError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().replace('_', "-").as_str() {
      "utf-8" | "utf8" => Ok(Encoding::Utf8),
      "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
      _ => Err(ParseEncodingError(s.to_string())),
    }
  }
}

impl Encoding {
  /// Canonical name, as written in configuration files.
  pub const fn name(self) -> &'static str {
    match self {
      Encoding::Utf8 => "utf-8",
      Encoding::Latin1 => "latin-1",
    }
  }

  /// Decode file bytes, or `None` if they are not valid text.
  pub fn decode(self, bytes: &[u8]) -> Option<String> {
    match self {
      Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
      Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
  }

  /// Encode text, or `None` if it holds characters the encoding cannot
  /// represent.
  pub fn encode(self, text: &str) -> Option<Vec<u8>> {
    match self {
      Encoding::Utf8 => Some(text.as_bytes().to_vec()),
      Encoding::Latin1 => text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect(),
    }
  }
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Why a file could not be read as text.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
  /// The file exists but reading it failed.
  #[error("Failed to read file {}: {source}", path.display())]
  Io { path: PathBuf, source: io::Error },

  /// The bytes are not valid text in the configured encoding.
  #[error("File is not valid {encoding} text: {}", path.display())]
  Decode { path: PathBuf, encoding: Encoding },
}

/// File I/O operations for the processor.
///
/// This struct provides static methods for reading and writing files.
pub struct FileIO;

impl FileIO {
  /// Read and decode a file.
  ///
  /// Returns `Ok(None)` when the file does not exist,
  /// [`ReadError::Decode`] when it is not valid text in `encoding` and
  /// [`ReadError::Io`] for every other read failure.
  pub fn read_text(path: &Path, encoding: Encoding) -> Result<Option<String>, ReadError> {
    let bytes = match std::fs::read(path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ReadError::Io {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    match encoding.decode(&bytes) {
      Some(text) => Ok(Some(text)),
      None => Err(ReadError::Decode {
        path: path.to_path_buf(),
        encoding,
      }),
    }
  }

  /// Encode and write file content, creating parent directories as needed.
  pub fn write_text(path: &Path, content: &str, encoding: Encoding) -> Result<()> {
    let bytes = encoding
      .encode(content)
      .with_context(|| format!("Content cannot be encoded as {}: {}", encoding, path.display()))?;

    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path.display()))
  }
}
