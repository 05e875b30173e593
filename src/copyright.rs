//! # Copyright Module
//!
//! Locating, rendering and replacing copyright blocks.
//!
//! A copyright block is a run of lines whose first line starts with
//! `<prefix>Copyright` and whose following lines start with the prefix
//! leader (the prefix without trailing whitespace). The first block in a file
//! is swapped for a freshly rendered copyright string; everything else in the
//! file is left byte-for-byte untouched.
//!
//! ## Example
//!
//! ```rust
//! use update_copyright::copyright::{CopyrightParams, Info, update_copyright};
//!
//! # fn main() -> Result<(), update_copyright::copyright::CopyrightError> {
//! let authors = vec!["Jack".to_string(), "Jill".to_string()];
//! let text = vec!["BLURB".to_string()];
//! let info = Info::new();
//! let params = CopyrightParams::new(2008, 2010, &authors, &text, &info);
//!
//! let contents = "# Copyright (C) 2008 Jack\n# old blurb\ncode\n";
//! let updated = update_copyright(contents, &params)?;
//! assert_eq!(
//!   updated,
//!   "# Copyright (C) 2008-2010 Jack\n#                         Jill\n#\n# BLURB\ncode\n"
//! );
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;

/// Sentinel that stands in for the old copyright block between tagging and
/// rendering. Built with `concat!` so this source file never contains it.
pub const COPYRIGHT_TAG: &str = concat!("-xyz-COPY", "-RIGHT-zyx-");

/// Default comment prefix for copyright lines.
pub const DEFAULT_PREFIX: &str = "# ";

/// Default column at which license paragraphs are wrapped.
pub const DEFAULT_WIDTH: usize = 79;

/// Project information substituted into `%(key)s` placeholders.
pub type Info = BTreeMap<String, String>;

/// Build the standard info mapping for a project.
pub fn project_info(project: &str, vcs: &str) -> Info {
  Info::from([
    ("project".to_string(), project.to_string()),
    ("vcs".to_string(), vcs.to_string()),
  ])
}

/// The current calendar year in UTC, used as the final year of every range.
pub fn current_year() -> i32 {
  chrono::Utc::now().year()
}

/// Errors raised while rendering a copyright string.
#[derive(Debug, thiserror::Error)]
pub enum CopyrightError {
  /// A paragraph references a key that the info mapping does not provide.
  #[error("Can't format {paragraph:?}: no value for placeholder '{key}'")]
  MissingKey { key: String, paragraph: String },

  /// A paragraph contains a `%` that is neither `%%` nor `%(key)s`.
  #[error("Can't format {paragraph:?}: unsupported format sequence at byte {offset}")]
  BadPlaceholder { paragraph: String, offset: usize },
}

/// How the author list is laid out in the copyright header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AuthorFormat {
  /// One author per line, aligned under the first author.
  #[default]
  Long,
  /// All authors on the header line, comma separated.
  Short,
}

impl AuthorFormat {
  /// Format the header lines (without prefix) for the given year string.
  pub fn format(self, year_string: &str, authors: &[String]) -> Vec<String> {
    let Some((first, rest)) = authors.split_first() else {
      return vec![year_string.to_string()];
    };

    match self {
      AuthorFormat::Long => {
        let indent = " ".repeat(year_string.chars().count() + 1);
        let mut lines = Vec::with_capacity(authors.len());
        lines.push(format!("{} {}", year_string, first));
        lines.extend(rest.iter().map(|author| format!("{}{}", indent, author)));
        lines
      }
      AuthorFormat::Short => vec![format!("{} {}", year_string, authors.join(", "))],
    }
  }
}

/// Everything needed to render a copyright string.
///
/// Construct with [`CopyrightParams::new`] and adjust the optional settings
/// with struct update syntax or the `with_*` helpers.
#[derive(Debug, Clone)]
pub struct CopyrightParams<'a> {
  pub original_year: i32,
  pub final_year: i32,
  pub authors: &'a [String],
  /// License paragraphs, each possibly containing `%(key)s` placeholders.
  pub text: &'a [String],
  pub info: &'a Info,
  pub prefix: &'a str,
  pub width: usize,
  pub wrap: bool,
  pub author_format: AuthorFormat,
}

impl<'a> CopyrightParams<'a> {
  pub const fn new(
    original_year: i32,
    final_year: i32,
    authors: &'a [String],
    text: &'a [String],
    info: &'a Info,
  ) -> Self {
    Self {
      original_year,
      final_year,
      authors,
      text,
      info,
      prefix: DEFAULT_PREFIX,
      width: DEFAULT_WIDTH,
      wrap: true,
      author_format: AuthorFormat::Long,
    }
  }

  pub const fn with_prefix(mut self, prefix: &'a str) -> Self {
    self.prefix = prefix;
    self
  }

  pub const fn with_width(mut self, width: usize) -> Self {
    self.width = width;
    self
  }

  pub const fn with_wrap(mut self, wrap: bool) -> Self {
    self.wrap = wrap;
    self
  }

  pub const fn with_author_format(mut self, author_format: AuthorFormat) -> Self {
    self.author_format = author_format;
    self
  }

  fn year_string(&self) -> String {
    if self.original_year == self.final_year {
      format!("Copyright (C) {}", self.original_year)
    } else {
      format!("Copyright (C) {}-{}", self.original_year, self.final_year)
    }
  }
}

/// Render the copyright string: the header, a blank prefixed line, then the
/// license paragraphs separated by blank prefixed lines.
pub fn copyright_string(params: &CopyrightParams<'_>) -> Result<String, CopyrightError> {
  let prefix = params.prefix;
  let blank = prefix.trim_end();

  let header: Vec<String> = params
    .author_format
    .format(&params.year_string(), params.authors)
    .into_iter()
    .map(|line| format!("{}{}", prefix, line))
    .collect();

  let mut sections = Vec::with_capacity(params.text.len() + 1);
  sections.push(header.join("\n"));

  for paragraph in params.text {
    let paragraph = substitute(paragraph, params.info)?;
    let rendered = if paragraph.trim().is_empty() {
      blank.to_string()
    } else if params.wrap {
      fill(&paragraph, params.width, prefix)
    } else {
      format!("{}{}", prefix, paragraph)
    };
    sections.push(rendered);
  }

  Ok(sections.join(&format!("\n{}\n", blank)))
}

/// Expand `%(key)s` placeholders from `info`; `%%` yields a literal `%`.
pub fn substitute(paragraph: &str, info: &Info) -> Result<String, CopyrightError> {
  let mut output = String::with_capacity(paragraph.len());
  let mut rest = paragraph;

  while let Some(pos) = rest.find('%') {
    output.push_str(&rest[..pos]);
    let offset = paragraph.len() - rest.len() + pos;
    let tail = &rest[pos + 1..];

    if let Some(after) = tail.strip_prefix('%') {
      output.push('%');
      rest = after;
      continue;
    }

    let bad = || CopyrightError::BadPlaceholder {
      paragraph: paragraph.to_string(),
      offset,
    };
    let inner = tail.strip_prefix('(').ok_or_else(bad)?;
    let close = inner.find(')').ok_or_else(bad)?;
    let key = &inner[..close];
    let after = inner[close + 1..].strip_prefix('s').ok_or_else(bad)?;

    let value = info.get(key).ok_or_else(|| CopyrightError::MissingKey {
      key: key.to_string(),
      paragraph: paragraph.to_string(),
    })?;
    output.push_str(value);
    rest = after;
  }

  output.push_str(rest);
  Ok(output)
}

/// Greedy word wrap with `prefix` as both the initial and subsequent indent.
///
/// Whitespace runs inside a line are kept (so two spaces after a period stay
/// two spaces); whitespace at line breaks is dropped. Words longer than the
/// width are placed on a line of their own rather than split.
/// Words are never broken and hyphens are not break points, so author names
/// and e-mail addresses stay whole.
pub fn fill(paragraph: &str, width: usize, prefix: &str) -> String {
  let prefix_len = prefix.chars().count();
  let mut lines: Vec<String> = Vec::new();
  let mut line = String::from(prefix);
  let mut line_len = prefix_len;

  for (gap, word) in split_words(paragraph) {
    let word_len = word.chars().count();
    if line_len == prefix_len {
      line.push_str(word);
      line_len += word_len;
    } else if line_len + gap + word_len <= width {
      line.extend(std::iter::repeat_n(' ', gap));
      line.push_str(word);
      line_len += gap + word_len;
    } else {
      lines.push(std::mem::replace(&mut line, format!("{}{}", prefix, word)));
      line_len = prefix_len + word_len;
    }
  }

  if line_len > prefix_len {
    lines.push(line);
  }
  lines.join("\n")
}

/// Split text into `(preceding whitespace width, word)` pairs.
fn split_words(text: &str) -> Vec<(usize, &str)> {
  let mut words = Vec::new();
  let mut gap = 0;
  let mut start = None;

  for (idx, ch) in text.char_indices() {
    if ch.is_whitespace() {
      if let Some(begin) = start.take() {
        words.push((gap, &text[begin..idx]));
        gap = 0;
      }
      gap += 1;
    } else if start.is_none() {
      start = Some(idx);
    }
  }
  if let Some(begin) = start {
    words.push((gap, &text[begin..]));
  }
  words
}

/// States of the copyright block scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
  OutsideBlock,
  InsideBlock,
}

/// What the scanner does with a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
  /// Emit the line unchanged.
  Keep,
  /// The line opens the copyright block; emit the tag in its place.
  Tag,
  /// The line continues the block and is discarded.
  Discard,
}

/// Two-state automaton that recognizes the first copyright block.
#[derive(Debug, Clone)]
pub struct CopyrightScanner {
  header: String,
  leader: String,
}

impl CopyrightScanner {
  pub fn new(prefix: &str) -> Self {
    Self {
      header: format!("{}Copyright", prefix),
      leader: prefix.trim_end().to_string(),
    }
  }

  /// Feed one line (without its line ending) to the automaton.
  pub fn step(&self, state: ScanState, line: &str) -> (ScanState, LineAction) {
    match state {
      ScanState::OutsideBlock if line.starts_with(&self.header) => (ScanState::InsideBlock, LineAction::Tag),
      ScanState::OutsideBlock => (ScanState::OutsideBlock, LineAction::Keep),
      ScanState::InsideBlock if !self.leader.is_empty() && line.starts_with(&self.leader) => {
        (ScanState::InsideBlock, LineAction::Discard)
      }
      ScanState::InsideBlock => (ScanState::OutsideBlock, LineAction::Keep),
    }
  }

  /// Byte range of the first copyright block, line endings included.
  ///
  /// Scanning stops as soon as the first block ends, so later blocks are
  /// never touched.
  pub fn find_block(&self, contents: &str) -> Option<std::ops::Range<usize>> {
    let mut state = ScanState::OutsideBlock;
    let mut block: Option<std::ops::Range<usize>> = None;
    let mut offset = 0;

    for line in contents.split_inclusive('\n') {
      let end = offset + line.len();
      let (next, action) = self.step(state, strip_line_ending(line));
      match action {
        LineAction::Tag => block = Some(offset..end),
        LineAction::Discard => {
          if let Some(range) = block.as_mut() {
            range.end = end;
          }
        }
        LineAction::Keep if state == ScanState::InsideBlock => return block,
        LineAction::Keep => {}
      }
      state = next;
      offset = end;
    }

    block
  }
}

fn strip_line_ending(line: &str) -> &str {
  let line = line.strip_suffix('\n').unwrap_or(line);
  line.strip_suffix('\r').unwrap_or(line)
}

/// File contents with the copyright block cut out.
///
/// Displays with [`COPYRIGHT_TAG`] where the block was; [`fill`](Self::fill)
/// puts rendered text there instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedContents<'a> {
  before: &'a str,
  block: &'a str,
  after: &'a str,
}

impl<'a> TaggedContents<'a> {
  /// The text of the block that was cut out.
  pub const fn block(&self) -> &'a str {
    self.block
  }

  fn newline(&self) -> &'static str {
    // Rendered lines follow the line ending style of the block they replace.
    if self.block.contains("\r\n") {
      "\r\n"
    } else {
      "\n"
    }
  }

  fn ending(&self) -> &'a str {
    let text = strip_line_ending(self.block);
    &self.block[text.len()..]
  }

  /// Replace the tag with `replacement`, keeping the block's line endings.
  pub fn fill(&self, replacement: &str) -> String {
    let newline = self.newline();
    let mut output = String::with_capacity(self.before.len() + replacement.len() + self.after.len() + 2);
    output.push_str(self.before);
    if newline == "\n" {
      output.push_str(replacement);
    } else {
      output.push_str(&replacement.replace('\n', newline));
    }
    output.push_str(self.ending());
    output.push_str(self.after);
    output
  }
}

impl fmt::Display for TaggedContents<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}{}", self.before, COPYRIGHT_TAG, self.ending(), self.after)
  }
}

/// Cut the first copyright block out of `contents`.
///
/// Returns `None` when no line starts with `<prefix>Copyright`.
pub fn tag_copyright<'a>(contents: &'a str, prefix: &str) -> Option<TaggedContents<'a>> {
  let range = CopyrightScanner::new(prefix).find_block(contents)?;
  Some(TaggedContents {
    before: &contents[..range.start],
    block: &contents[range.clone()],
    after: &contents[range.end..],
  })
}

/// Replace the first copyright block in `contents` with a freshly rendered
/// copyright string.
///
/// The string is rendered before the contents are inspected, so a broken
/// license template is reported even for files without a block. Files
/// without a block come back unchanged (and borrowed); no block is inserted.
pub fn update_copyright<'a>(contents: &'a str, params: &CopyrightParams<'_>) -> Result<Cow<'a, str>, CopyrightError> {
  let rendered = copyright_string(params)?;

  Ok(match tag_copyright(contents, params.prefix) {
    Some(tagged) => Cow::Owned(tagged.fill(&rendered)),
    None => Cow::Borrowed(contents),
  })
}
