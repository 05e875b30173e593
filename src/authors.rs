//! # Authors Module
//!
//! Consolidation of raw author identities into canonical names.
//!
//! Version control history usually records the same person under several
//! identities (old email addresses, nicknames, typos). The [`AliasTable`]
//! maps each canonical identity to the identities that should be folded into
//! it, and [`AliasResolver`] applies that table to a set of identities,
//! producing a sorted, deduplicated author list.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Canonical key that marks aliases which should be dropped entirely.
pub const NO_AUTHOR: &str = "";

/// Order in which email stripping and alias lookup are applied.
///
/// The two orders disagree when aliases differ only by email address, so the
/// choice is explicit rather than implied by the code path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StripOrder {
  /// Resolve aliases against full identities, then drop the emails.
  #[default]
  ResolveThenStrip,
  /// Drop emails from the inputs and from both sides of the alias table,
  /// then resolve.
  StripThenResolve,
}

/// Mapping from canonical author identity to the identities folded into it.
///
/// The canonical key [`NO_AUTHOR`] sends its aliases to the "no author"
/// sentinel: they are removed from the output instead of renamed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
  entries: BTreeMap<String, Vec<String>>,
}

impl AliasTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add aliases for a canonical identity. `None` means "no author".
  pub fn insert<I, S>(&mut self, canonical: Option<&str>, aliases: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .entries
      .entry(canonical.unwrap_or(NO_AUTHOR).to_string())
      .or_default()
      .extend(aliases.into_iter().map(Into::into));
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Invert the table into alias → canonical lookups.
  ///
  /// A `None` canonical marks an alias that should be discarded.
  pub fn reverse(&self) -> HashMap<String, Option<String>> {
    let mut reversed = HashMap::new();
    for (canonical, aliases) in &self.entries {
      let target = (canonical != NO_AUTHOR).then(|| canonical.clone());
      for alias in aliases {
        reversed.insert(alias.clone(), target.clone());
      }
    }
    reversed
  }

  /// A copy of this table with the email stripped from every identity.
  fn without_emails(&self) -> Self {
    let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (canonical, aliases) in &self.entries {
      let key = if canonical == NO_AUTHOR {
        canonical.clone()
      } else {
        strip_email(canonical)
      };
      entries
        .entry(key)
        .or_default()
        .extend(aliases.iter().map(|alias| strip_email(alias)));
    }
    Self { entries }
  }
}

impl<K, V> FromIterator<(K, V)> for AliasTable
where
  K: Into<String>,
  V: IntoIterator,
  V::Item: Into<String>,
{
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut table = Self::new();
    for (canonical, aliases) in iter {
      let canonical = canonical.into();
      let canonical = (canonical != NO_AUTHOR).then_some(canonical);
      table.insert(canonical.as_deref(), aliases);
    }
    table
  }
}

static ADDR_SPEC: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*(.*?)\s*<[^<>]*>\s*$").expect("addr-spec regex must compile"));

/// Remove the `<addr-spec>` suffix from an author identity.
///
/// Falls back to the original string when there is no display name to keep,
/// e.g. for a bare `<jdoe@a.com>`.
pub fn strip_email(author: &str) -> String {
  let Some(caps) = ADDR_SPEC.captures(author) else {
    return author.to_string();
  };

  let name = caps[1].trim_matches('"').trim();
  if name.is_empty() {
    author.to_string()
  } else {
    name.to_string()
  }
}

/// Applies an [`AliasTable`] to sets of author identities.
#[derive(Debug, Default, Clone)]
pub struct AliasResolver {
  aliases: AliasTable,
  order: StripOrder,
}

impl AliasResolver {
  pub const fn new(aliases: AliasTable, order: StripOrder) -> Self {
    Self { aliases, order }
  }

  pub const fn order(&self) -> StripOrder {
    self.order
  }

  /// Consolidate `authors` into a sorted, deduplicated list of canonical
  /// names, with discarded identities removed.
  pub fn resolve<I, S>(&self, authors: I, with_email: bool) -> Vec<String>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    if with_email {
      return canonicalize(authors, &self.aliases);
    }

    match self.order {
      StripOrder::ResolveThenStrip => {
        let resolved = canonicalize(authors, &self.aliases);
        let stripped: BTreeSet<String> = resolved.iter().map(|author| strip_email(author)).collect();
        stripped.into_iter().collect()
      }
      StripOrder::StripThenResolve => {
        let table = self.aliases.without_emails();
        let stripped: Vec<String> = authors.into_iter().map(|author| strip_email(author.as_ref())).collect();
        canonicalize(stripped, &table)
      }
    }
  }
}

/// Replace aliases in `authors` using the default [`StripOrder`].
pub fn replace_aliases<I, S>(authors: I, with_email: bool, aliases: &AliasTable) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  AliasResolver::new(aliases.clone(), StripOrder::default()).resolve(authors, with_email)
}

fn canonicalize<I, S>(authors: I, aliases: &AliasTable) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let reversed = aliases.reverse();
  let unique: BTreeSet<Option<String>> = authors
    .into_iter()
    .map(|author| {
      let author = author.as_ref();
      match reversed.get(author) {
        Some(canonical) => canonical.clone(),
        None => Some(author.to_string()),
      }
    })
    .collect();

  unique.into_iter().flatten().filter(|author| !author.is_empty()).collect()
}
