//! Options shared by every rewrite pass, plus the built-in defaults.

use std::path::PathBuf;

use indexmap::IndexMap;

/// Query parameter injected when the caller does not name one.
pub const DEFAULT_QUERY_KEY: &str = "ts";

/// Tag/attribute pairs scanned by default, in scan order.
pub const DEFAULT_TAG_ATTRIBUTES: &[(&str, &str)] = &[
  ("link", "href"),
  ("script", "src"),
  ("img", "src"),
  ("source", "srcset"),
  ("audio", "src"),
  ("video", "src"),
  ("track", "src"),
];

/// Build the default tag to attribute table as an owned, ordered map.
pub fn default_tag_attributes() -> IndexMap<String, String> {
  DEFAULT_TAG_ATTRIBUTES
    .iter()
    .map(|(tag, attribute)| (tag.to_string(), attribute.to_string()))
    .collect()
}

/// Immutable settings for a single `css` or `html` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
  /// Directory local references are resolved against. Empty means every
  /// reference is treated as missing.
  pub base_path: PathBuf,
  /// Name of the injected query parameter.
  pub query_key: String,
  /// Tag name to attribute name, scanned in insertion order.
  pub tag_attributes: IndexMap<String, String>,
}

impl Default for RewriteOptions {
  fn default() -> Self {
    Self {
      base_path: PathBuf::new(),
      query_key: DEFAULT_QUERY_KEY.to_string(),
      tag_attributes: default_tag_attributes(),
    }
  }
}

impl RewriteOptions {
  /// Start from the defaults with a base directory for mtime lookups.
  pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
      ..Self::default()
    }
  }

  /// Replace the query parameter name. An empty key keeps the default.
  pub fn query_key(mut self, key: impl Into<String>) -> Self {
    let key = key.into();
    if !key.is_empty() {
      self.query_key = key;
    }
    self
  }

  /// Replace the whole tag table. An empty table keeps the default.
  pub fn tag_attributes<I, T, A>(mut self, pairs: I) -> Self
  where
    I: IntoIterator<Item = (T, A)>,
    T: Into<String>,
    A: Into<String>,
  {
    let table: IndexMap<String, String> = pairs
      .into_iter()
      .map(|(tag, attribute)| (tag.into(), attribute.into()))
      .collect();
    if !table.is_empty() {
      self.tag_attributes = table;
    }
    self
  }
}
