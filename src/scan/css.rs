//! `@import` rewriting for stylesheet text.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::asset_refs::{AssetStat, FsStat, is_absolute_reference, rewrite_reference_with};
use crate::options::RewriteOptions;

fn import_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"@import\s+["']([^"']+\.css(?:[?#][^"']*)?)["'];"#)
      .expect("invalid @import regex")
  })
}

/// Rewrite every local `.css` `@import` statement in `css`.
pub fn process_css_imports(css: &str, options: &RewriteOptions) -> String {
  process_css_imports_with(&FsStat, css, options)
}

/// Rewrite local `@import` statements using the provided filesystem access.
///
/// References starting with `http` or `//`, or carrying any other scheme, are skipped. Each statement is replaced everywhere it
/// occurs verbatim and is always re-emitted with double quotes.
pub fn process_css_imports_with<S: AssetStat + ?Sized>(
  stat: &S,
  css: &str,
  options: &RewriteOptions,
) -> String {
  let mut text = css.to_string();
  let mut seen = BTreeSet::new();

  for caps in import_pattern().captures_iter(css) {
    let (Some(statement), Some(reference)) = (caps.get(0), caps.get(1)) else {
      continue;
    };
    let (statement, reference) = (statement.as_str(), reference.as_str());

    if is_remote_import(reference) {
      log::trace!("skipping remote import {reference}");
      continue;
    }
    if !seen.insert(statement) {
      continue;
    }

    let href = rewrite_reference_with(stat, reference, options);
    let replacement = format!("@import \"{href}\";");
    log::debug!("rewrote @import {reference} -> {href}");
    text = text.replace(statement, &replacement);
  }

  text
}

/// Imports that name another host or scheme are never stamped.
fn is_remote_import(reference: &str) -> bool {
  reference.starts_with("http") || reference.starts_with("//") || is_absolute_reference(reference)
}
