//! Tag attribute rewriting for HTML text, without parsing the document.

use std::ops::Range;

use indexmap::IndexSet;
use regex::Regex;

use crate::asset_refs::{AssetStat, FsStat, is_absolute_reference, rewrite_reference_with};
use crate::options::RewriteOptions;

/// Attribute value located inside a tag snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch<'a> {
  /// Unquoted attribute value.
  pub value: &'a str,
  /// Byte range of the value within the snippet, excluding quotes.
  pub span: Range<usize>,
}

/// Pattern matching `<tag ... attribute="value"`, spanning line breaks inside the tag.
///
/// Quoted values ahead of the attribute are skipped whole, so a `>` inside them does not
/// end the tag.
fn tag_pattern(tag: &str, attribute: &str) -> Regex {
  Regex::new(&format!(
    r#"(?i)<{tag}\s(?:(?:[^>"]|"[^"]*")*?\s)?{attribute}\s*=\s*"[^"\n]*""#,
    tag = regex::escape(tag),
    attribute = regex::escape(attribute),
  ))
  .expect("invalid tag regex")
}

fn attribute_pattern(attribute: &str) -> Regex {
  Regex::new(&format!(
    r#"(?i)\s{}\s*=\s*"([^"\n]*)""#,
    regex::escape(attribute)
  ))
  .expect("invalid attribute regex")
}

/// Extract the double-quoted value of `attribute` from a single tag snippet.
pub fn extract_attribute_value<'a>(snippet: &'a str, attribute: &str) -> Option<AttributeMatch<'a>> {
  extract_with(&attribute_pattern(attribute), snippet)
}

fn extract_with<'a>(pattern: &Regex, snippet: &'a str) -> Option<AttributeMatch<'a>> {
  let caps = pattern.captures(snippet)?;
  let value = caps.get(1)?;
  Some(AttributeMatch {
    value: value.as_str(),
    span: value.range(),
  })
}

/// Rewrite local references for every configured tag/attribute pair in `html`.
pub fn process_html_references(html: &str, options: &RewriteOptions) -> String {
  process_html_references_with(&FsStat, html, options)
}

/// Rewrite local tag references using the provided filesystem access.
///
/// Pairs are processed in table order against the progressively updated text, and matches
/// in scan order. Each rewritten snippet replaces every verbatim copy of the original.
pub fn process_html_references_with<S: AssetStat + ?Sized>(
  stat: &S,
  html: &str,
  options: &RewriteOptions,
) -> String {
  let mut text = html.to_string();

  for (tag, attribute) in &options.tag_attributes {
    let pattern = tag_pattern(tag, attribute);
    let value_pattern = attribute_pattern(attribute);
    let snippets: IndexSet<String> = pattern
      .find_iter(&text)
      .map(|found| found.as_str().to_string())
      .collect();

    for snippet in &snippets {
      let Some(updated) = rewrite_snippet(stat, snippet, &value_pattern, options) else {
        continue;
      };
      log::debug!("rewrote <{tag} {attribute}>: {} -> {}", snippet.trim(), updated.trim());
      text = text.replace(snippet.as_str(), &updated);
    }
  }

  text
}

fn rewrite_snippet<S: AssetStat + ?Sized>(
  stat: &S,
  snippet: &str,
  value_pattern: &Regex,
  options: &RewriteOptions,
) -> Option<String> {
  let found = extract_with(value_pattern, snippet)?;
  if found.value.is_empty() {
    return None;
  }
  if is_absolute_reference(found.value) {
    log::trace!("leaving absolute reference {}", found.value);
    return None;
  }

  let href = rewrite_reference_with(stat, found.value, options);
  let mut updated = String::with_capacity(snippet.len() + href.len());
  updated.push_str(&snippet[..found.span.start]);
  updated.push_str(&href);
  updated.push_str(&snippet[found.span.end..]);
  Some(updated)
}
