//! Entry points that rewrite whole stylesheet or markup documents.

use std::str;

use crate::asset_refs::{AssetStat, FsStat};
use crate::options::RewriteOptions;
use crate::scan::{process_css_imports_with, process_html_references_with};

/// Rewrite local `@import` references in `css` using the real filesystem.
pub fn css(css: &str, options: &RewriteOptions) -> String {
  Cachebuster::new(options.clone()).css(css)
}

/// Rewrite local tag references in `html` using the real filesystem.
pub fn html(html: &str, options: &RewriteOptions) -> String {
  Cachebuster::new(options.clone()).html(html)
}

/// Byte-level variant of [`css`]. Returns `None` when the input is not UTF-8 text.
pub fn css_bytes(css: &[u8], options: &RewriteOptions) -> Option<String> {
  Cachebuster::new(options.clone()).css_bytes(css)
}

/// Byte-level variant of [`html`]. Returns `None` when the input is not UTF-8 text.
pub fn html_bytes(html: &[u8], options: &RewriteOptions) -> Option<String> {
  Cachebuster::new(options.clone()).html_bytes(html)
}

/// Reusable rewriter holding options and filesystem access for repeated calls.
#[derive(Debug, Clone)]
pub struct Cachebuster<S = FsStat> {
  options: RewriteOptions,
  stat: S,
}

impl Cachebuster<FsStat> {
  /// Create a rewriter backed by `std::fs`.
  pub fn new(options: RewriteOptions) -> Self {
    Self::with_stat(options, FsStat)
  }
}

impl<S: AssetStat> Cachebuster<S> {
  /// Create a rewriter with custom filesystem access.
  pub fn with_stat(options: RewriteOptions, stat: S) -> Self {
    Self { options, stat }
  }

  /// Options applied to every call.
  pub fn options(&self) -> &RewriteOptions {
    &self.options
  }

  /// Rewrite local `.css` `@import` statements.
  pub fn css(&self, css: &str) -> String {
    process_css_imports_with(&self.stat, css, &self.options)
  }

  /// Rewrite local references for every configured tag/attribute pair.
  pub fn html(&self, html: &str) -> String {
    process_html_references_with(&self.stat, html, &self.options)
  }

  /// Rewrite a stylesheet given as raw bytes.
  pub fn css_bytes(&self, css: &[u8]) -> Option<String> {
    let text = decode_document(css)?;
    Some(self.css(text))
  }

  /// Rewrite markup given as raw bytes.
  pub fn html_bytes(&self, html: &[u8]) -> Option<String> {
    let text = decode_document(html)?;
    Some(self.html(text))
  }
}

fn decode_document(bytes: &[u8]) -> Option<&str> {
  match str::from_utf8(bytes) {
    Ok(text) => Some(text),
    Err(err) => {
      log::warn!("input is not UTF-8 text: {err}");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;
  use std::path::{Path, PathBuf};

  struct FixedStat {
    files: BTreeMap<PathBuf, i64>,
  }

  impl AssetStat for FixedStat {
    fn modified_millis(&self, path: &Path) -> Option<i64> {
      self.files.get(path).copied()
    }

    fn now_millis(&self) -> i64 {
      5
    }
  }

  fn buster() -> Cachebuster<FixedStat> {
    Cachebuster::with_stat(
      RewriteOptions::with_base_path("public"),
      FixedStat {
        files: BTreeMap::from([
          (PathBuf::from("public/myfile.css"), 1654646722102),
          (PathBuf::from("public/app.js"), 1654646722200),
        ]),
      },
    )
  }

  #[test]
  fn rejects_non_text_input() {
    let invalid = [0xff, 0xfe, 0x00];
    assert_eq!(css_bytes(&invalid, &RewriteOptions::default()), None);
    assert_eq!(html_bytes(&invalid, &RewriteOptions::default()), None);
  }

  #[test]
  fn accepts_text_bytes() {
    let html = "<p>nothing here</p>";
    assert_eq!(
      html_bytes(html.as_bytes(), &RewriteOptions::default()).as_deref(),
      Some(html)
    );
    assert_eq!(
      buster().css_bytes(b"@import \"myfile.css\";").as_deref(),
      Some("@import \"myfile.css?ts=1654646722102\";")
    );
  }

  #[test]
  fn rewrites_html_document() {
    let html = "<head>\n  <link rel=\"stylesheet\" href=\"myfile.css\"/>\n  <script src=\"app.js\"></script>\n  <script src=\"https://cdn.example.com/lib.js\"></script>\n  <img src=\"missing.png\">\n</head>";
    assert_eq!(
      buster().html(html),
      "<head>\n  <link rel=\"stylesheet\" href=\"myfile.css?ts=1654646722102\"/>\n  <script src=\"app.js?ts=1654646722200\"></script>\n  <script src=\"https://cdn.example.com/lib.js\"></script>\n  <img src=\"missing.png?ts=5-m\">\n</head>"
    );
  }

  #[test]
  fn rewrites_css_document() {
    let css = "@import 'myfile.css';\n@import \"https://mytest.com/a.css\";\nbody { color: red; }";
    assert_eq!(
      buster().css(css),
      "@import \"myfile.css?ts=1654646722102\";\n@import \"https://mytest.com/a.css\";\nbody { color: red; }"
    );
  }

  #[test]
  fn free_functions_use_defaults() {
    let css = super::css("@import \"missing.css\";", &RewriteOptions::default());
    assert!(css.starts_with("@import \"missing.css?ts="));
    assert!(css.ends_with("-m\";"));
  }
}
