//! Delimiter-based scanners that locate references in raw stylesheet and markup text.

pub mod css;
pub mod html;

pub use css::{process_css_imports, process_css_imports_with};
pub use html::{
  AttributeMatch, extract_attribute_value, process_html_references, process_html_references_with,
};
