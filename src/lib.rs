#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_refs;
pub mod cachebust;
pub mod config;
pub mod options;
pub mod scan;

pub use asset_refs::{AssetStat, FsStat, Timestamp, is_absolute_reference, rewrite_reference};
pub use cachebust::{Cachebuster, css, css_bytes, html, html_bytes};
pub use config::{CachebustConfig, ConfigError};
pub use options::{DEFAULT_QUERY_KEY, DEFAULT_TAG_ATTRIBUTES, RewriteOptions};
