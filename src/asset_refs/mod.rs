//! Helpers for classifying, stamping and rewriting a single asset reference.
//!
//! The responsibilities are split into focused submodules so that URL classification, mtime
//! lookup and query merging can be tested independently of the document scanners.

mod filters;
mod rewrite;
mod timestamp;

pub use filters::is_absolute_reference;
pub use rewrite::{
    ReferenceParts, merge_query, reference_filename, rewrite_reference, rewrite_reference_with,
};
pub use timestamp::{
    AssetStat, FsStat, MISSING_MARKER, Timestamp, candidate_path, resolve_timestamp,
    resolve_timestamp_with,
};
