use url::Url;

/// Determine whether a reference is a fully qualified URL that must be left alone.
///
/// The value is parsed on its own, without a base. Any value that parses carries a scheme
/// (`https://host/..`, `data:`, `mailto:`). Relative paths, bare filenames and anything else
/// that fails to parse are treated as local references.
pub fn is_absolute_reference(value: &str) -> bool {
    Url::parse(value).is_ok()
}
