use std::borrow::Cow;
use std::sync::OnceLock;

use url::Url;

use super::timestamp::{AssetStat, FsStat, Timestamp, resolve_timestamp_with};
use crate::options::RewriteOptions;

/// Synthetic base used to pull a pathname out of relative references.
const PLACEHOLDER_BASE: &str = "https://cachebust.invalid/";

fn placeholder_base() -> &'static Url {
    static BASE: OnceLock<Url> = OnceLock::new();
    BASE.get_or_init(|| Url::parse(PLACEHOLDER_BASE).expect("invalid placeholder base URL"))
}

/// Raw pieces of a reference, borrowed from the caller's text without any normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceParts<'a> {
    /// Everything before the first `?` or `#`.
    pub path: &'a str,
    /// Text between `?` and `#`, when a `?` is present.
    pub query: Option<&'a str>,
    /// Text after the first `#`, when a `#` is present.
    pub fragment: Option<&'a str>,
}

impl<'a> ReferenceParts<'a> {
    /// Split a reference at its first `#` and then at its first `?`.
    pub fn split(href: &'a str) -> Self {
        let (before_fragment, fragment) = match href.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (href, None),
        };
        let (path, query) = match before_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (before_fragment, None),
        };

        Self {
            path,
            query,
            fragment,
        }
    }
}

/// Rewrite a local reference so its query string carries a fresh timestamp.
pub fn rewrite_reference(href: &str, options: &RewriteOptions) -> String {
    rewrite_reference_with(&FsStat, href, options)
}

/// Rewrite a local reference using the provided filesystem access.
///
/// The path text is emitted exactly as written, the query is merged via [`merge_query`]
/// and the fragment is carried through verbatim.
pub fn rewrite_reference_with<S: AssetStat + ?Sized>(
    stat: &S,
    href: &str,
    options: &RewriteOptions,
) -> String {
    let parts = ReferenceParts::split(href);
    let filename = reference_filename(href, parts.path);
    let timestamp = resolve_timestamp_with(stat, &filename, &options.base_path);

    render_reference(&parts, &options.query_key, timestamp)
}

fn render_reference(parts: &ReferenceParts<'_>, key: &str, timestamp: Timestamp) -> String {
    let query = merge_query(parts.query, key, &timestamp.to_string());

    let mut rendered = String::with_capacity(parts.path.len() + query.len() + 2);
    rendered.push_str(parts.path);
    rendered.push('?');
    rendered.push_str(&query);
    if let Some(fragment) = parts.fragment {
        rendered.push('#');
        rendered.push_str(fragment);
    }
    rendered
}

/// Derive the filesystem name of a reference.
///
/// The reference is parsed against a placeholder base to obtain a clean pathname, then any
/// leading `.`/`..` segments the parse folded away are put back and the result is
/// percent-decoded.
pub fn reference_filename(href: &str, raw_path: &str) -> String {
    let pathname = match placeholder_base().join(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw_path.to_string(),
    };

    let lead_in = relative_lead_in(href);
    let filename = if lead_in.is_empty() {
        pathname
    } else {
        format!("{lead_in}/{}", pathname.trim_start_matches('/'))
    };

    match urlencoding::decode(&filename) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => filename,
    }
}

/// Leading `.` and `..` segments of a reference, joined with `/`.
fn relative_lead_in(href: &str) -> String {
    href.split('/')
        .take_while(|segment| *segment == "." || *segment == "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Set `key=value` inside a raw query string.
///
/// Existing segments are kept byte-for-byte and in order. The first segment named `key` has
/// its value replaced in place and later duplicates are dropped; when no such segment exists
/// the pair is appended last. Empty segments (`a=1&&b=2`) are discarded.
pub fn merge_query(query: Option<&str>, key: &str, value: &str) -> String {
    let mut segments: Vec<Cow<'_, str>> = Vec::new();
    let mut replaced = false;

    for segment in query.unwrap_or_default().split('&') {
        if segment.is_empty() {
            continue;
        }

        let (raw_name, _) = segment.split_once('=').unwrap_or((segment, ""));
        if decode_component(raw_name) != key {
            segments.push(Cow::Borrowed(segment));
            continue;
        }

        if !replaced {
            segments.push(Cow::Owned(format!("{raw_name}={value}")));
            replaced = true;
        }
    }

    if !replaced {
        segments.push(Cow::Owned(format!("{}={value}", urlencoding::encode(key))));
    }

    segments.join("&")
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '+']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    struct FixedStat {
        files: BTreeMap<PathBuf, i64>,
    }

    impl FixedStat {
        fn with(path: &str, modified: i64) -> Self {
            Self {
                files: BTreeMap::from([(PathBuf::from(path), modified)]),
            }
        }
    }

    impl AssetStat for FixedStat {
        fn modified_millis(&self, path: &Path) -> Option<i64> {
            self.files.get(path).copied()
        }

        fn now_millis(&self) -> i64 {
            99
        }
    }

    fn options() -> RewriteOptions {
        RewriteOptions::with_base_path("site")
    }

    #[test]
    fn splits_path_query_and_fragment() {
        assert_eq!(ReferenceParts::split("a.css?x=1#top"), ReferenceParts {
            path: "a.css",
            query: Some("x=1"),
            fragment: Some("top"),
        });
        assert_eq!(ReferenceParts::split("a.css#top?x=1"), ReferenceParts {
            path: "a.css",
            query: None,
            fragment: Some("top?x=1"),
        });
    }

    #[test]
    fn appends_timestamp_to_bare_reference() {
        let stat = FixedStat::with("site/myfile.css", 1000);
        assert_eq!(
            rewrite_reference_with(&stat, "myfile.css", &options()),
            "myfile.css?ts=1000"
        );
    }

    #[test]
    fn appends_timestamp_after_existing_parameters() {
        let stat = FixedStat::with("site/myfile.css", 1000);
        assert_eq!(
            rewrite_reference_with(&stat, "myfile.css?key1=val1&key2=val2#hashvalue", &options()),
            "myfile.css?key1=val1&key2=val2&ts=1000#hashvalue"
        );
    }

    #[test]
    fn inserts_query_before_fragment() {
        let stat = FixedStat::with("site/myfile.css", 1000);
        assert_eq!(
            rewrite_reference_with(&stat, "myfile.css#fragment", &options()),
            "myfile.css?ts=1000#fragment"
        );
    }

    #[test]
    fn updates_existing_timestamp_in_place() {
        let stat = FixedStat::with("site/myfile.css", 1000);
        let rewritten = rewrite_reference_with(&stat, "myfile.css?ts=1234&key2=val2", &options());
        assert_eq!(rewritten, "myfile.css?ts=1000&key2=val2");
        assert!(!rewritten.contains("ts=1234"));
    }

    #[test]
    fn marks_missing_files() {
        let stat = FixedStat::with("site/other.css", 1000);
        assert_eq!(
            rewrite_reference_with(&stat, "myfile.css", &options()),
            "myfile.css?ts=99-m"
        );
        assert_eq!(
            rewrite_reference_with(&stat, "other.css", &RewriteOptions::default()),
            "other.css?ts=99-m"
        );
    }

    #[test]
    fn honours_custom_key() {
        let stat = FixedStat::with("site/myfile.css", 1000);
        let options = options().query_key("zappa");
        assert_eq!(
            rewrite_reference_with(&stat, "myfile.css?ts=5", &options),
            "myfile.css?ts=5&zappa=1000"
        );
    }

    #[test]
    fn is_stable_for_unchanged_files() {
        let stat = FixedStat::with("site/css/app.css", 1000);
        let once = rewrite_reference_with(&stat, "/css/app.css?v=2#x", &options());
        let twice = rewrite_reference_with(&stat, &once, &options());
        assert_eq!(once, "/css/app.css?v=2&ts=1000#x");
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_relative_lead_in() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("pages");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/app.css"), "").unwrap();
        fs::write(nested.join("local.css"), "").unwrap();

        let options = RewriteOptions::with_base_path(&nested);
        let parent = rewrite_reference("../css/app.css", &options);
        assert!(parent.starts_with("../css/app.css?ts="));
        assert!(!parent.ends_with("-m"));

        let current = rewrite_reference("./local.css?a=1", &options);
        assert!(current.starts_with("./local.css?a=1&ts="));
        assert!(!current.ends_with("-m"));
    }

    #[test]
    fn derives_filenames_from_references() {
        assert_eq!(reference_filename("myfile.css?x=1", "myfile.css"), "/myfile.css");
        assert_eq!(reference_filename("../../a/b.css", "../../a/b.css"), "../../a/b.css");
        assert_eq!(reference_filename("./b.css#f", "./b.css"), "./b.css");
        assert_eq!(reference_filename("my%20file.css", "my%20file.css"), "/my file.css");
    }

    #[test]
    fn merges_raw_query_segments() {
        assert_eq!(merge_query(None, "ts", "1"), "ts=1");
        assert_eq!(merge_query(Some(""), "ts", "1"), "ts=1");
        assert_eq!(merge_query(Some("a=%20b&&c"), "ts", "1"), "a=%20b&c&ts=1");
        assert_eq!(merge_query(Some("ts=0&a=1&ts=2"), "ts", "1"), "ts=1&a=1");
        assert_eq!(merge_query(Some("t%73=0&a=1"), "ts", "1"), "t%73=1&a=1");
    }
}
