//! Helpers for the path strings the controller passes around.
//!
//! A navigation path is an absolute path that may contain a query and a fragment, for example
//! `/app/users?page=2#top`. These helpers never allocate.

/// Removes the fragment, if any.
///
/// ```rust
/// assert_eq!(surfnav::path::strip_fragment("/a?b=1#c"), "/a?b=1");
/// assert_eq!(surfnav::path::strip_fragment("/a"), "/a");
/// ```
pub fn strip_fragment(path: &str) -> &str {
    match path.rfind('#') {
        Some(index) => &path[..index],
        None => path,
    }
}

/// Removes the query string and the fragment.
pub fn strip_query(path: &str) -> &str {
    let path = strip_fragment(path);
    match path.find('?') {
        Some(index) => &path[..index],
        None => path,
    }
}

/// Removes `base` from the start of `path` when present.
pub fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    path.strip_prefix(base).unwrap_or(path)
}

/// Whether `path` lives under `base`.
pub fn has_base(path: &str, base: &str) -> bool {
    path.starts_with(base)
}

/// Returns `true` when the path carries a fragment.
pub fn has_fragment(path: &str) -> bool {
    path.contains('#')
}

/// The key the screen cache uses: fragment and base path removed, query kept.
pub fn cache_key(path: &str, base: &str) -> String {
    strip_base(strip_fragment(path), base).to_string()
}

/// The path route patterns are tested against: fragment, query and base path removed.
pub fn route_path<'a>(path: &'a str, base: &str) -> &'a str {
    strip_base(strip_query(path), base)
}
