//! Route parameter and query string handling.
//!
//! Two complementary types:
//!
//! - [`RouteParams`] — values extracted from dynamic path segments (`:id` in
//!   `/users/:id`). Parameters inherit down the route hierarchy; child values
//!   win on collision.
//! - [`QueryParams`] — the `?key=value&...` portion of a location. Multiple
//!   values per key are preserved, and the set can be re-serialized when a
//!   tab's full path needs to be rebuilt.
//!
//! Both types serialize, because tabs (which carry their params and query) are
//! persisted through the key-value store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path parameters extracted from dynamic route segments.
///
/// # Example
///
/// ```
/// use admin_navigator::RouteParams;
///
/// let params = RouteParams::from_path("/users/42", "/users/:id");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get_as::<u32>("id"), Some(42));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams {
    values: BTreeMap<String, String>,
}

impl RouteParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a parameter and parse it.
    ///
    /// Returns `None` when the key is absent or the value does not parse.
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.values.get(key)?.parse().ok()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Merge parent parameters with child parameters; the child wins on
    /// collision. Used for parameter inheritance in nested routes.
    pub fn merge(parent: &Self, child: &Self) -> Self {
        let mut merged = parent.clone();
        for (key, value) in child.iter() {
            merged.insert(key, value);
        }
        merged
    }

    /// Match `path` against `pattern` and extract dynamic segment values.
    ///
    /// The pattern uses `:name` for dynamic segments; static segments must
    /// match exactly and the segment counts must agree. A mismatch yields an
    /// empty set.
    pub fn from_path(path: &str, pattern: &str) -> Self {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() != pattern_segments.len() {
            return Self::new();
        }

        let mut params = Self::new();
        for (path_seg, pattern_seg) in path_segments.iter().zip(&pattern_segments) {
            if let Some(name) = pattern_seg.strip_prefix(':') {
                params.insert(name, *path_seg);
            } else if pattern_seg != path_seg {
                return Self::new();
            }
        }
        params
    }
}

/// Query parameters parsed from the `?key=value&...` part of a location.
///
/// Keys may carry several values; insertion order per key is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams {
    values: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create an empty query set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.append(percent_decode(key), percent_decode(value));
        }
        params
    }

    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.first().map(String::as_str)
    }

    /// All values for a key.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// First value for a key, parsed.
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    /// Append a value to a key (does not replace existing values).
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize back into `key=value&...` form.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, values) in &self.values {
            for value in values {
                pairs.push(format!("{}={}", percent_encode(key), percent_encode(value)));
            }
        }
        pairs.join("&")
    }
}

fn percent_encode(s: &str) -> String {
    // Escaping operates on UTF-8 bytes, one `%XX` per byte.
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hex: Vec<u8> = iter.by_ref().take(2).collect();
                match std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                {
                    Some(byte) => bytes.push(byte),
                    None => {
                        bytes.push(b'%');
                        bytes.extend_from_slice(&hex);
                    }
                }
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(b),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_extracts_params() {
        let params = RouteParams::from_path("/users/123/posts/456", "/users/:user/posts/:post");
        assert_eq!(params.get("user"), Some("123"));
        assert_eq!(params.get("post"), Some("456"));
    }

    #[test]
    fn from_path_mismatch_is_empty() {
        assert!(RouteParams::from_path("/products/1", "/users/:id").is_empty());
        assert!(RouteParams::from_path("/users/1/extra", "/users/:id").is_empty());
    }

    #[test]
    fn merge_child_wins() {
        let mut parent = RouteParams::new();
        parent.insert("workspace", "1");
        parent.insert("view", "list");
        let mut child = RouteParams::new();
        child.insert("view", "grid");

        let merged = RouteParams::merge(&parent, &child);
        assert_eq!(merged.get("workspace"), Some("1"));
        assert_eq!(merged.get("view"), Some("grid"));
    }

    #[test]
    fn query_parse_and_typed_access() {
        let query = QueryParams::parse("page=2&tag=a&tag=b");
        assert_eq!(query.get_as::<u32>("page"), Some(2));
        assert_eq!(query.get_all("tag").unwrap().len(), 2);
        assert_eq!(query.get("tag"), Some("a"));
    }

    #[test]
    fn query_round_trip() {
        let query = QueryParams::parse("q=hello%20world&page=1");
        assert_eq!(query.get("q"), Some("hello world"));
        let s = query.to_query_string();
        assert!(s.contains("q=hello%20world"));
        assert!(s.contains("page=1"));
    }

    #[test]
    fn query_round_trips_multibyte_values() {
        // Escaping is per UTF-8 byte, so non-ASCII values survive
        // serialization unchanged.
        let mut query = QueryParams::new();
        query.append("q", "中文");
        let s = query.to_query_string();
        assert_eq!(s, "q=%E4%B8%AD%E6%96%87");
        assert_eq!(QueryParams::parse(&s).get("q"), Some("中文"));
    }

    #[test]
    fn params_serialize_for_persistence() {
        let mut params = RouteParams::new();
        params.insert("id", "7");
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"id":"7"}"#);
    }
}
