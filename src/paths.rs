//! Route path comparison.
//!
//! Paths are compared segment by segment after splitting on `/` and dropping
//! empty segments. A segment starting with [`WILDCARD_MARKER`] matches any
//! segment at the same position. No `.`/`..` normalization is performed.

use std::fmt;

/// Prefix that turns a path segment into a wildcard (`/products/:id`).
pub const WILDCARD_MARKER: char = ':';

/// An ordered sequence of route segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// The empty (root) path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        Self {
            segments: split_segments(path).map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::root();
        for segment in segments {
            path = path.join(segment.as_ref());
        }
        path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends `tail`, which may itself contain several `/`-separated segments.
    pub fn join(&self, tail: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(split_segments(tail).map(str::to_string));
        Self { segments }
    }

    /// Path without its last segment. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn comparable_eq(&self, other: &RoutePath) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| segments_match(a, b))
    }

    /// True when `self` is `ancestor` or nested below it.
    pub fn is_descendant_or_self(&self, ancestor: &RoutePath) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && ancestor
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| segments_match(a, b))
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

pub fn is_wildcard(segment: &str) -> bool {
    segment.starts_with(WILDCARD_MARKER)
}

/// Either side being a wildcard matches unconditionally.
pub fn segments_match(a: &str, b: &str) -> bool {
    is_wildcard(a) || is_wildcard(b) || a == b
}

/// Comparable equality over raw path strings.
pub fn comparable_equal(a: &str, b: &str) -> bool {
    RoutePath::parse(a).comparable_eq(&RoutePath::parse(b))
}

/// Descendant-or-self check over raw path strings.
pub fn is_descendant_or_self(candidate: &str, ancestor: &str) -> bool {
    RoutePath::parse(candidate).is_descendant_or_self(&RoutePath::parse(ancestor))
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparable_equal_reflexive() {
        for p in ["", "/", "home", "/products/1", "/products/:id/reviews"] {
            assert!(comparable_equal(p, p), "{p} should equal itself");
        }
    }

    #[test]
    fn test_wildcard_matches_either_side() {
        assert!(comparable_equal("/products/:id", "/products/7"));
        assert!(comparable_equal("/products/7", "/products/:id"));
        assert!(comparable_equal("/foo/:id/bar", "/foo/:index/bar"));
        assert!(!comparable_equal("/foo/:id/bar", "/foo/1/baz"));
    }

    #[test]
    fn test_segment_count_mismatch() {
        assert!(!comparable_equal("/products", "/products/1"));
        assert!(!comparable_equal("/:a/:b", "/:a"));
        assert!(!comparable_equal("", "home"));
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert!(comparable_equal("//home///sub/", "home/sub"));
        assert_eq!(RoutePath::parse("/a//b/").segments(), &["a", "b"]);
    }

    #[test]
    fn test_descendant_or_self() {
        assert!(is_descendant_or_self("/foo/bar/baz", "/foo/bar"));
        assert!(is_descendant_or_self("/foo/bar/baz", "/foo/bar/baz"));
        assert!(!is_descendant_or_self("/foo/bar", "/foo/bar/baz"));
        assert!(is_descendant_or_self("/foo/1/edit", "/foo/:id"));
        assert!(is_descendant_or_self("/anything", ""));
        assert!(!is_descendant_or_self("/foo/bar", "/baz"));
    }

    #[test]
    fn test_join_and_display() {
        let p = RoutePath::root().join("products").join("/1/");
        assert_eq!(p.to_string(), "products/1");
        assert_eq!(p.parent().to_string(), "products");
        assert_eq!(RoutePath::from_segments(["a", "b/c"]).len(), 3);
    }
}
