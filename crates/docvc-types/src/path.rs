//! Locators into a [`Value`](crate::Value) tree.
//!
//! A path is a sequence of map keys and sequence indices. Its display form is
//! `lineItems[2].amount`; the root path displays as `$`. Paths order
//! lexicographically by segment, so a path always sorts before every path it
//! is a prefix of.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One step of a [`ValuePath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A key into a map.
    Key(String),
    /// A position in a sequence.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A locator into a document tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    /// The empty path, addressing the whole document.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from explicit segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// A single-key path (`total`).
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path one level up, or `None` for the root.
    pub fn parent(&self) -> Option<ValuePath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// A new path with a map key appended.
    pub fn child_key(&self, key: impl Into<String>) -> ValuePath {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// A new path with a sequence index appended.
    pub fn child_index(&self, index: usize) -> ValuePath {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns `true` if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &ValuePath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns `true` if either path contains the other.
    pub fn overlaps(&self, other: &ValuePath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i > 0 => write!(f, ".{key}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ValuePath {
    type Err = TypeError;

    /// Parse the display form. Keys containing `.`, `[` or `]` cannot be
    /// expressed this way; build those paths with [`ValuePath::from_segments`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "$" {
            return Ok(Self::root());
        }

        let invalid = |reason: &str| TypeError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();
        let mut expect_key = true;

        while let Some(&ch) = chars.peek() {
            match ch {
                '[' => {
                    chars.next();
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("non-digit inside index")),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("empty index"))?;
                    segments.push(PathSegment::Index(index));
                    expect_key = false;
                }
                '.' => {
                    if segments.is_empty() {
                        return Err(invalid("leading '.'"));
                    }
                    chars.next();
                    expect_key = true;
                    if matches!(chars.peek(), None | Some('.') | Some('[')) {
                        return Err(invalid("empty key"));
                    }
                }
                ']' => return Err(invalid("unmatched ']'")),
                _ => {
                    if !expect_key {
                        return Err(invalid("missing '.' before key"));
                    }
                    let mut key = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '.' || c == '[' || c == ']' {
                            break;
                        }
                        key.push(c);
                        chars.next();
                    }
                    segments.push(PathSegment::Key(key));
                    expect_key = false;
                }
            }
        }

        Ok(Self(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_as_dollar() {
        assert_eq!(ValuePath::root().to_string(), "$");
        assert!(ValuePath::root().is_root());
    }

    #[test]
    fn display_mixes_keys_and_indices() {
        let path = ValuePath::key("lineItems").child_index(2).child_key("amount");
        assert_eq!(path.to_string(), "lineItems[2].amount");
    }

    #[test]
    fn parse_roundtrip() {
        for text in ["total", "a.b.c", "lineItems[2].amount", "[0]", "[0][1].x", "$"] {
            let path: ValuePath = text.parse().unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("a..b".parse::<ValuePath>().is_err());
        assert!(".a".parse::<ValuePath>().is_err());
        assert!("a[x]".parse::<ValuePath>().is_err());
        assert!("a[1".parse::<ValuePath>().is_err());
        assert!("a[1]b".parse::<ValuePath>().is_err());
        assert!("a]".parse::<ValuePath>().is_err());
    }

    #[test]
    fn prefix_sorts_first() {
        let parent = ValuePath::key("a");
        let child = parent.child_key("b");
        assert!(parent < child);
        assert!(child.starts_with(&parent));
        assert!(parent.overlaps(&child));
        assert!(!child.overlaps(&ValuePath::key("b")));
    }

    #[test]
    fn indices_sort_numerically() {
        let two = ValuePath::root().child_index(2);
        let ten = ValuePath::root().child_index(10);
        assert!(two < ten);
    }

    #[test]
    fn parent_of_root_is_none() {
        assert!(ValuePath::root().parent().is_none());
        assert_eq!(
            ValuePath::key("a").child_index(1).parent(),
            Some(ValuePath::key("a"))
        );
    }

    #[test]
    fn serializes_as_segment_list() {
        let path = ValuePath::key("items").child_index(3);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["items",3]"#);
        let parsed: ValuePath = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, path);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = PathSegment> {
            prop_oneof![
                "[a-zA-Z_][a-zA-Z0-9_-]{0,6}".prop_map(PathSegment::Key),
                (0usize..50).prop_map(PathSegment::Index),
            ]
        }

        proptest! {
            #[test]
            fn display_then_parse_is_identity(segments in proptest::collection::vec(segment(), 0..6)) {
                let path = ValuePath::from_segments(segments);
                let parsed: ValuePath = path.to_string().parse().unwrap();
                prop_assert_eq!(parsed, path);
            }
        }
    }
}
