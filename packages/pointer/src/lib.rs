//! # Editron Pointer
//!
//! Document locations for the form editor.
//!
//! A pointer is a slash-delimited path into the edited JSON document, written
//! with a leading `#` (`#/items/2/name`). Segments follow JSON-pointer escaping
//! (`~0` for `~`, `~1` for `/`), so a segment never contains a raw separator and
//! every prefix test can be answered on the string alone.
//!
//! Pointers are immutable values. Renumbering an array element means building a
//! new pointer with [`Pointer::rebase`], never editing one in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ROOT: &str = "#";
const SEPARATOR: char = '/';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("Invalid pointer '{0}': expected '#', '#/…' or '/…'")]
    Invalid(String),
}

/// Location of a node within the edited document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pointer(String);

impl Pointer {
    /// The document root (`#`)
    pub fn root() -> Self {
        Pointer(ROOT.to_string())
    }

    /// Parse a pointer from `#`, `#/a/b`, `/a/b` or the empty string
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        let path = input.strip_prefix(ROOT).unwrap_or(input);
        if path.is_empty() {
            return Ok(Self::root());
        }
        if !path.starts_with(SEPARATOR) {
            return Err(PointerError::Invalid(input.to_string()));
        }
        Ok(Pointer(format!("{ROOT}{path}")))
    }

    /// Build a pointer from unescaped segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .fold(Self::root(), |pointer, segment| pointer.join(segment.as_ref()))
    }

    /// Append a child segment (property name or array index)
    pub fn join(&self, segment: impl fmt::Display) -> Self {
        let segment = segment.to_string();
        Pointer(format!("{}{SEPARATOR}{}", self.0, escape(&segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Unescaped segments, root first
    pub fn segments(&self) -> Vec<String> {
        self.raw_segments().map(unescape).collect()
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.raw_segments().count()
    }

    /// Last segment, unescaped
    pub fn last_segment(&self) -> Option<String> {
        self.raw_segments().last().map(unescape)
    }

    /// First segment below the root; used as the page of a location
    pub fn first_segment(&self) -> Option<String> {
        self.raw_segments().next().map(unescape)
    }

    /// Trailing array index, if the last segment is numeric
    pub fn last_index(&self) -> Option<usize> {
        self.raw_segments().last().and_then(|s| s.parse().ok())
    }

    pub fn parent(&self) -> Option<Pointer> {
        if self.is_root() {
            return None;
        }
        let cut = self.0.rfind(SEPARATOR)?;
        Some(Pointer(self.0[..cut].to_string()))
    }

    /// Proper ancestors ordered from nearest (parent) to furthest (root)
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Whether `other` is this pointer or lies below it.
    ///
    /// The match is segment-aligned: `#/list/1` contains `#/list/1/name`
    /// but not `#/list/10`.
    pub fn contains(&self, other: &Pointer) -> bool {
        if self.is_root() {
            return true;
        }
        match other.0.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
            None => false,
        }
    }

    /// Whether this pointer lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &Pointer) -> bool {
        self != ancestor && ancestor.contains(self)
    }

    /// Replace the `from` prefix of this pointer with `to`.
    ///
    /// Returns `None` when this pointer is not within `from`.
    pub fn rebase(&self, from: &Pointer, to: &Pointer) -> Option<Pointer> {
        if !from.contains(self) {
            return None;
        }
        let rest = if from.is_root() {
            &self.0[ROOT.len()..]
        } else {
            &self.0[from.0.len()..]
        };
        Some(Pointer(format!("{}{rest}", to.0)))
    }

    /// RFC 6901 form, as accepted by `serde_json::Value::pointer`
    pub fn to_json_pointer(&self) -> &str {
        &self.0[ROOT.len()..]
    }

    /// DOM id for the editor rendered at this location
    pub fn to_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0)
    }

    fn raw_segments(&self) -> impl Iterator<Item = &str> {
        self.0[ROOT.len()..].split(SEPARATOR).skip(1)
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pointer {
    type Error = PointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Pointer {
    type Error = PointerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Pointer> for String {
    fn from(pointer: Pointer) -> Self {
        pointer.0
    }
}

impl AsRef<str> for Pointer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Iterator over proper ancestors, nearest first
pub struct Ancestors {
    next: Option<Pointer>,
}

impl Iterator for Ancestors {
    type Item = Pointer;

    fn next(&mut self) -> Option<Pointer> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert!(p("#").is_root());
        assert!(p("").is_root());
        assert_eq!(p("/a/b"), p("#/a/b"));
        assert_eq!(p("#/a/b").as_str(), "#/a/b");
        assert!(Pointer::parse("a/b").is_err());
    }

    #[test]
    fn test_join_escapes_segments() {
        let pointer = Pointer::root().join("a/b").join("c~d");
        assert_eq!(pointer.as_str(), "#/a~1b/c~0d");
        assert_eq!(pointer.segments(), vec!["a/b".to_string(), "c~d".to_string()]);
        assert_eq!(Pointer::from_segments(["a/b", "c~d"]), pointer);
    }

    #[test]
    fn test_parent_and_ancestors_nearest_first() {
        let pointer = p("#/list/2/name");
        assert_eq!(pointer.parent(), Some(p("#/list/2")));
        let ancestors: Vec<_> = pointer.ancestors().collect();
        assert_eq!(ancestors, vec![p("#/list/2"), p("#/list"), p("#")]);
        assert_eq!(Pointer::root().parent(), None);
        assert_eq!(pointer.depth(), 3);
    }

    #[test]
    fn test_contains_respects_segment_boundary() {
        assert!(p("#/list/1").contains(&p("#/list/1")));
        assert!(p("#/list/1").contains(&p("#/list/1/name")));
        assert!(!p("#/list/1").contains(&p("#/list/10")));
        assert!(p("#").contains(&p("#/anything")));
        assert!(p("#/list/1/name").is_descendant_of(&p("#/list")));
        assert!(!p("#/list").is_descendant_of(&p("#/list")));
    }

    #[test]
    fn test_rebase_rewrites_prefix_only() {
        let focused = p("#/list/1/name");
        assert_eq!(
            focused.rebase(&p("#/list/1"), &p("#/list/0")),
            Some(p("#/list/0/name"))
        );
        assert_eq!(focused.rebase(&p("#/list/10"), &p("#/list/0")), None);
        assert_eq!(p("#/a").rebase(&p("#"), &p("#/root")), Some(p("#/root/a")));
    }

    #[test]
    fn test_indices_and_pages() {
        assert_eq!(p("#/list/3").last_index(), Some(3));
        assert_eq!(p("#/list/name").last_index(), None);
        assert_eq!(p("#/page/field").first_segment(), Some("page".to_string()));
        assert_eq!(p("#/a/b").to_json_pointer(), "/a/b");
        assert_eq!(p("#").to_json_pointer(), "");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&p("#/a/0")).unwrap();
        assert_eq!(json, "\"#/a/0\"");
        let back: Pointer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("#/a/0"));
        assert!(serde_json::from_str::<Pointer>("\"nope\"").is_err());
    }
}
