//! Key type
//!
//! Keys are slash-separated paths such as `/users/alice/profile`. The stored
//! byte form is the UTF-8 encoding of the canonical path, so ordering and
//! prefix matching happen on those bytes.

use std::fmt;

/// A hierarchical key with a canonical path representation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Build a key from any path-like string, cleaning it
    ///
    /// - always starts with `/`, never ends with one (except the root)
    /// - empty segments and `.` are dropped, `..` removes the previous segment
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.as_ref().split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        let mut clean = String::with_capacity(path.as_ref().len() + 1);
        for segment in &segments {
            clean.push('/');
            clean.push_str(segment);
        }
        if clean.is_empty() {
            clean.push('/');
        }
        Self(clean)
    }

    /// Adopt a string as-is, without cleaning
    ///
    /// Used for keys read back from the store, which were cleaned on write.
    pub fn raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The root key `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte encoding used by the store
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Path segments, e.g. `/a/b` → `["a", "b"]`
    pub fn namespaces(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Last path segment (empty for the root)
    pub fn name(&self) -> &str {
        self.namespaces().last().copied().unwrap_or("")
    }

    /// Key one level up; the root is its own parent
    pub fn parent(&self) -> Key {
        match self.0.rfind('/') {
            Some(0) | None => Key::root(),
            Some(idx) => Key(self.0[..idx].to_string()),
        }
    }

    /// Append a path below this key
    pub fn child(&self, path: impl AsRef<str>) -> Key {
        Key::new(format!("{}/{}", self.0, path.as_ref()))
    }

    /// True if `other` lies strictly below this key
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        if self.0 == "/" {
            return other.0 != "/";
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// True if this key lies strictly below `other`
    pub fn is_descendant_of(&self, other: &Key) -> bool {
        other.is_ancestor_of(self)
    }

    /// True for single-segment keys such as `/a`
    pub fn is_top_level(&self) -> bool {
        self.namespaces().len() == 1
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::root()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(path: &str) -> Self {
        Key::new(path)
    }
}

impl From<String> for Key {
    fn from(path: String) -> Self {
        Key::new(path)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
