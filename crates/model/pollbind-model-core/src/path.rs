//! ModelPath parsing and formatting.
//!
//! Grammar: `segment(.segment)*`
//! - every segment is non-empty and contains no whitespace
//!   Examples:
//!   "user" -> ["user"]
//!   "user.name" -> ["user", "name"]
//!   "todos.items.0" -> ["todos", "items", "0"]
//!
//! A path only names a location; resolving it against a tree is the job of
//! [`crate::StateTree::resolve`].

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelPath {
    segments: Vec<String>,
}

impl ModelPath {
    /// Parse a dotted path according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Err(ModelError::invalid_path(s, "empty path"));
        }
        let mut segments = Vec::new();
        for seg in s.split('.') {
            if seg.is_empty() {
                return Err(ModelError::invalid_path(s, "empty segment"));
            }
            if seg.chars().any(char::is_whitespace) {
                return Err(ModelError::invalid_path(s, "segment contains whitespace"));
            }
            segments.push(seg.to_string());
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_str())
    }

    /// Number of segments; always at least one.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Segments before the last one, and the last one.
    pub(crate) fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            // parse() never produces an empty path
            None => (&[], ""),
        }
    }

    /// Dotted prefix made of the first `n` segments (used in error messages).
    pub(crate) fn prefix(&self, n: usize) -> String {
        self.segments[..n.min(self.segments.len())].join(".")
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for ModelPath {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelPath::parse(s)
    }
}

impl TryFrom<&str> for ModelPath {
    type Error = ModelError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ModelPath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for ModelPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModelPath {
    fn deserialize<D>(deserializer: D) -> Result<ModelPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ModelPath::parse(&s).map_err(de::Error::custom)
    }
}
