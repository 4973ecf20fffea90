//! Argument Paths

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of an argument inside a mutation's arguments, e.g.
/// `["input", "isPinned"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgumentPath(Vec<String>);

impl ArgumentPath {
    /// Build a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path of a field directly under `input`.
    pub fn input(field: &str) -> Self {
        Self::new(["input", field])
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Extend the path with one more segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for ArgumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_array() {
        let path = ArgumentPath::input("memberId");
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!(["input", "memberId"])
        );
        assert_eq!(path.to_string(), "input.memberId");
    }

    #[test]
    fn test_child() {
        let path = ArgumentPath::new(["input"]).child("chatId");
        assert_eq!(path, ArgumentPath::input("chatId"));
    }
}
