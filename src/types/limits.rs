use serde::Deserialize;

/// Default bound on tree height and parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Resource limits applied by every operation that walks a tree.
///
/// Building, evaluating, serializing and combining all refuse trees taller than
/// `max_depth` with [`RuleError::TooDeeplyNested`](super::RuleError::TooDeeplyNested).
/// Parenthesis nesting in rule text counts against the same bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Load limits from a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the document is not valid JSON or a key
    /// has the wrong type.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
