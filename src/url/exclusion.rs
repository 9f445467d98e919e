//! Exclusion-list matching
//!
//! URLs whose path matches one of these substring patterns are recorded as
//! graph nodes but never fetched, so binary assets stay leaves.

/// Substring patterns that suppress fetching of matched URL paths.
#[derive(Debug, Clone)]
pub struct ExclusionList {
    patterns: Vec<String>,
}

impl ExclusionList {
    /// Creates an exclusion list from explicit patterns.
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Returns true if the path matches any pattern.
    ///
    /// Patterns are plain substrings, matching the whole path, not just the
    /// extension: `/files.pdf/index` is excluded by `.pdf`.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| path.contains(p.as_str()))
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::new(
            [".pdf", ".xml", ".jpg", ".png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}
