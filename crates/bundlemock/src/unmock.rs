//! Unmock Pattern Matcher
//!
//! With automocking on, every module is mocked unless its resolved path
//! matches one of the configured unmock patterns. Patterns are compiled once
//! per configuration; an invalid pattern is a configuration error raised at
//! compile time, before any module is resolved.

use crate::result::{BundleMockError, BundleMockResult};
use regex::Regex;

/// Compiled unmock path patterns, in configuration order
#[derive(Debug, Clone, Default)]
pub struct UnmockMatcher {
    patterns: Vec<Regex>,
}

impl UnmockMatcher {
    /// Compile patterns
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid pattern.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> BundleMockResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|e| {
                    BundleMockError::configuration(format!(
                        "Invalid unmock pattern '{pattern}': {e}"
                    ))
                })
            })
            .collect::<BundleMockResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Matcher with no patterns
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether any pattern matches `path`
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    /// Source of the first pattern matching `path`
    #[must_use]
    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(path))
            .map(Regex::as_str)
    }

    /// Pattern sources
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether there are no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
