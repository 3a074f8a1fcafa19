//! Entry name filtering.

use glob::{MatchOptions, Pattern};

use crate::{Error, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

enum FilterType {
    Substring(String),
    Glob(Pattern),
}

/// A compiled entry name filter.
///
/// Patterns containing `*`, `?` or `[` are glob patterns matched against the
/// whole name; anything else matches anywhere in the name. Matching is
/// case-insensitive and treats `/` and `\` as the same separator.
pub struct EntryFilter {
    pattern: String,
    filter: FilterType,
}

impl EntryFilter {
    /// Compile `pattern`, failing with [`Error::InvalidFilter`] on malformed
    /// glob syntax.
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = pattern.replace('\\', "/");

        let filter = if normalized.contains(['*', '?', '[']) {
            let glob = Pattern::new(&normalized).map_err(|source| Error::InvalidFilter {
                pattern: pattern.to_string(),
                source,
            })?;
            FilterType::Glob(glob)
        } else {
            FilterType::Substring(normalized.to_lowercase())
        };

        Ok(Self {
            pattern: pattern.to_string(),
            filter,
        })
    }

    /// The pattern as given.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.replace('\\', "/");
        match &self.filter {
            FilterType::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            FilterType::Glob(glob) => glob.matches_with(&name, MATCH_OPTIONS),
        }
    }
}

impl std::fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntryFilter").field(&self.pattern).finish()
    }
}
