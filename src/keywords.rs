use itertools::Itertools;
use std::fmt;

/// Lowercase keywords a post title is matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Parses a comma separated list. Blank entries and repeats are dropped.
    pub fn parse(raw: &str) -> Self {
        let keywords = raw
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .unique()
            .collect();
        KeywordSet { keywords }
    }

    pub fn matches(&self, title: &str) -> bool {
        !self.matched(title).is_empty()
    }

    /// Keywords contained in `title`, compared case-insensitively.
    pub fn matched(&self, title: &str) -> Vec<&str> {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| title.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }
}

impl fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.keywords.iter().join(", "))
    }
}
