//! Pulls Jira issue keys out of merge request titles.

use std::fmt;

use regex::Regex;

/// A Jira issue key such as `PROJ-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueReference(String);

impl IssueReference {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for IssueReference {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Ordered set of compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct IssueExtractor {
    patterns: Vec<Regex>,
}

impl IssueExtractor {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All references in pattern order, then match order.
    ///
    /// The title is upper-cased first. Results are neither sorted nor
    /// deduplicated. Every match contributes one reference: group 1 when the
    /// pattern has that group and it took part, otherwise the whole match.
    pub fn extract(&self, title: &str) -> Vec<IssueReference> {
        let title = title.to_uppercase();
        let mut out = Vec::new();

        for re in &self.patterns {
            out.extend(
                re.captures_iter(&title)
                    .filter_map(|c| c.get(1).or_else(|| c.get(0)))
                    .map(|m| IssueReference::new(m.as_str())),
            );
        }

        out
    }
}
