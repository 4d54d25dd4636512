//! Regex name filters for groups and tests.

use regex::{Regex, RegexBuilder};

/// Case-insensitive name filter. An empty pattern matches everything.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    regex: Option<Regex>,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Self::all());
        }
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn all() -> Self {
        Self { regex: None }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_none_or(|regex| regex.is_match(name))
    }

    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_matches_all() {
        let filter = NameFilter::new("").unwrap();
        assert!(filter.matches(""));
        assert!(filter.matches("anything"));
        assert_eq!(filter.pattern(), None);
    }

    #[test]
    fn test_match_is_case_insensitive_and_unanchored() {
        let filter = NameFilter::new("Math").unwrap();
        assert!(filter.matches("advanced math adds"));
        assert!(!filter.matches("strings"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(NameFilter::new("(").is_err());
    }
}
