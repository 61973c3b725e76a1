//! Free-text response classification.
//!
//! The external CLI answers most operations with human-oriented screen
//! output. Each subcommand gets exactly one classifier built on
//! [`PatternSet`]: an ordered list of case-insensitive patterns where
//! the first match wins. An unmatched response is `None` - the explicit
//! "unknown" sentinel that callers log verbatim and treat as fatal
//! rather than guessing.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// An ordered, case-insensitive pattern table mapping output text to an
/// outcome value.
#[derive(Debug)]
pub struct PatternSet<T> {
    patterns: Vec<(Regex, T)>,
}

impl<T: Copy> PatternSet<T> {
    /// Build a pattern set from `(regex, outcome)` pairs.
    ///
    /// Patterns are declared in priority order; classification returns
    /// the outcome of the first pattern that matches. All patterns in
    /// this workspace are static string literals, so a malformed regex
    /// is a programming error.
    pub fn new(entries: &[(&str, T)]) -> Self {
        let patterns = entries
            .iter()
            .map(|(pattern, outcome)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .expect("classifier patterns are static literals");
                (regex, *outcome)
            })
            .collect();

        Self { patterns }
    }

    /// Classify output text, first match in declared order wins.
    ///
    /// `None` means no known pattern matched.
    pub fn classify(&self, text: &str) -> Option<T> {
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, outcome)| *outcome)
    }

    /// Classify and log unmatched output under the given operation name.
    pub fn classify_or_warn(&self, text: &str, operation: &str) -> Option<T> {
        let outcome = self.classify(text);
        if outcome.is_none() {
            warn!(%operation, output = %text, "CLI response matched no known pattern");
        }
        outcome
    }
}

/// Extract the integer following a marker line such as
/// `HIGHEST RETURN CODE WAS: 8` (case-insensitive).
pub fn parse_marked_integer(text: &str, marker: &str) -> Option<i64> {
    let pattern = format!(r"{}\s*(-?\d+)", regex::escape(marker));
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("marker patterns are static literals");

    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Probe {
        NotFound,
        Duplicate,
        Ok,
    }

    fn probe_set() -> PatternSet<Probe> {
        PatternSet::new(&[
            ("not found", Probe::NotFound),
            ("duplicate", Probe::Duplicate),
            ("install successful", Probe::Ok),
        ])
    }

    #[test]
    fn test_first_match_in_declared_order_wins() {
        // "not found" is declared before "duplicate", so it wins even
        // when both appear.
        let text = "resource NOT FOUND, possible duplicate";
        assert_eq!(probe_set().classify(text), Some(Probe::NotFound));
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert_eq!(
            probe_set().classify("Resource Not Found in region"),
            Some(Probe::NotFound)
        );
        assert_eq!(
            probe_set().classify("INSTALL SUCCESSFUL"),
            Some(Probe::Ok)
        );
    }

    #[test]
    fn test_unmatched_output_yields_none() {
        assert_eq!(probe_set().classify("something entirely different"), None);
    }

    #[test]
    fn test_parse_marked_integer() {
        let text = "DFHCSDUP output...\nHIGHEST RETURN CODE WAS: 4\nmore text";
        assert_eq!(parse_marked_integer(text, "HIGHEST RETURN CODE WAS:"), Some(4));
    }

    #[test]
    fn test_parse_marked_integer_case_insensitive() {
        let text = "highest return code was: 12";
        assert_eq!(
            parse_marked_integer(text, "HIGHEST RETURN CODE WAS:"),
            Some(12)
        );
    }

    #[test]
    fn test_parse_marked_integer_missing() {
        assert_eq!(parse_marked_integer("no marker here", "HIGHEST RETURN CODE WAS:"), None);
    }
}
