// ── Commission-eligible source matching ──
//
// One ordered list of rules, evaluated front to back: exact names first,
// then substring aliases. Comparison is case-insensitive throughout.

use serde::Serialize;

/// Sales channels that earn commission out of the box.
pub const DEFAULT_EXACT_SOURCES: &[&str] = &[
    "Google ADS",
    "Google SEO Organico",
    "Social Media Organico",
    "Facebook ADS",
];

/// Fragments that identify the many spellings of the property's own website.
pub const DEFAULT_SOURCE_ALIASES: &[&str] = &["website", "booking engine"];

/// A single matching rule. Patterns are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum SourceRule {
    Exact(String),
    Contains(String),
}

impl SourceRule {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Exact(name) => lowered == name,
            Self::Contains(fragment) => lowered.contains(fragment.as_str()),
        }
    }
}

/// Ordered allow-list deciding which reservations are commission candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMatcher {
    rules: Vec<SourceRule>,
}

impl Default for SourceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_SOURCES, DEFAULT_SOURCE_ALIASES)
    }
}

impl SourceMatcher {
    /// Build from exact names and substring aliases. Blank entries are ignored.
    pub fn new<E, A>(exact: &[E], aliases: &[A]) -> Self
    where
        E: AsRef<str>,
        A: AsRef<str>,
    {
        let normalize = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
        };

        let exact = exact
            .iter()
            .filter_map(|s| normalize(s.as_ref()))
            .map(SourceRule::Exact);
        let aliases = aliases
            .iter()
            .filter_map(|s| normalize(s.as_ref()))
            .map(SourceRule::Contains);

        Self {
            rules: exact.chain(aliases).collect(),
        }
    }

    pub fn rules(&self) -> &[SourceRule] {
        &self.rules
    }

    /// First rule that accepts `source`, if any.
    pub fn matching_rule(&self, source: &str) -> Option<&SourceRule> {
        let lowered = source.trim().to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    pub fn is_candidate(&self, source: &str) -> bool {
        self.matching_rule(source).is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn website_booking_engine_is_a_candidate() {
        let matcher = SourceMatcher::default();
        assert!(matcher.is_candidate("Website/Booking Engine"));
        assert!(matcher.is_candidate("Booking Engine (mobile)"));
    }

    #[test]
    fn direct_is_not_a_candidate() {
        assert!(!SourceMatcher::default().is_candidate("Direct"));
    }

    #[test]
    fn exact_names_ignore_case_but_not_extra_words() {
        let matcher = SourceMatcher::default();
        assert!(matcher.is_candidate("google ads"));
        assert!(matcher.is_candidate("  FACEBOOK ADS "));
        assert!(!matcher.is_candidate("Google ADS Campaign"));
    }

    #[test]
    fn exact_rules_are_evaluated_before_aliases() {
        let matcher = SourceMatcher::new(&["Website"], &["web"]);
        assert_eq!(
            matcher.matching_rule("WEBSITE"),
            Some(&SourceRule::Exact("website".into()))
        );
        assert_eq!(
            matcher.matching_rule("Webshop"),
            Some(&SourceRule::Contains("web".into()))
        );
    }

    #[test]
    fn blank_patterns_are_dropped() {
        let matcher = SourceMatcher::new(&["", "  "], &[" "]);
        assert!(matcher.rules().is_empty());
        assert!(!matcher.is_candidate(""));
    }
}
