//! Intent classifier: an explicit, ordered rule table.
//!
//! Categories are tried in table order and the first one with a matching
//! predicate wins. Overlapping categories therefore resolve by position,
//! never by "best" match. Inside a category the `contains` needles are tried
//! first, then the regexes, each list in its own order; `explain` reports the
//! first predicate that fires under that order.

use regex::{Regex, RegexBuilder};

use crate::config::IntentRuleConfig;
use crate::error::RouteError;

/// Rendered in reports when no category matches.
pub const UNCLEAR: &str = "UNCLEAR";

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Lowercase substring.
    Contains(String),
    /// Case-insensitive regular expression.
    Regex(Regex),
}

impl Matcher {
    /// `lowered` must already be lowercase.
    fn is_match(&self, lowered: &str) -> bool {
        match self {
            Self::Contains(needle) => lowered.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(lowered),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Contains(needle) => format!("contains \"{needle}\""),
            Self::Regex(re) => format!("regex /{}/", re.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntentCategory {
    pub label: String,
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    categories: Vec<IntentCategory>,
}

impl IntentClassifier {
    pub fn compile(rules: &[IntentRuleConfig]) -> Result<Self, RouteError> {
        let mut categories = Vec::with_capacity(rules.len());

        for rule in rules {
            let mut matchers = Vec::with_capacity(rule.contains.len() + rule.regex.len());
            for needle in &rule.contains {
                matchers.push(Matcher::Contains(needle.to_lowercase()));
            }
            for pattern in &rule.regex {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RouteError::InvalidPattern {
                        rule: rule.label.clone(),
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                matchers.push(Matcher::Regex(re));
            }
            categories.push(IntentCategory {
                label: rule.label.clone(),
                matchers,
            });
        }

        Ok(Self { categories })
    }

    /// Highest-priority matching category, or `None` when the term is unclear.
    pub fn classify(&self, text: &str) -> Option<&str> {
        self.explain(text).map(|(label, _)| label)
    }

    /// Like [`classify`](Self::classify) but also returns the predicate that fired.
    pub fn explain(&self, text: &str) -> Option<(&str, &Matcher)> {
        let lowered = text.to_lowercase();
        self.categories.iter().find_map(|cat| {
            cat.matchers
                .iter()
                .find(|m| m.is_match(&lowered))
                .map(|m| (cat.label.as_str(), m))
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.label.as_str())
    }

    pub fn categories(&self) -> &[IntentCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
