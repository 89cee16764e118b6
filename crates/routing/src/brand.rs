use regex::{Regex, RegexBuilder};

use crate::error::RouteError;

/// Flags search terms that mention the advertiser's brand.
#[derive(Debug, Clone, Default)]
pub struct BrandDetector {
    patterns: Vec<Regex>,
}

impl BrandDetector {
    /// Compile every pattern case-insensitively. A bad pattern is a
    /// configuration error and aborts startup.
    pub fn compile(patterns: &[String]) -> Result<Self, RouteError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RouteError::InvalidPattern {
                        rule: "brand".into(),
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_brand(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    /// The first pattern that matches, for explanations.
    pub fn matching_pattern(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(text))
            .map(|re| re.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
