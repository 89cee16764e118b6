use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::brand::BrandDetector;
use crate::error::RouteError;
use crate::intent::IntentClassifier;
use crate::metrics::units_to_micros;
use crate::recommend::Thresholds;

/// Rules document shipped with the binary.
pub const DEFAULT_RULES: &str = include_str!("../rules/default.toml");

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Editable rules document: brand patterns, ordered intent table, scope and
/// recommendation thresholds. Parsed from TOML, then compiled once into
/// [`CompiledRules`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub brand: BrandConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub window: WindowConfig,
    /// Intent categories in priority order. First match wins.
    #[serde(default, rename = "intent")]
    pub intents: Vec<IntentRuleConfig>,
}

fn default_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BrandConfig {
    /// Case-insensitive regular expressions. Any match marks a term as brand.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Campaign-name markers, matched case-insensitively as substrings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScopeConfig {
    #[serde(default = "default_nonbrand_marker")]
    pub nonbrand_campaign: String,
    #[serde(default = "default_brand_marker")]
    pub brand_campaign: String,
}

fn default_nonbrand_marker() -> String {
    "nonbrand".into()
}

fn default_brand_marker() -> String {
    "brand".into()
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            nonbrand_campaign: default_nonbrand_marker(),
            brand_campaign: default_brand_marker(),
        }
    }
}

impl ScopeConfig {
    pub fn is_nonbrand_campaign(&self, campaign: &str) -> bool {
        campaign
            .to_lowercase()
            .contains(&self.nonbrand_campaign.to_lowercase())
    }

    /// Brand campaigns carry the brand marker but not the non-brand one.
    pub fn is_brand_campaign(&self, campaign: &str) -> bool {
        let lowered = campaign.to_lowercase();
        lowered.contains(&self.brand_campaign.to_lowercase())
            && !lowered.contains(&self.nonbrand_campaign.to_lowercase())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThresholdConfig {
    /// Minimum spend (account currency units) for a mismatch to be recommended.
    #[serde(default = "default_min_cost")]
    pub min_cost: f64,
    /// Minimum clicks for a mismatch to be recommended.
    #[serde(default = "default_min_clicks")]
    pub min_clicks: u64,
}

fn default_min_cost() -> f64 {
    10.0
}

fn default_min_clicks() -> u64 {
    2
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_cost: default_min_cost(),
            min_clicks: default_min_clicks(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    60
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { days: default_days() }
    }
}

/// One intent category: a label and its ordered predicates.
/// `contains` entries are checked before `regex` entries regardless of which
/// key comes first in the document, so `explain` reports a matching needle
/// ahead of a matching regex.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntentRuleConfig {
    pub label: String,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RoutingConfig {
    pub fn from_toml(input: &str) -> Result<Self, RouteError> {
        let config: RoutingConfig =
            toml::from_str(input).map_err(|e| RouteError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded default rules document.
    pub fn builtin() -> Result<Self, RouteError> {
        Self::from_toml(DEFAULT_RULES)
    }

    pub fn to_toml(&self) -> Result<String, RouteError> {
        toml::to_string_pretty(self).map_err(|e| RouteError::Render(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.name.trim().is_empty() {
            return Err(RouteError::ConfigValidation("name must not be empty".into()));
        }

        if self.intents.is_empty() {
            return Err(RouteError::ConfigValidation(
                "at least one [[intent]] category is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (idx, rule) in self.intents.iter().enumerate() {
            if rule.label.trim().is_empty() {
                return Err(RouteError::ConfigValidation(format!(
                    "intent #{}: label must not be empty",
                    idx + 1
                )));
            }
            if !seen.insert(rule.label.as_str()) {
                return Err(RouteError::ConfigValidation(format!(
                    "intent '{}' is listed more than once",
                    rule.label
                )));
            }
            if rule.contains.is_empty() && rule.regex.is_empty() {
                return Err(RouteError::ConfigValidation(format!(
                    "intent '{}': needs at least one contains or regex pattern",
                    rule.label
                )));
            }
            // An empty substring would match every term.
            if rule.contains.iter().any(|p| p.is_empty()) {
                return Err(RouteError::ConfigValidation(format!(
                    "intent '{}': empty contains pattern",
                    rule.label
                )));
            }
        }

        if self.brand.patterns.iter().any(|p| p.is_empty()) {
            return Err(RouteError::ConfigValidation("brand: empty pattern".into()));
        }

        if self.scope.nonbrand_campaign.trim().is_empty()
            || self.scope.brand_campaign.trim().is_empty()
        {
            return Err(RouteError::ConfigValidation(
                "scope markers must not be empty".into(),
            ));
        }

        if !self.thresholds.min_cost.is_finite() || self.thresholds.min_cost < 0.0 {
            return Err(RouteError::ConfigValidation(format!(
                "thresholds.min_cost must be a non-negative number, got {}",
                self.thresholds.min_cost
            )));
        }

        if self.window.days == 0 {
            return Err(RouteError::InvalidWindow("window.days must be at least 1".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// Rules with every pattern compiled. Built once per run.
#[derive(Debug)]
pub struct CompiledRules {
    pub name: String,
    pub version: u32,
    pub brand: BrandDetector,
    pub intent: IntentClassifier,
    pub scope: ScopeConfig,
    pub thresholds: Thresholds,
    pub window_days: u32,
}

impl CompiledRules {
    pub fn compile(config: &RoutingConfig) -> Result<Self, RouteError> {
        config.validate()?;

        let brand = BrandDetector::compile(&config.brand.patterns)?;
        let intent = IntentClassifier::compile(&config.intents)?;

        log::debug!(
            "compiled rules '{}' v{}: {} brand pattern(s), {} intent categories",
            config.name,
            config.version,
            brand.len(),
            intent.len()
        );

        Ok(Self {
            name: config.name.clone(),
            version: config.version,
            brand,
            intent,
            scope: config.scope.clone(),
            thresholds: Thresholds {
                min_cost_micros: units_to_micros(config.thresholds.min_cost),
                min_clicks: config.thresholds.min_clicks,
            },
            window_days: config.window.days,
        })
    }

    pub fn from_toml(input: &str) -> Result<Self, RouteError> {
        Self::compile(&RoutingConfig::from_toml(input)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
