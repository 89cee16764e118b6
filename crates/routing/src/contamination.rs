//! Brand / non-brand cross-contamination and the combined negative-keyword
//! recommendation list.

use serde::Serialize;

use crate::config::ScopeConfig;
use crate::model::SearchTermRecord;
use crate::recommend::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContaminationKind {
    BrandInNonbrand,
    NonbrandInBrand,
}

impl ContaminationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BrandInNonbrand => "BRAND_IN_NONBRAND",
            Self::NonbrandInBrand => "NONBRAND_IN_BRAND",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Self::BrandInNonbrand => Priority::High,
            Self::NonbrandInBrand => Priority::Medium,
        }
    }
}

/// Ordered most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegativeMatchType {
    Exact,
    Phrase,
}

impl NegativeMatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "EXACT",
            Self::Phrase => "PHRASE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegativeLevel {
    Campaign,
    AdGroup,
}

impl NegativeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Campaign => "CAMPAIGN",
            Self::AdGroup => "AD_GROUP",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(ContaminationKind, Priority, NegativeMatchType, NegativeLevel);

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ContaminationIssue {
    pub kind: ContaminationKind,
    pub priority: Priority,
    pub search_term: String,
    pub campaign: String,
    pub ad_group: String,
    pub clicks: u64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub recommendation: String,
}

/// Brand terms served by non-brand campaigns, and the reverse.
pub fn find_contamination(terms: &[SearchTermRecord], scope: &ScopeConfig) -> Vec<ContaminationIssue> {
    let mut issues = Vec::new();

    for term in terms {
        let kind = if scope.is_nonbrand_campaign(&term.campaign) && term.is_brand {
            ContaminationKind::BrandInNonbrand
        } else if scope.is_brand_campaign(&term.campaign) && !term.is_brand {
            ContaminationKind::NonbrandInBrand
        } else {
            continue;
        };

        let match_type = match kind {
            ContaminationKind::BrandInNonbrand => NegativeMatchType::Exact,
            ContaminationKind::NonbrandInBrand => NegativeMatchType::Phrase,
        };

        issues.push(ContaminationIssue {
            kind,
            priority: kind.priority(),
            search_term: term.text.clone(),
            campaign: term.campaign.clone(),
            ad_group: term.ad_group.clone(),
            clicks: term.clicks,
            cost_micros: term.cost_micros,
            conversions: term.conversions,
            recommendation: format!(
                "Add [{}] as {match_type} negative to {} campaign",
                term.text, term.campaign
            ),
        });
    }

    log::debug!("found {} cross-contamination issue(s)", issues.len());
    issues
}

// ---------------------------------------------------------------------------
// Negation list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NegativeRecommendation {
    pub priority: Priority,
    pub negative_keyword: String,
    pub match_type: NegativeMatchType,
    pub level: NegativeLevel,
    pub target_campaign: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ad_group: Option<String>,
    pub reason: String,
    pub wasted_spend_micros: i64,
    pub clicks: u64,
}

/// HIGH and MEDIUM from contamination, LOW from routing mismatches.
/// Sorted by priority, then wasted spend descending, then keyword.
pub fn build_negations(
    issues: &[ContaminationIssue],
    mismatches: &[Recommendation],
) -> Vec<NegativeRecommendation> {
    let mut out: Vec<NegativeRecommendation> = issues
        .iter()
        .map(|issue| {
            let (match_type, reason) = match issue.kind {
                ContaminationKind::BrandInNonbrand => (
                    NegativeMatchType::Exact,
                    "Brand term appearing in non-brand campaign",
                ),
                ContaminationKind::NonbrandInBrand => (
                    NegativeMatchType::Phrase,
                    "Non-brand term appearing in brand campaign",
                ),
            };
            NegativeRecommendation {
                priority: issue.priority,
                negative_keyword: issue.search_term.clone(),
                match_type,
                level: NegativeLevel::Campaign,
                target_campaign: issue.campaign.clone(),
                target_ad_group: None,
                reason: reason.to_string(),
                wasted_spend_micros: issue.cost_micros,
                clicks: issue.clicks,
            }
        })
        .collect();

    out.extend(mismatches.iter().map(|rec| NegativeRecommendation {
        priority: Priority::Low,
        negative_keyword: rec.search_term.clone(),
        match_type: NegativeMatchType::Phrase,
        level: NegativeLevel::AdGroup,
        target_campaign: rec.campaign.clone(),
        target_ad_group: Some(rec.current_ad_group.clone()),
        reason: format!(
            "Should route to {} instead of {}",
            rec.expected_ad_group, rec.current_ad_group
        ),
        wasted_spend_micros: rec.cost_micros,
        clicks: rec.clicks,
    }));

    out.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.wasted_spend_micros.cmp(&a.wasted_spend_micros))
            .then_with(|| a.negative_keyword.cmp(&b.negative_keyword))
    });
    out
}
