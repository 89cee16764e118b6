use chrono::NaiveDate;
use serde::Serialize;

use crate::contamination::{ContaminationIssue, NegativeRecommendation};
use crate::error::RouteError;
use crate::metrics::Metric;
use crate::negatives::NegativeKeywordSet;
use crate::recommend::Recommendation;
use crate::window::ReportWindow;

pub use crate::negatives::BlockHit;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row of the search-term performance report.
#[derive(Debug, Clone, Serialize)]
pub struct SearchTermRecord {
    pub text: String,
    pub campaign: String,
    pub ad_group: String,
    pub impressions: u64,
    pub clicks: u64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub is_brand: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_value_micros: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Pre-loaded data for one run.
pub struct RouteInput {
    pub terms: Vec<SearchTermRecord>,
    pub negatives: NegativeKeywordSet,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingStatus {
    CorrectByIntent,
    CorrectByNegative,
    PotentialMismatch,
    NoClearIntent,
}

impl RoutingStatus {
    /// Report order.
    pub const ALL: [RoutingStatus; 4] = [
        Self::CorrectByIntent,
        Self::CorrectByNegative,
        Self::PotentialMismatch,
        Self::NoClearIntent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CorrectByIntent => "CORRECT_BY_INTENT",
            Self::CorrectByNegative => "CORRECT_BY_NEGATIVE",
            Self::PotentialMismatch => "POTENTIAL_MISMATCH",
            Self::NoClearIntent => "NO_CLEAR_INTENT",
        }
    }
}

impl std::fmt::Display for RoutingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one term. Derived, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub term: SearchTermRecord,
    /// Intent category, `None` when unclear.
    pub expected_ad_group: Option<String>,
    pub actual_ad_group: String,
    pub blocked_from: Vec<BlockHit>,
    /// Negative in the serving ad group that matches the term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_blocked_by: Option<String>,
    pub status: RoutingStatus,
    pub reason: String,
}

impl RoutingDecision {
    /// Distinct blocked ad groups, joined for CSV/console.
    pub fn blocked_ad_groups(&self) -> String {
        let mut groups: Vec<&str> = Vec::new();
        for hit in &self.blocked_from {
            if !groups.contains(&hit.ad_group.as_str()) {
                groups.push(&hit.ad_group);
            }
        }
        groups.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub status: RoutingStatus,
    pub count: usize,
    pub pct: f64,
    pub cost_micros: i64,
    pub clicks: u64,
    pub conversions: f64,
    pub cpa: Metric,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdGroupStats {
    pub ad_group: String,
    pub terms: usize,
    pub impressions: u64,
    pub clicks: u64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub cpa: Metric,
    pub ctr: Metric,
}

#[derive(Debug, Clone, Serialize)]
pub struct NegativeCount {
    pub ad_group: String,
    pub negatives: usize,
}

/// Campaign-level split of the whole input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignSplit {
    pub brand_terms: usize,
    pub brand_cost_micros: i64,
    pub nonbrand_terms: usize,
    pub nonbrand_cost_micros: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub total_terms: usize,
    pub total_cost_micros: i64,
    pub by_status: Vec<StatusSummary>,
    pub by_ad_group: Vec<AdGroupStats>,
    pub negatives_per_ad_group: Vec<NegativeCount>,
    pub campaigns: CampaignSplit,
    pub self_blocked: usize,
    pub recommendations: usize,
    pub brand_in_nonbrand: usize,
    pub nonbrand_in_brand: usize,
}

impl RouteSummary {
    pub fn status(&self, status: RoutingStatus) -> Option<&StatusSummary> {
        self.by_status.iter().find(|s| s.status == status)
    }

    pub fn count(&self, status: RoutingStatus) -> usize {
        self.status(status).map_or(0, |s| s.count)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMeta {
    pub rules_name: String,
    pub rules_version: u32,
    pub engine_version: String,
    pub run_at: String,
    pub window: Option<ReportWindow>,
    pub min_cost_micros: i64,
    pub min_clicks: u64,
    pub input_rows: usize,
    pub analyzed_rows: usize,
    pub brand_rows_skipped: usize,
    pub out_of_scope_rows: usize,
    pub negatives_total: usize,
    pub negative_matching: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub meta: RouteMeta,
    pub summary: RouteSummary,
    pub decisions: Vec<RoutingDecision>,
    pub recommendations: Vec<Recommendation>,
    pub contamination: Vec<ContaminationIssue>,
    pub negations: Vec<NegativeRecommendation>,
}

impl RouteReport {
    pub fn to_json(&self) -> Result<String, RouteError> {
        serde_json::to_string_pretty(self).map_err(|e| RouteError::Render(format!("JSON serialization error: {e}")))
    }

    pub fn with_status(&self, status: RoutingStatus) -> impl Iterator<Item = &RoutingDecision> {
        self.decisions.iter().filter(move |d| d.status == status)
    }
}
