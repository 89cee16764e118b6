use serde::Serialize;

use crate::model::{RoutingDecision, RoutingStatus};

/// Noise floor for surfacing a mismatch. Either condition is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub min_cost_micros: i64,
    pub min_clicks: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_cost_micros: 10_000_000,
            min_clicks: 2,
        }
    }
}

impl Thresholds {
    pub fn admits(&self, cost_micros: i64, clicks: u64) -> bool {
        cost_micros >= self.min_cost_micros || clicks >= self.min_clicks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationPriority {
    Review,
}

impl std::fmt::Display for RecommendationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Review => write!(f, "REVIEW"),
        }
    }
}

/// A mismatch worth a human look.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub search_term: String,
    pub campaign: String,
    pub current_ad_group: String,
    pub expected_ad_group: String,
    pub clicks: u64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub reason: String,
    pub action: String,
}

/// Mismatches that clear `thresholds`, most expensive first. Ties fall back
/// to the search-term text so output is stable.
pub fn build_recommendations(decisions: &[RoutingDecision], thresholds: &Thresholds) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = decisions
        .iter()
        .filter(|d| d.status == RoutingStatus::PotentialMismatch)
        .filter(|d| thresholds.admits(d.term.cost_micros, d.term.clicks))
        .filter_map(|d| {
            let expected = d.expected_ad_group.as_ref()?;
            Some(Recommendation {
                priority: RecommendationPriority::Review,
                search_term: d.term.text.clone(),
                campaign: d.term.campaign.clone(),
                current_ad_group: d.actual_ad_group.clone(),
                expected_ad_group: expected.clone(),
                clicks: d.term.clicks,
                cost_micros: d.term.cost_micros,
                conversions: d.term.conversions,
                reason: d.reason.clone(),
                action: format!(
                    "Consider adding to {} negative list to route to {}",
                    d.actual_ad_group, expected
                ),
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.cost_micros
            .cmp(&a.cost_micros)
            .then_with(|| a.search_term.cmp(&b.search_term))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchTermRecord;

    fn mismatch(text: &str, cost_micros: i64, clicks: u64) -> RoutingDecision {
        RoutingDecision {
            term: SearchTermRecord {
                text: text.into(),
                campaign: "Search - NonBrand".into(),
                ad_group: "NB - General B2B".into(),
                impressions: 100,
                clicks,
                cost_micros,
                conversions: 0.0,
                is_brand: false,
                keyword_text: None,
                match_type: None,
                conversion_value_micros: None,
                date: None,
            },
            expected_ad_group: Some("OMS".into()),
            actual_ad_group: "NB - General B2B".into(),
            blocked_from: Vec::new(),
            self_blocked_by: None,
            status: RoutingStatus::PotentialMismatch,
            reason: "Expected OMS, but in NB - General B2B".into(),
        }
    }

    #[test]
    fn low_value_mismatch_is_filtered() {
        let recs = build_recommendations(&[mismatch("oms cheap", 5_000_000, 1)], &Thresholds::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn costly_mismatch_is_kept() {
        let recs = build_recommendations(&[mismatch("oms pricey", 25_000_000, 1)], &Thresholds::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, RecommendationPriority::Review);
        assert_eq!(
            recs[0].action,
            "Consider adding to NB - General B2B negative list to route to OMS"
        );
    }

    #[test]
    fn clicks_alone_qualify() {
        let recs = build_recommendations(&[mismatch("oms clicky", 1_000_000, 2)], &Thresholds::default());
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = Thresholds::default();
        assert!(t.admits(10_000_000, 0));
        assert!(!t.admits(9_999_999, 1));
    }

    #[test]
    fn other_statuses_never_recommended() {
        let mut d = mismatch("oms", 50_000_000, 9);
        d.status = RoutingStatus::CorrectByNegative;
        assert!(build_recommendations(&[d], &Thresholds::default()).is_empty());
    }

    #[test]
    fn sorted_by_cost_then_term() {
        let recs = build_recommendations(
            &[
                mismatch("b", 20_000_000, 0),
                mismatch("c", 40_000_000, 0),
                mismatch("a", 20_000_000, 0),
            ],
            &Thresholds::default(),
        );
        let order: Vec<_> = recs.iter().map(|r| r.search_term.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
