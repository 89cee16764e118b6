use crate::aggregate::{
    ad_group_stats, campaign_split, consolidate_terms, negatives_per_ad_group, status_summary,
};
use crate::config::CompiledRules;
use crate::contamination::{build_negations, find_contamination, ContaminationKind};
use crate::error::RouteError;
use crate::model::{RouteInput, RouteMeta, RouteReport, RouteSummary, RoutingDecision};
use crate::negatives::SUBSTRING_MATCH_NOTE;
use crate::recommend::{build_recommendations, Thresholds};
use crate::resolve::resolve;
use crate::window::ReportWindow;

/// Per-run overrides on top of the compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Replaces the rules' thresholds when set.
    pub thresholds: Option<Thresholds>,
    /// Recorded in the report. Rows are filtered by the loader, not here.
    pub window: Option<ReportWindow>,
}

/// Route every in-scope term, then build recommendations and summaries.
pub fn run(rules: &CompiledRules, input: &RouteInput, options: &RunOptions) -> Result<RouteReport, RouteError> {
    let thresholds = options.thresholds.unwrap_or(rules.thresholds);
    if thresholds.min_cost_micros < 0 {
        return Err(RouteError::ConfigValidation(
            "minimum cost must be a non-negative number".into(),
        ));
    }

    let terms = if input.terms.iter().any(|t| t.date.is_some()) {
        let merged = consolidate_terms(input.terms.clone());
        log::debug!("consolidated {} dated row(s) into {} term(s)", input.terms.len(), merged.len());
        merged
    } else {
        input.terms.clone()
    };

    let contamination = find_contamination(&terms, &rules.scope);

    let mut decisions: Vec<RoutingDecision> = Vec::new();
    let mut out_of_scope = 0usize;
    let mut brand_skipped = 0usize;
    for term in &terms {
        if !rules.scope.is_nonbrand_campaign(&term.campaign) {
            out_of_scope += 1;
            continue;
        }
        if term.is_brand {
            brand_skipped += 1;
            continue;
        }
        decisions.push(resolve(term, &rules.intent, &input.negatives));
    }

    log::info!(
        "routed {} non-brand term(s); {} brand term(s) skipped, {} outside non-brand campaigns",
        decisions.len(),
        brand_skipped,
        out_of_scope
    );

    let recommendations = build_recommendations(&decisions, &thresholds);
    let negations = build_negations(&contamination, &recommendations);

    let self_blocked = decisions.iter().filter(|d| d.self_blocked_by.is_some()).count();
    if self_blocked > 0 {
        log::warn!("{self_blocked} term(s) matched a negative in the ad group that served them");
    }

    let summary = RouteSummary {
        total_terms: decisions.len(),
        total_cost_micros: decisions.iter().fold(0i64, |acc, d| acc.saturating_add(d.term.cost_micros)),
        by_status: status_summary(&decisions),
        by_ad_group: ad_group_stats(&decisions),
        negatives_per_ad_group: negatives_per_ad_group(&input.negatives),
        campaigns: campaign_split(&terms, &rules.scope),
        self_blocked,
        recommendations: recommendations.len(),
        brand_in_nonbrand: contamination
            .iter()
            .filter(|c| c.kind == ContaminationKind::BrandInNonbrand)
            .count(),
        nonbrand_in_brand: contamination
            .iter()
            .filter(|c| c.kind == ContaminationKind::NonbrandInBrand)
            .count(),
    };

    Ok(RouteReport {
        meta: RouteMeta {
            rules_name: rules.name.clone(),
            rules_version: rules.version,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            window: options.window,
            min_cost_micros: thresholds.min_cost_micros,
            min_clicks: thresholds.min_clicks,
            input_rows: input.terms.len(),
            analyzed_rows: decisions.len(),
            brand_rows_skipped: brand_skipped,
            out_of_scope_rows: out_of_scope,
            negatives_total: input.negatives.total(),
            negative_matching: SUBSTRING_MATCH_NOTE.to_string(),
        },
        summary,
        decisions,
        recommendations,
        contamination,
        negations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RoutingStatus, SearchTermRecord};
    use crate::negatives::NegativeKeywordSet;

    fn rules() -> CompiledRules {
        CompiledRules::from_toml(crate::config::DEFAULT_RULES).unwrap()
    }

    fn term(text: &str, campaign: &str, ad_group: &str, cost: i64, clicks: u64) -> SearchTermRecord {
        SearchTermRecord {
            is_brand: rules().brand.is_brand(text),
            text: text.into(),
            campaign: campaign.into(),
            ad_group: ad_group.into(),
            impressions: 100,
            clicks,
            cost_micros: cost * 1_000_000,
            conversions: 0.0,
            keyword_text: None,
            match_type: None,
            conversion_value_micros: None,
            date: None,
        }
    }

    #[test]
    fn scope_and_brand_filtering() {
        let input = RouteInput {
            terms: vec![
                term("order management", "Search - NonBrand", "OMS", 12, 2),
                term("kibo oms", "Search - NonBrand", "OMS", 8, 1),
                term("oms vendors", "Search - Brand", "Brand", 3, 1),
            ],
            negatives: NegativeKeywordSet::new(),
        };
        let report = run(&rules(), &input, &RunOptions::default()).unwrap();
        assert_eq!(report.decisions.len(), 1);
        assert_eq!(report.meta.brand_rows_skipped, 1);
        assert_eq!(report.meta.out_of_scope_rows, 1);
        assert_eq!(report.contamination.len(), 2);
        assert_eq!(report.summary.brand_in_nonbrand, 1);
        assert_eq!(report.summary.nonbrand_in_brand, 1);
        assert_eq!(report.summary.count(RoutingStatus::CorrectByIntent), 1);
    }

    #[test]
    fn threshold_override() {
        let input = RouteInput {
            terms: vec![term("b2b order management software", "Search - NonBrand", "NB - General B2B", 5, 1)],
            negatives: NegativeKeywordSet::new(),
        };
        let default = run(&rules(), &input, &RunOptions::default()).unwrap();
        assert!(default.recommendations.is_empty());
        assert_eq!(default.summary.count(RoutingStatus::PotentialMismatch), 1);

        let options = RunOptions {
            thresholds: Some(Thresholds { min_cost_micros: 1_000_000, min_clicks: 5 }),
            window: None,
        };
        let lowered = run(&rules(), &input, &options).unwrap();
        assert_eq!(lowered.recommendations.len(), 1);
        assert_eq!(lowered.negations.len(), 1);
        assert_eq!(lowered.meta.min_cost_micros, 1_000_000);
    }

    #[test]
    fn negative_threshold_rejected() {
        let input = RouteInput { terms: Vec::new(), negatives: NegativeKeywordSet::new() };
        let options = RunOptions {
            thresholds: Some(Thresholds { min_cost_micros: -1, min_clicks: 2 }),
            window: None,
        };
        assert!(run(&rules(), &input, &options).is_err());
    }

    #[test]
    fn huge_costs_do_not_overflow() {
        let mut a = term("order management", "Search - NonBrand", "OMS", 0, 1);
        a.cost_micros = 5_000_000_000_000_000_000;
        let mut b = term("order management system", "Search - NonBrand", "OMS", 0, 1);
        b.cost_micros = 5_000_000_000_000_000_000;
        let input = RouteInput { terms: vec![a, b], negatives: NegativeKeywordSet::new() };
        let report = run(&rules(), &input, &RunOptions::default()).unwrap();
        assert_eq!(report.summary.total_cost_micros, i64::MAX);
        assert!(crate::render::summary_text(&report).contains("ROUTING STATUS BREAKDOWN"));
    }

    #[test]
    fn empty_input() {
        let input = RouteInput { terms: Vec::new(), negatives: NegativeKeywordSet::new() };
        let report = run(&rules(), &input, &RunOptions::default()).unwrap();
        assert_eq!(report.summary.total_terms, 0);
        assert_eq!(report.summary.by_status.len(), 4);
        assert!(report.negations.is_empty());
    }
}
