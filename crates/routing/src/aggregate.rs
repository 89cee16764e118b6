use std::collections::{BTreeMap, HashMap};

use crate::config::ScopeConfig;
use crate::metrics::{cpa, ctr, percent};
use crate::model::{
    AdGroupStats, CampaignSplit, NegativeCount, RoutingDecision, RoutingStatus, SearchTermRecord,
    StatusSummary,
};
use crate::negatives::NegativeKeywordSet;

/// Merge daily rows of the same (term, campaign, ad group) into one record,
/// summing metrics. First-seen order is kept. Sums saturate instead of
/// overflowing.
pub fn consolidate_terms(records: Vec<SearchTermRecord>) -> Vec<SearchTermRecord> {
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();
    let mut out: Vec<SearchTermRecord> = Vec::new();

    for rec in records {
        let key = (rec.text.clone(), rec.campaign.clone(), rec.ad_group.clone());
        match index.get(&key) {
            Some(&i) => {
                let merged = &mut out[i];
                merged.impressions = merged.impressions.saturating_add(rec.impressions);
                merged.clicks = merged.clicks.saturating_add(rec.clicks);
                merged.cost_micros = merged.cost_micros.saturating_add(rec.cost_micros);
                merged.conversions += rec.conversions;
                merged.conversion_value_micros =
                    match (merged.conversion_value_micros, rec.conversion_value_micros) {
                        (None, None) => None,
                        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
                    };
                if merged.keyword_text.is_none() {
                    merged.keyword_text = rec.keyword_text;
                }
                if merged.match_type.is_none() {
                    merged.match_type = rec.match_type;
                }
            }
            None => {
                index.insert(key, out.len());
                let mut rec = rec;
                rec.date = None;
                out.push(rec);
            }
        }
    }
    out
}

/// One row per status in report order, including empty ones.
pub fn status_summary(decisions: &[RoutingDecision]) -> Vec<StatusSummary> {
    let total = decisions.len();
    RoutingStatus::ALL
        .iter()
        .map(|&status| {
            let mut row = StatusSummary {
                status,
                count: 0,
                pct: 0.0,
                cost_micros: 0,
                clicks: 0,
                conversions: 0.0,
                cpa: cpa(0, 0.0),
            };
            for d in decisions.iter().filter(|d| d.status == status) {
                row.count += 1;
                row.cost_micros = row.cost_micros.saturating_add(d.term.cost_micros);
                row.clicks = row.clicks.saturating_add(d.term.clicks);
                row.conversions += d.term.conversions;
            }
            row.pct = percent(row.count, total);
            row.cpa = cpa(row.cost_micros, row.conversions);
            row
        })
        .collect()
}

/// Traffic per serving ad group, most expensive first.
pub fn ad_group_stats(decisions: &[RoutingDecision]) -> Vec<AdGroupStats> {
    let mut groups: BTreeMap<&str, AdGroupStats> = BTreeMap::new();

    for d in decisions {
        let entry = groups.entry(d.actual_ad_group.as_str()).or_insert_with(|| AdGroupStats {
            ad_group: d.actual_ad_group.clone(),
            terms: 0,
            impressions: 0,
            clicks: 0,
            cost_micros: 0,
            conversions: 0.0,
            cpa: cpa(0, 0.0),
            ctr: ctr(0, 0),
        });
        entry.terms += 1;
        entry.impressions = entry.impressions.saturating_add(d.term.impressions);
        entry.clicks = entry.clicks.saturating_add(d.term.clicks);
        entry.cost_micros = entry.cost_micros.saturating_add(d.term.cost_micros);
        entry.conversions += d.term.conversions;
    }

    let mut stats: Vec<AdGroupStats> = groups
        .into_values()
        .map(|mut s| {
            s.cpa = cpa(s.cost_micros, s.conversions);
            s.ctr = ctr(s.clicks, s.impressions);
            s
        })
        .collect();
    // stable sort keeps BTreeMap name order for equal cost
    stats.sort_by(|a, b| b.cost_micros.cmp(&a.cost_micros));
    stats
}

pub fn negatives_per_ad_group(negatives: &NegativeKeywordSet) -> Vec<NegativeCount> {
    negatives
        .counts()
        .into_iter()
        .map(|(ad_group, n)| NegativeCount {
            ad_group: ad_group.to_string(),
            negatives: n,
        })
        .collect()
}

/// Brand vs non-brand campaign totals over every input row.
pub fn campaign_split(terms: &[SearchTermRecord], scope: &ScopeConfig) -> CampaignSplit {
    let mut split = CampaignSplit::default();
    for t in terms {
        if scope.is_nonbrand_campaign(&t.campaign) {
            split.nonbrand_terms += 1;
            split.nonbrand_cost_micros = split.nonbrand_cost_micros.saturating_add(t.cost_micros);
        } else if scope.is_brand_campaign(&t.campaign) {
            split.brand_terms += 1;
            split.brand_cost_micros = split.brand_cost_micros.saturating_add(t.cost_micros);
        }
    }
    split
}

/// Up to `limit` decisions with `status`, most expensive first, ties by term.
pub fn top_by_cost(decisions: &[RoutingDecision], status: RoutingStatus, limit: usize) -> Vec<&RoutingDecision> {
    let mut picked: Vec<&RoutingDecision> = decisions.iter().filter(|d| d.status == status).collect();
    picked.sort_by(|a, b| {
        b.term
            .cost_micros
            .cmp(&a.term.cost_micros)
            .then_with(|| a.term.text.cmp(&b.term.text))
    });
    picked.truncate(limit);
    picked
}
