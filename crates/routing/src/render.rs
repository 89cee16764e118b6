//! Deterministic text renderings of a [`RouteReport`]: the four CSV reports
//! and the console summary. Nothing here touches the filesystem.

use std::fmt::{self, Write as _};

use crate::aggregate::top_by_cost;
use crate::contamination::{ContaminationIssue, ContaminationKind, NegativeRecommendation, Priority};
use crate::error::RouteError;
use crate::intent::UNCLEAR;
use crate::metrics::{cpc, ctr, format_currency, format_micros};
use crate::model::{RouteReport, RoutingDecision, RoutingStatus};
use crate::recommend::Recommendation;

pub const ROUTING_ANALYSIS_FILE: &str = "traffic_routing_analysis.csv";
pub const RECOMMENDATIONS_FILE: &str = "refined_recommendations.csv";
pub const CONTAMINATION_FILE: &str = "cross_contamination_issues.csv";
pub const NEGATIONS_FILE: &str = "negation_recommendations.csv";

const TOP_EXAMPLES: usize = 10;

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn csv_text<F>(header: &[&str], mut write_rows: F) -> Result<String, RouteError>
where
    F: FnMut(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    // header is written even when there are no rows
    writer
        .write_record(header)
        .map_err(|e| RouteError::Render(format!("CSV write error: {e}")))?;
    write_rows(&mut writer).map_err(|e| RouteError::Render(format!("CSV write error: {e}")))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| RouteError::Render(format!("CSV flush error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| RouteError::Render(e.to_string()))
}

pub fn routing_analysis_csv(decisions: &[RoutingDecision]) -> Result<String, RouteError> {
    csv_text(
        &[
            "search_term",
            "campaign_name",
            "ad_group_name",
            "keyword_text",
            "match_type",
            "impressions",
            "clicks",
            "cost",
            "conversions",
            "conversion_value",
            "ctr",
            "cpc",
            "routing_status",
            "routing_reason",
            "natural_intent",
            "blocked_from",
            "self_blocked_by",
        ],
        |w| {
            for d in decisions {
                let t = &d.term;
                w.write_record([
                    t.text.as_str(),
                    &t.campaign,
                    &d.actual_ad_group,
                    t.keyword_text.as_deref().unwrap_or(""),
                    t.match_type.as_deref().unwrap_or(""),
                    &t.impressions.to_string(),
                    &t.clicks.to_string(),
                    &format_micros(t.cost_micros),
                    &t.conversions.to_string(),
                    &t.conversion_value_micros.map(format_micros).unwrap_or_default(),
                    &ctr(t.clicks, t.impressions).to_string(),
                    &cpc(t.cost_micros, t.clicks).to_string(),
                    d.status.as_str(),
                    &d.reason,
                    d.expected_ad_group.as_deref().unwrap_or(UNCLEAR),
                    &d.blocked_ad_groups(),
                    d.self_blocked_by.as_deref().unwrap_or(""),
                ])?;
            }
            Ok(())
        },
    )
}

pub fn recommendations_csv(recommendations: &[Recommendation]) -> Result<String, RouteError> {
    csv_text(
        &[
            "priority",
            "search_term",
            "current_ad_group",
            "expected_ad_group",
            "clicks",
            "cost",
            "conversions",
            "reason",
            "action",
        ],
        |w| {
            for r in recommendations {
                w.write_record([
                    r.priority.to_string().as_str(),
                    &r.search_term,
                    &r.current_ad_group,
                    &r.expected_ad_group,
                    &r.clicks.to_string(),
                    &format_micros(r.cost_micros),
                    &r.conversions.to_string(),
                    &r.reason,
                    &r.action,
                ])?;
            }
            Ok(())
        },
    )
}

pub fn contamination_csv(issues: &[ContaminationIssue]) -> Result<String, RouteError> {
    csv_text(
        &[
            "issue_type",
            "priority",
            "search_term",
            "campaign_name",
            "ad_group_name",
            "clicks",
            "cost",
            "conversions",
            "recommendation",
        ],
        |w| {
            for i in issues {
                w.write_record([
                    i.kind.as_str(),
                    i.priority.as_str(),
                    &i.search_term,
                    &i.campaign,
                    &i.ad_group,
                    &i.clicks.to_string(),
                    &format_micros(i.cost_micros),
                    &i.conversions.to_string(),
                    &i.recommendation,
                ])?;
            }
            Ok(())
        },
    )
}

pub fn negations_csv(negations: &[NegativeRecommendation]) -> Result<String, RouteError> {
    csv_text(
        &[
            "priority",
            "negative_keyword",
            "match_type",
            "level",
            "target_campaign",
            "target_ad_group",
            "reason",
            "wasted_spend",
            "clicks",
        ],
        |w| {
            for n in negations {
                w.write_record([
                    n.priority.as_str(),
                    &n.negative_keyword,
                    n.match_type.as_str(),
                    n.level.as_str(),
                    &n.target_campaign,
                    n.target_ad_group.as_deref().unwrap_or(""),
                    &n.reason,
                    &format_micros(n.wasted_spend_micros),
                    &n.clicks.to_string(),
                ])?;
            }
            Ok(())
        },
    )
}

/// All four reports as (file name, contents), in a fixed order.
pub fn report_files(report: &RouteReport) -> Result<Vec<(&'static str, String)>, RouteError> {
    Ok(vec![
        (ROUTING_ANALYSIS_FILE, routing_analysis_csv(&report.decisions)?),
        (RECOMMENDATIONS_FILE, recommendations_csv(&report.recommendations)?),
        (CONTAMINATION_FILE, contamination_csv(&report.contamination)?),
        (NEGATIONS_FILE, negations_csv(&report.negations)?),
    ])
}

// ---------------------------------------------------------------------------
// Console summary
// ---------------------------------------------------------------------------

pub fn summary_text(report: &RouteReport) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_summary(report, &mut out);
    out
}

pub fn write_summary(report: &RouteReport, out: &mut impl fmt::Write) -> fmt::Result {
    let s = &report.summary;
    let rule = "=".repeat(60);
    let sub = "-".repeat(40);

    writeln!(out, "{rule}")?;
    writeln!(out, "TRAFFIC ROUTING ANALYSIS - {}", report.meta.rules_name)?;
    writeln!(out, "{rule}")?;
    if let Some(window) = &report.meta.window {
        writeln!(out, "Period: {window}")?;
    }

    writeln!(out, "\nCAMPAIGN SUMMARY")?;
    writeln!(out, "{sub}")?;
    writeln!(
        out,
        "  Brand: {} terms, {} spend",
        s.campaigns.brand_terms,
        format_currency(s.campaigns.brand_cost_micros)
    )?;
    writeln!(
        out,
        "  NonBrand: {} terms, {} spend",
        s.campaigns.nonbrand_terms,
        format_currency(s.campaigns.nonbrand_cost_micros)
    )?;

    writeln!(out, "\nEXISTING TRAFFIC SHAPING NEGATIVES")?;
    writeln!(out, "{sub}")?;
    if s.negatives_per_ad_group.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for n in &s.negatives_per_ad_group {
        writeln!(out, "  {}: {} negatives", n.ad_group, n.negatives)?;
    }

    writeln!(out, "\nROUTING STATUS BREAKDOWN")?;
    writeln!(out, "{sub}")?;
    for row in &s.by_status {
        writeln!(
            out,
            "  {}: {} terms ({:.1}%) - {}",
            row.status,
            row.count,
            row.pct,
            format_currency(row.cost_micros)
        )?;
    }

    writeln!(
        out,
        "\n[OK] Traffic shaping is working for {} search terms",
        s.count(RoutingStatus::CorrectByNegative)
    )?;

    let shaped = top_by_cost(&report.decisions, RoutingStatus::CorrectByNegative, TOP_EXAMPLES);
    if !shaped.is_empty() {
        writeln!(out, "\nTOP TRAFFIC SHAPING EXAMPLES (working as intended):")?;
        writeln!(out, "{sub}")?;
        for d in shaped {
            writeln!(out, "  \"{}\"", d.term.text)?;
            writeln!(out, "    -> Routed to: {}", d.actual_ad_group)?;
            writeln!(out, "    -> {}", d.reason)?;
            writeln!(
                out,
                "    -> {} spend, {} clicks",
                format_currency(d.term.cost_micros),
                d.term.clicks
            )?;
        }
    }

    let mismatches = top_by_cost(&report.decisions, RoutingStatus::PotentialMismatch, TOP_EXAMPLES);
    if !mismatches.is_empty() {
        writeln!(out, "\n[!] POTENTIAL MISMATCHES (need review):")?;
        writeln!(out, "{sub}")?;
        for d in mismatches {
            writeln!(out, "  \"{}\" - {}", d.term.text, format_currency(d.term.cost_micros))?;
            writeln!(out, "    -> Currently in: {}", d.actual_ad_group)?;
            writeln!(
                out,
                "    -> Expected in: {}",
                d.expected_ad_group.as_deref().unwrap_or(UNCLEAR)
            )?;
        }
    }
    writeln!(
        out,
        "\n{} mismatch(es) clear the review threshold ({} or {} clicks)",
        s.recommendations,
        format_currency(report.meta.min_cost_micros),
        report.meta.min_clicks
    )?;

    if s.self_blocked > 0 {
        writeln!(out, "\n[!] SELF-BLOCKED TERMS (match a negative in their own ad group):")?;
        writeln!(out, "{sub}")?;
        for d in report.decisions.iter().filter(|d| d.self_blocked_by.is_some()) {
            writeln!(
                out,
                "  \"{}\" in {} by [{}]",
                d.term.text,
                d.actual_ad_group,
                d.self_blocked_by.as_deref().unwrap_or("")
            )?;
        }
    }

    writeln!(out, "\nCROSS-CONTAMINATION ISSUES")?;
    writeln!(out, "{sub}")?;
    for (kind, label) in [
        (ContaminationKind::BrandInNonbrand, "Brand terms in NonBrand"),
        (ContaminationKind::NonbrandInBrand, "NonBrand terms in Brand"),
    ] {
        let (count, cost) = report
            .contamination
            .iter()
            .filter(|c| c.kind == kind)
            .fold((0usize, 0i64), |(n, c), i| (n + 1, c.saturating_add(i.cost_micros)));
        writeln!(out, "  {label}: {count} (wasted: {})", format_currency(cost))?;
    }

    writeln!(out, "\nNEGATIVE KEYWORD RECOMMENDATIONS")?;
    writeln!(out, "{sub}")?;
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        let count = report.negations.iter().filter(|n| n.priority == priority).count();
        writeln!(out, "  {priority} priority negatives: {count}")?;
    }

    writeln!(out, "\nAD GROUP TRAFFIC DISTRIBUTION")?;
    writeln!(out, "{sub}")?;
    for ag in &s.by_ad_group {
        writeln!(out, "  {}", ag.ad_group)?;
        let cpa = if ag.cpa.is_applicable() {
            format!("${}", ag.cpa)
        } else {
            ag.cpa.to_string()
        };
        writeln!(
            out,
            "    {} terms | {} clicks | {} | {:.1} conv | CPA: {cpa}",
            ag.terms,
            ag.clicks,
            format_currency(ag.cost_micros),
            ag.conversions
        )?;
    }

    writeln!(out, "\nNote: {}", report.meta.negative_matching)?;
    writeln!(out, "{rule}")
}
