//! Routing-status resolution.
//!
//! Status depends only on (expected, actual, blocked_from). A term blocked by
//! a negative in the ad group that actually served it keeps its status; the
//! conflict is recorded in `self_blocked_by` and appended to the reason so it
//! shows up in every report instead of being resolved silently.

use crate::intent::IntentClassifier;
use crate::model::{BlockHit, RoutingDecision, RoutingStatus, SearchTermRecord};
use crate::negatives::NegativeKeywordSet;

pub fn resolve_status(expected: Option<&str>, actual: &str, blocked_from: &[BlockHit]) -> RoutingStatus {
    match expected {
        Some(intent) if intent == actual => RoutingStatus::CorrectByIntent,
        Some(intent) if blocked_from.iter().any(|b| b.ad_group == intent) => {
            RoutingStatus::CorrectByNegative
        }
        Some(_) => RoutingStatus::PotentialMismatch,
        None => RoutingStatus::NoClearIntent,
    }
}

/// Human-readable reason for a resolved status.
pub fn reason_for(
    status: RoutingStatus,
    expected: Option<&str>,
    actual: &str,
    blocked_from: &[BlockHit],
) -> String {
    match (status, expected) {
        (RoutingStatus::CorrectByIntent, _) => format!("Term matches {actual} theme"),
        (RoutingStatus::CorrectByNegative, Some(intent)) => {
            let negative = blocked_from
                .iter()
                .find(|b| b.ad_group == intent)
                .map_or("", |b| b.negative.as_str());
            format!("Blocked from {intent} by negative [{negative}]")
        }
        (RoutingStatus::PotentialMismatch, Some(intent)) => {
            format!("Expected {intent}, but in {actual}")
        }
        _ => "No strong theme match detected".to_string(),
    }
}

/// Route one record against the classifier and the negative snapshot.
pub fn resolve(
    record: &SearchTermRecord,
    classifier: &IntentClassifier,
    negatives: &NegativeKeywordSet,
) -> RoutingDecision {
    let actual = record.ad_group.as_str();
    let blocked_from = negatives.blocking(&record.text);
    let expected = classifier.classify(&record.text);

    let status = resolve_status(expected, actual, &blocked_from);
    let mut reason = reason_for(status, expected, actual, &blocked_from);

    let self_blocked_by = blocked_from
        .iter()
        .find(|b| b.ad_group == actual)
        .map(|b| b.negative.clone());
    if let Some(negative) = &self_blocked_by {
        log::warn!(
            "'{}' served in {actual} despite matching its negative [{negative}]",
            record.text
        );
        reason.push_str(&format!("; self-blocked by negative [{negative}] in {actual}"));
    }

    RoutingDecision {
        term: record.clone(),
        expected_ad_group: expected.map(str::to_string),
        actual_ad_group: actual.to_string(),
        blocked_from,
        self_blocked_by,
        status,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;

    fn classifier() -> IntentClassifier {
        IntentClassifier::compile(&RoutingConfig::builtin().unwrap().intents).unwrap()
    }

    fn record(text: &str, ad_group: &str) -> SearchTermRecord {
        SearchTermRecord {
            text: text.into(),
            campaign: "Search - NonBrand".into(),
            ad_group: ad_group.into(),
            impressions: 50,
            clicks: 3,
            cost_micros: 12_000_000,
            conversions: 0.0,
            is_brand: false,
            keyword_text: None,
            match_type: None,
            conversion_value_micros: None,
            date: None,
        }
    }

    fn hit(ad_group: &str, negative: &str) -> BlockHit {
        BlockHit { ad_group: ad_group.into(), negative: negative.into() }
    }

    #[test]
    fn intent_equal_to_actual_wins_over_blocking() {
        let blocked = [hit("OMS", "order")];
        assert_eq!(resolve_status(Some("OMS"), "OMS", &blocked), RoutingStatus::CorrectByIntent);
        assert_eq!(resolve_status(Some("OMS"), "OMS", &[]), RoutingStatus::CorrectByIntent);
    }

    #[test]
    fn blocked_intent_is_correct_by_negative() {
        let blocked = [hit("B2B EComm", "x"), hit("OMS", "order management")];
        let status = resolve_status(Some("OMS"), "NB - General B2B", &blocked);
        assert_eq!(status, RoutingStatus::CorrectByNegative);
        let reason = reason_for(status, Some("OMS"), "NB - General B2B", &blocked);
        assert_eq!(reason, "Blocked from OMS by negative [order management]");
    }

    #[test]
    fn unblocked_intent_is_mismatch() {
        let blocked = [hit("B2B EComm", "b2b")];
        let status = resolve_status(Some("OMS"), "NB - General B2B", &blocked);
        assert_eq!(status, RoutingStatus::PotentialMismatch);
        assert_eq!(
            reason_for(status, Some("OMS"), "NB - General B2B", &blocked),
            "Expected OMS, but in NB - General B2B"
        );
    }

    #[test]
    fn no_intent() {
        let status = resolve_status(None, "OMS", &[hit("OMS", "cheap")]);
        assert_eq!(status, RoutingStatus::NoClearIntent);
        assert_eq!(reason_for(status, None, "OMS", &[]), "No strong theme match detected");
    }

    #[test]
    fn end_to_end_mismatch_without_negatives() {
        let d = resolve(
            &record("b2b order management software", "NB - General B2B"),
            &classifier(),
            &NegativeKeywordSet::new(),
        );
        assert_eq!(d.expected_ad_group.as_deref(), Some("OMS"));
        assert_eq!(d.actual_ad_group, "NB - General B2B");
        assert!(d.blocked_from.is_empty());
        assert_eq!(d.status, RoutingStatus::PotentialMismatch);
        assert_eq!(d.self_blocked_by, None);
    }

    #[test]
    fn block_on_other_group_does_not_affect_actual() {
        let mut negatives = NegativeKeywordSet::new();
        negatives.ensure_group("NB - General B2B");
        negatives.insert("OMS", "order management");
        let d = resolve(
            &record("b2b order management software", "NB - General B2B"),
            &classifier(),
            &negatives,
        );
        assert_eq!(d.status, RoutingStatus::CorrectByNegative);
        assert_eq!(d.reason, "Blocked from OMS by negative [order management]");
        assert_eq!(d.self_blocked_by, None);
    }

    #[test]
    fn self_block_is_flagged_not_hidden() {
        let mut negatives = NegativeKeywordSet::new();
        negatives.insert("OMS", "order management");
        let d = resolve(&record("b2b order management software", "OMS"), &classifier(), &negatives);
        assert_eq!(d.status, RoutingStatus::CorrectByIntent);
        assert_eq!(d.self_blocked_by.as_deref(), Some("order management"));
        assert!(d.reason.starts_with("Term matches OMS theme"));
        assert!(d.reason.contains("self-blocked by negative [order management] in OMS"));
    }

    #[test]
    fn unclear_term() {
        let d = resolve(&record("cheap shoes", "OMS"), &classifier(), &NegativeKeywordSet::new());
        assert_eq!(d.status, RoutingStatus::NoClearIntent);
        assert_eq!(d.expected_ad_group, None);
    }
}
