use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Caveat attached to every report that uses [`NegativeKeywordSet::blocking`].
pub const SUBSTRING_MATCH_NOTE: &str = "negative matching is substring containment on the \
lowercased search term; it approximates phrase/broad negatives and is not authoritative \
ad-serving behavior";

/// One ad group that would suppress a term, and the negative responsible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BlockHit {
    pub ad_group: String,
    pub negative: String,
}

/// Ad-group-level negative keywords. Snapshot, read-only once built.
///
/// Iteration is sorted by ad group then keyword, so every result derived
/// from the set is deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NegativeKeywordSet {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl NegativeKeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a negative. The keyword is trimmed and lowercased; blank
    /// keywords are ignored. Returns false when nothing new was stored.
    pub fn insert(&mut self, ad_group: &str, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        self.groups
            .entry(ad_group.to_string())
            .or_default()
            .insert(keyword)
    }

    /// Register an ad group with no negatives. Only affects counts.
    pub fn ensure_group(&mut self, ad_group: &str) {
        self.groups.entry(ad_group.to_string()).or_default();
    }

    /// Every (ad group, negative) whose negative text occurs inside the
    /// lowercased term. See [`SUBSTRING_MATCH_NOTE`].
    pub fn blocking(&self, term: &str) -> Vec<BlockHit> {
        let lowered = term.to_lowercase();
        let mut hits = Vec::new();
        for (ad_group, negatives) in &self.groups {
            for negative in negatives {
                if lowered.contains(negative.as_str()) {
                    hits.push(BlockHit {
                        ad_group: ad_group.clone(),
                        negative: negative.clone(),
                    });
                }
            }
        }
        hits
    }

    /// First negative of `ad_group` that blocks `term`, if any.
    pub fn blocked_in(&self, ad_group: &str, term: &str) -> Option<&str> {
        let lowered = term.to_lowercase();
        self.groups
            .get(ad_group)?
            .iter()
            .find(|n| lowered.contains(n.as_str()))
            .map(|n| n.as_str())
    }

    pub fn keywords(&self, ad_group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(ad_group)
    }

    /// (ad group, negative count), sorted by ad group.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|(ag, negs)| (ag.as_str(), negs.len()))
            .collect()
    }

    pub fn ad_group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(|n| n.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
