//! `troute classify`: brand flag and intent for ad-hoc terms.

use std::path::PathBuf;

use serde::Serialize;

use termroute_routing::intent::UNCLEAR;
use termroute_routing::CompiledRules;

use crate::exit_codes::EXIT_ERROR;
use crate::rules::load_compiled;
use crate::CliError;

#[derive(Debug, Serialize)]
struct Classification<'a> {
    term: &'a str,
    is_brand: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    brand_pattern: Option<&'a str>,
    intent: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<String>,
}

fn classify_one<'a>(rules: &'a CompiledRules, term: &'a str) -> Classification<'a> {
    let brand_pattern = rules.brand.matching_pattern(term);
    let (intent, matched) = match rules.intent.explain(term) {
        Some((label, matcher)) => (label, Some(matcher.describe())),
        None => (UNCLEAR, None),
    };
    Classification {
        term,
        is_brand: brand_pattern.is_some(),
        brand_pattern,
        intent,
        matched,
    }
}

pub fn cmd_classify(terms: Vec<String>, rules: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let (rules, _) = load_compiled(rules)?;
    let rows: Vec<Classification> = terms.iter().map(|t| classify_one(&rules, t)).collect();

    if json {
        let out = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    let width = rows.iter().map(|r| r.term.chars().count()).max().unwrap_or(0);
    for row in &rows {
        let brand = if row.is_brand { "brand" } else { "-" };
        match &row.matched {
            Some(m) => println!("{:<width$}  {:<5}  {}  ({})", row.term, brand, row.intent, m),
            None => println!("{:<width$}  {:<5}  {}", row.term, brand, row.intent),
        }
    }
    Ok(())
}
