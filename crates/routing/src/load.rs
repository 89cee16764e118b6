//! CSV loaders for the search-term report and the negative-keyword export.
//!
//! Headers are matched case-insensitively after trimming. Row numbers in
//! errors are file line numbers (the header is line 1).

use crate::brand::BrandDetector;
use crate::config::ScopeConfig;
use crate::error::RouteError;
use crate::metrics::{parse_money_micros, MAX_ROW_AMOUNT_MICROS};
use crate::model::SearchTermRecord;
use crate::negatives::NegativeKeywordSet;
use crate::window::{parse_date, ReportWindow};

struct Headers {
    source: String,
    names: Vec<String>,
}

impl Headers {
    fn read(source: &str, reader: &mut csv::Reader<&[u8]>) -> Result<Self, RouteError> {
        let names = reader
            .headers()
            .map_err(|e| csv_err(source, e))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        Ok(Self { source: source.to_string(), names })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|h| h == name)
    }

    fn required(&self, name: &str) -> Result<usize, RouteError> {
        self.optional(name).ok_or_else(|| RouteError::MissingColumn {
            source: self.source.clone(),
            column: name.into(),
        })
    }
}

fn csv_err(source: &str, e: csv::Error) -> RouteError {
    RouteError::Csv {
        source: source.into(),
        message: e.to_string(),
    }
}

fn line_of(record: &csv::StringRecord, fallback: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback)
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_text(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| cell(record, i))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn amount_in_range(micros: i64) -> Option<i64> {
    (0..=MAX_ROW_AMOUNT_MICROS).contains(&micros).then_some(micros)
}

// ---------------------------------------------------------------------------
// Search terms
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum CostColumn {
    Units(usize),
    Micros(usize),
}

/// Load the search-term report.
///
/// `is_brand` is set from `brand`. When `window` is given and the file has a
/// `date` column, rows dated outside it are dropped. Blank numeric cells
/// count as zero. Blank term, campaign or ad group cells are rejected, as are
/// negative amounts and amounts above [`MAX_ROW_AMOUNT_MICROS`].
pub fn load_search_terms(
    source: &str,
    csv_data: &str,
    brand: &BrandDetector,
    window: Option<&ReportWindow>,
) -> Result<Vec<SearchTermRecord>, RouteError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let headers = Headers::read(source, &mut reader)?;

    let term_idx = headers.required("search_term")?;
    let campaign_idx = headers.required("campaign_name")?;
    let ad_group_idx = headers.required("ad_group_name")?;
    let impressions_idx = headers.required("impressions")?;
    let clicks_idx = headers.required("clicks")?;
    let conversions_idx = headers.required("conversions")?;
    let cost_col = match (headers.optional("cost"), headers.optional("cost_micros")) {
        (Some(i), _) => CostColumn::Units(i),
        (None, Some(i)) => CostColumn::Micros(i),
        (None, None) => {
            return Err(RouteError::MissingColumn {
                source: source.into(),
                column: "cost".into(),
            })
        }
    };
    let keyword_idx = headers.optional("keyword_text");
    let match_type_idx = headers.optional("match_type");
    let value_idx = headers.optional("conversions_value");
    let date_idx = headers.optional("date");

    let number_err = |row: usize, column: &str, value: &str| RouteError::NumberParse {
        source: source.into(),
        row,
        column: column.into(),
        value: value.into(),
    };

    let range_err = |row: usize, column: &str, value: &str| RouteError::OutOfRange {
        source: source.into(),
        row,
        column: column.into(),
        value: value.into(),
    };

    let mut rows = Vec::new();
    let mut outside_window = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_err(source, e))?;
        let row = line_of(&record, i + 2);

        let date = match date_idx.map(|d| cell(&record, d)).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| RouteError::DateParse {
                source: source.into(),
                row,
                value: raw.into(),
            })?),
            None => None,
        };
        if let (Some(w), Some(d)) = (window, date) {
            if !w.contains(d) {
                outside_window += 1;
                continue;
            }
        }

        let count = |idx: usize, column: &str| -> Result<u64, RouteError> {
            let raw = cell(&record, idx);
            if raw.is_empty() {
                return Ok(0);
            }
            raw.replace(',', "")
                .parse::<u64>()
                .map_err(|_| number_err(row, column, raw))
        };
        let impressions = count(impressions_idx, "impressions")?;
        let clicks = count(clicks_idx, "clicks")?;

        let conversions = {
            let raw = cell(&record, conversions_idx);
            if raw.is_empty() {
                0.0
            } else {
                raw.replace(',', "")
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| number_err(row, "conversions", raw))?
            }
        };

        let cost_micros = match cost_col {
            CostColumn::Units(idx) => {
                let raw = cell(&record, idx);
                if raw.is_empty() {
                    0
                } else {
                    let micros = parse_money_micros(raw).map_err(|_| number_err(row, "cost", raw))?;
                    amount_in_range(micros).ok_or_else(|| range_err(row, "cost", raw))?
                }
            }
            CostColumn::Micros(idx) => {
                let raw = cell(&record, idx);
                if raw.is_empty() {
                    0
                } else {
                    let micros = raw.parse::<i64>().map_err(|_| number_err(row, "cost_micros", raw))?;
                    amount_in_range(micros).ok_or_else(|| range_err(row, "cost_micros", raw))?
                }
            }
        };

        let conversion_value_micros = match value_idx.map(|v| cell(&record, v)).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let micros = parse_money_micros(raw).map_err(|_| number_err(row, "conversions_value", raw))?;
                Some(amount_in_range(micros).ok_or_else(|| range_err(row, "conversions_value", raw))?)
            }
            None => None,
        };

        let required_text = |idx: usize, column: &str| -> Result<String, RouteError> {
            let value = cell(&record, idx);
            if value.is_empty() {
                return Err(RouteError::EmptyField { source: source.into(), row, column: column.into() });
            }
            Ok(value.to_string())
        };
        let text = required_text(term_idx, "search_term")?;
        let campaign = required_text(campaign_idx, "campaign_name")?;
        let ad_group = required_text(ad_group_idx, "ad_group_name")?;
        rows.push(SearchTermRecord {
            is_brand: brand.is_brand(&text),
            text,
            campaign,
            ad_group,
            impressions,
            clicks,
            cost_micros,
            conversions,
            keyword_text: optional_text(&record, keyword_idx),
            match_type: optional_text(&record, match_type_idx),
            conversion_value_micros,
            date,
        });
    }

    if outside_window > 0 {
        log::info!("{source}: dropped {outside_window} row(s) outside the reporting window");
    }
    log::debug!("{source}: loaded {} search-term row(s)", rows.len());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Negatives
// ---------------------------------------------------------------------------

/// Strip export decorations: `[exact]` and `"phrase"`.
fn bare_keyword(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(raw)
        .trim()
}

/// Load ad-group negatives. Rows whose optional `campaign_name` lacks the
/// non-brand marker are skipped. `match_type` is accepted but not used:
/// blocking is substring containment regardless of match type.
pub fn load_negatives(
    source: &str,
    csv_data: &str,
    scope: &ScopeConfig,
) -> Result<NegativeKeywordSet, RouteError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let headers = Headers::read(source, &mut reader)?;

    let ad_group_idx = headers.required("ad_group_name")?;
    let keyword_idx = headers.required("keyword")?;
    let campaign_idx = headers.optional("campaign_name");

    let mut set = NegativeKeywordSet::new();
    let mut out_of_scope = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| csv_err(source, e))?;

        if let Some(ci) = campaign_idx {
            if !scope.is_nonbrand_campaign(cell(&record, ci)) {
                out_of_scope += 1;
                continue;
            }
        }

        let ad_group = cell(&record, ad_group_idx);
        if ad_group.is_empty() {
            continue;
        }
        set.ensure_group(ad_group);
        set.insert(ad_group, bare_keyword(cell(&record, keyword_idx)));
    }

    if out_of_scope > 0 {
        log::debug!("{source}: skipped {out_of_scope} negative(s) outside non-brand campaigns");
    }
    log::info!(
        "{source}: {} negative(s) across {} ad group(s)",
        set.total(),
        set.ad_group_count()
    );
    Ok(set)
}
