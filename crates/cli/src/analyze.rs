//! `troute analyze`: route exported search terms against the negative
//! keyword snapshot and write the CSV reports.

use std::path::{Path, PathBuf};

use clap::Args;

use termroute_routing::load::{load_negatives, load_search_terms};
use termroute_routing::metrics::units_to_micros;
use termroute_routing::recommend::Thresholds;
use termroute_routing::render::{report_files, summary_text};
use termroute_routing::window::{parse_date, ReportWindow};
use termroute_routing::{run, CompiledRules, RouteInput, RouteReport, RunOptions};

use crate::exit_codes::{EXIT_ANALYZE_IO, EXIT_ANALYZE_MISMATCH};
use crate::rules::load_compiled;
use crate::CliError;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Search-term performance export (CSV)
    #[arg(long)]
    pub terms: PathBuf,

    /// Negative keyword export (CSV)
    #[arg(long)]
    pub negatives: PathBuf,

    /// Rules document (TOML)
    #[arg(long, env = "TERMROUTE_RULES")]
    pub rules: Option<PathBuf>,

    /// Reporting window length in days [default: from rules]
    #[arg(long)]
    pub days: Option<u32>,

    /// Last day of the reporting window, YYYY-MM-DD [default: today, UTC]
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Minimum spend for a mismatch to be recommended [default: from rules]
    #[arg(long, value_name = "AMOUNT")]
    pub min_cost: Option<f64>,

    /// Minimum clicks for a mismatch to be recommended [default: from rules]
    #[arg(long, value_name = "N")]
    pub min_clicks: Option<u64>,

    /// Directory for the CSV reports
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Print the full report as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,

    /// Analyze without writing report files
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero when any mismatch passes the recommendation thresholds
    #[arg(long)]
    pub fail_on_mismatch: bool,
}

pub fn cmd_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let (rules, _) = load_compiled(args.rules.clone())?;
    let window = build_window(&args, &rules)?;
    let thresholds = build_thresholds(&args, &rules)?;

    let terms_csv = read_input(&args.terms)?;
    let negatives_csv = read_input(&args.negatives)?;

    let terms = load_search_terms(&source_name(&args.terms), &terms_csv, &rules.brand, Some(&window))?;
    let negatives = load_negatives(&source_name(&args.negatives), &negatives_csv, &rules.scope)?;
    log::info!(
        "loaded {} search term row(s), {} negative(s) across {} ad group(s)",
        terms.len(),
        negatives.total(),
        negatives.ad_group_count()
    );

    let input = RouteInput { terms, negatives };
    let options = RunOptions { thresholds: Some(thresholds), window: Some(window) };
    let report = run(&rules, &input, &options)?;

    if !args.dry_run {
        write_reports(&report, &args.out_dir)?;
    }

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", summary_text(&report));
    }

    if args.fail_on_mismatch && !report.recommendations.is_empty() {
        return Err(CliError::new(
            EXIT_ANALYZE_MISMATCH,
            format!("{} routing mismatch(es) above thresholds", report.recommendations.len()),
        ));
    }
    Ok(())
}

fn build_window(args: &AnalyzeArgs, rules: &CompiledRules) -> Result<ReportWindow, CliError> {
    let days = args.days.unwrap_or(rules.window_days);
    if days == 0 {
        return Err(CliError::usage("--days must be at least 1"));
    }
    let window = match &args.end_date {
        Some(raw) => {
            let end = parse_date(raw).ok_or_else(|| {
                CliError::usage(format!("invalid --end-date '{raw}'")).with_hint("use YYYY-MM-DD")
            })?;
            ReportWindow::ending(end, days)
        }
        None => ReportWindow::trailing(days),
    };
    window.map_err(|e| CliError::usage(format!("--days {days}: {e}")))
}

fn build_thresholds(args: &AnalyzeArgs, rules: &CompiledRules) -> Result<Thresholds, CliError> {
    let min_cost_micros = match args.min_cost {
        Some(cost) if !cost.is_finite() || cost < 0.0 => {
            return Err(CliError::usage(format!(
                "--min-cost must be a non-negative number, got {cost}"
            )));
        }
        Some(cost) => units_to_micros(cost),
        None => rules.thresholds.min_cost_micros,
    };
    Ok(Thresholds {
        min_cost_micros,
        min_clicks: args.min_clicks.unwrap_or(rules.thresholds.min_clicks),
    })
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_ANALYZE_IO, format!("cannot read {}: {e}", path.display())))
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_reports(report: &RouteReport, out_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        CliError::new(EXIT_ANALYZE_IO, format!("cannot create {}: {e}", out_dir.display()))
    })?;
    for (name, contents) in report_files(report)? {
        let path = out_dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|e| CliError::new(EXIT_ANALYZE_IO, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
