// termroute CLI - search-term routing analysis over exported CSV data

mod analyze;
mod classify;
mod exit_codes;
mod rules;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{route_exit_code, EXIT_SUCCESS, EXIT_USAGE};
use termroute_routing::RouteError;

#[derive(Parser)]
#[command(name = "troute")]
#[command(about = "Classify non-brand search-term routing across ad groups")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log verbosity: -v for info, -vv for debug (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route every non-brand search term and write the CSV reports
    #[command(after_help = "\
Examples:
  troute analyze --terms search_terms.csv --negatives negatives.csv
  troute analyze --terms terms.csv --negatives negs.csv --out-dir reports/
  troute analyze --terms terms.csv --negatives negs.csv --days 30 --end-date 2026-03-01
  troute analyze --terms terms.csv --negatives negs.csv --min-cost 25 --min-clicks 5
  troute analyze --terms terms.csv --negatives negs.csv --json --dry-run
  troute analyze --terms terms.csv --negatives negs.csv --fail-on-mismatch")]
    Analyze(analyze::AnalyzeArgs),

    /// Show brand flag and intent category for individual terms
    #[command(after_help = "\
Examples:
  troute classify \"b2b order management platform\"
  troute classify \"kibo oms\" \"wholesale ecommerce\" --json
  troute classify \"headless commerce api\" --rules custom.toml")]
    Classify {
        /// Search terms to classify
        #[arg(required = true)]
        terms: Vec<String>,

        /// Rules document (TOML)
        #[arg(long, env = "TERMROUTE_RULES")]
        rules: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect or validate routing rules documents
    Rules {
        #[command(subcommand)]
        command: rules::RulesCommands,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nrouting: termroute-routing ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nrouting: termroute-routing ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    // RUST_LOG wins over -v when set.
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze(args) => analyze::cmd_analyze(args),
        Commands::Classify { terms, rules, json } => classify::cmd_classify(terms, rules, json),
        Commands::Rules { command } => rules::cmd_rules(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Create error from an engine error with the mapped exit code.
    pub fn route(err: RouteError) -> Self {
        let code = route_exit_code(&err);
        let hint = match &err {
            RouteError::MissingColumn { column, .. } if column == "cost" => {
                Some("export either a 'cost' or a 'cost_micros' column".to_string())
            }
            RouteError::MissingColumn { .. } => {
                Some("check the CSV header row; column names are case-insensitive".to_string())
            }
            RouteError::InvalidPattern { .. } => {
                Some("patterns use Rust regex syntax and are matched case-insensitively".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<RouteError> for CliError {
    fn from(err: RouteError) -> Self {
        Self::route(err)
    }
}
