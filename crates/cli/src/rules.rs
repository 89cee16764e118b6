//! `troute rules` and rules-document resolution shared by every command.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use termroute_routing::{CompiledRules, RoutingConfig};

use crate::exit_codes::{EXIT_RULES_INVALID, EXIT_RULES_IO};
use crate::CliError;

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Print the effective rules document as TOML
    #[command(after_help = "\
Examples:
  troute rules show
  troute rules show --rules custom.toml
  TERMROUTE_RULES=team.toml troute rules show > rules.toml")]
    Show {
        /// Rules document (TOML)
        #[arg(long, env = "TERMROUTE_RULES")]
        rules: Option<PathBuf>,
    },

    /// Parse and compile a rules document without running
    #[command(after_help = "\
Examples:
  troute rules validate custom.toml")]
    Validate {
        /// Path to the rules TOML file
        path: PathBuf,
    },
}

pub fn cmd_rules(cmd: RulesCommands) -> Result<(), CliError> {
    match cmd {
        RulesCommands::Show { rules } => cmd_rules_show(rules),
        RulesCommands::Validate { path } => cmd_rules_validate(&path),
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Where the effective rules document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesSource {
    /// `--rules` or `TERMROUTE_RULES`.
    Explicit(PathBuf),
    /// `<config_dir>/termroute/rules.toml`.
    UserConfig(PathBuf),
    Builtin,
}

impl fmt::Display for RulesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) => write!(f, "{}", path.display()),
            Self::UserConfig(path) => write!(f, "{} (user config)", path.display()),
            Self::Builtin => f.write_str("built-in defaults"),
        }
    }
}

/// Per-user rules file location, if the platform has a config dir.
pub fn user_rules_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("termroute").join("rules.toml"))
}

/// Resolve the rules document: explicit path, then the user config file,
/// then the embedded defaults.
pub fn resolve_rules(explicit: Option<PathBuf>) -> Result<(RoutingConfig, RulesSource), CliError> {
    let source = match explicit {
        Some(path) => RulesSource::Explicit(path),
        None => match user_rules_path() {
            Some(path) if path.is_file() => RulesSource::UserConfig(path),
            _ => RulesSource::Builtin,
        },
    };

    let config = match &source {
        RulesSource::Explicit(path) | RulesSource::UserConfig(path) => read_rules_file(path)?,
        RulesSource::Builtin => RoutingConfig::builtin()?,
    };
    log::info!("rules '{}' v{} from {}", config.name, config.version, source);
    Ok((config, source))
}

/// Resolve and compile in one step.
pub fn load_compiled(explicit: Option<PathBuf>) -> Result<(CompiledRules, RulesSource), CliError> {
    let (config, source) = resolve_rules(explicit)?;
    let compiled = CompiledRules::compile(&config)
        .map_err(|e| CliError::from(e).with_hint(format!("rules loaded from {source}")))?;
    Ok((compiled, source))
}

fn read_rules_file(path: &Path) -> Result<RoutingConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_RULES_IO, format!("cannot read rules {}: {e}", path.display()))
    })?;
    RoutingConfig::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_RULES_INVALID, format!("{}: {e}", path.display()))
    })
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_rules_show(rules: Option<PathBuf>) -> Result<(), CliError> {
    let (config, source) = resolve_rules(rules)?;
    let toml = config.to_toml()?;
    eprintln!("# source: {source}");
    print!("{toml}");
    Ok(())
}

fn cmd_rules_validate(path: &Path) -> Result<(), CliError> {
    let config = read_rules_file(path)?;
    let compiled = CompiledRules::compile(&config).map_err(|e| {
        CliError::new(EXIT_RULES_INVALID, format!("{}: {e}", path.display()))
    })?;

    println!(
        "ok: '{}' v{}: {} brand pattern(s), {} intent categories",
        compiled.name,
        compiled.version,
        compiled.brand.len(),
        compiled.intent.len(),
    );
    let labels: Vec<&str> = compiled.intent.labels().collect();
    println!("priority: {}", labels.join(" > "));
    Ok(())
}
