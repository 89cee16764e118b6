use std::fmt;

#[derive(Debug)]
pub enum RouteError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Rules validation error (empty label, duplicate category, bad threshold, etc.).
    ConfigValidation(String),
    /// A brand or intent pattern failed to compile.
    InvalidPattern { rule: String, pattern: String, message: String },
    /// Reporting window must cover at least one day.
    InvalidWindow(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// A numeric cell could not be parsed.
    NumberParse { source: String, row: usize, column: String, value: String },
    /// A required text cell is blank.
    EmptyField { source: String, row: usize, column: String },
    /// A numeric cell parsed but is negative or above the accepted maximum.
    OutOfRange { source: String, row: usize, column: String, value: String },
    /// A date cell could not be parsed.
    DateParse { source: String, row: usize, value: String },
    /// Malformed CSV (ragged rows, bad quoting, invalid UTF-8).
    Csv { source: String, message: String },
    /// Serialization of a report failed.
    Render(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "rules parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "rules validation error: {msg}"),
            Self::InvalidPattern { rule, pattern, message } => {
                write!(f, "rule '{rule}': invalid pattern '{pattern}': {message}")
            }
            Self::InvalidWindow(msg) => write!(f, "invalid reporting window: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::NumberParse { source, row, column, value } => {
                write!(f, "{source}, row {row}: cannot parse {column} '{value}'")
            }
            Self::EmptyField { source, row, column } => {
                write!(f, "{source}, row {row}: empty {column}")
            }
            Self::OutOfRange { source, row, column, value } => {
                write!(f, "{source}, row {row}: {column} '{value}' is out of range")
            }
            Self::DateParse { source, row, value } => {
                write!(f, "{source}, row {row}: cannot parse date '{value}'")
            }
            Self::Csv { source, message } => write!(f, "{source}: CSV error: {message}"),
            Self::Render(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for RouteError {}

impl RouteError {
    /// True for errors detected while reading the rules document.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_)
                | Self::ConfigValidation(_)
                | Self::InvalidPattern { .. }
                | Self::InvalidWindow(_)
        )
    }
}
