//! CLI Exit Code Registry
//!
//! Single source of truth for every `troute` exit code. Scripts and CI jobs
//! branch on these, so treat them as part of the shell contract.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                  |
//! |---------|-----------|----------------------------------------------|
//! | 0       | Universal | Success                                      |
//! | 1       | Universal | General error (unspecified)                  |
//! | 2       | Universal | CLI usage error (bad args, bad date)         |
//! | 3-9     | analyze   | Routing run outcomes and input failures      |
//! | 10-19   | rules     | Rules document failures                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `route_exit_code` or the relevant command

use termroute_routing::RouteError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparsable flag values.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Analyze (3-9)
// =============================================================================

/// `--fail-on-mismatch` was set and at least one mismatch passed the
/// recommendation thresholds.
pub const EXIT_ANALYZE_MISMATCH: u8 = 3;

/// Input data rejected: missing column, unparsable number or date, bad CSV.
pub const EXIT_ANALYZE_DATA: u8 = 4;

/// Cannot read an input file or write a report file.
pub const EXIT_ANALYZE_IO: u8 = 5;

// =============================================================================
// Rules (10-19)
// =============================================================================

/// Rules document failed to parse, validate, or compile.
pub const EXIT_RULES_INVALID: u8 = 10;

/// Rules document could not be read from disk.
pub const EXIT_RULES_IO: u8 = 11;

// =============================================================================
// Engine Error Mapping
// =============================================================================

/// Map a RouteError to its exit code.
pub fn route_exit_code(err: &RouteError) -> u8 {
    if err.is_config() {
        return EXIT_RULES_INVALID;
    }
    match err {
        RouteError::MissingColumn { .. }
        | RouteError::NumberParse { .. }
        | RouteError::EmptyField { .. }
        | RouteError::OutOfRange { .. }
        | RouteError::DateParse { .. }
        | RouteError::Csv { .. } => EXIT_ANALYZE_DATA,
        _ => EXIT_ERROR,
    }
}
