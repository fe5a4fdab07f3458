//! # paramval-cli: Command-Line Front End
//!
//! Provides the `paramval` binary for checking a data document against a
//! rule set file without writing any Rust.
//!
//! ## Subcommands
//!
//! - `paramval check`: validate a data file against a rules file.
//! - `paramval rules`: list the rule and message names the built-in
//!   registry knows.
//!
//! ```bash
//! paramval check --rules payment.rules.yaml --data payment.json
//! paramval check --rules batch.rules.json --data batch.yaml --strict --format json
//! paramval rules
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: the data satisfies every rule.
//! - `1`: at least one rule failed.
//! - `2`: the files could not be read, parsed, or compiled.

pub mod check;
pub mod load;
pub mod rules;

/// Exit code when every rule passes.
pub const EXIT_OK: u8 = 0;

/// Exit code when the data violates at least one rule.
pub const EXIT_INVALID: u8 = 1;

/// Exit code for unreadable or malformed input.
pub const EXIT_ERROR: u8 = 2;
