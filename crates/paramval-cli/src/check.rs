//! # Check Subcommand
//!
//! Validates one data document against one rule set and prints the
//! outcome: `ok`, or every failure in discovery order.
//!
//! ```bash
//! paramval check --rules payment.rules.yaml --data payment.json
//! paramval check --rules rules.json --data data.json --config paramval.yaml --strict
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use paramval::{Engine, EngineOptions, Error, RuleRegistry, ValidationError};

use crate::load::{load_data, load_options, load_rules};
use crate::{EXIT_INVALID, EXIT_OK};

/// Output format for reports.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One failure message per line.
    #[default]
    Text,
    /// The structured report as pretty-printed JSON.
    Json,
}

/// Arguments for `paramval check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Rule set file (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    pub rules: PathBuf,

    /// Data document to validate.
    #[arg(long)]
    pub data: PathBuf,

    /// Engine options file (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Treat unknown rule names as errors. Overrides the config file.
    #[arg(long)]
    pub strict: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of a check: what to print and how to exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Rendered report, or `ok`.
    pub output: String,
    /// Process exit code: [`EXIT_OK`] or [`EXIT_INVALID`].
    pub exit_code: u8,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let outcome = check(args)?;
    println!("{}", outcome.output);
    Ok(outcome.exit_code)
}

/// Load the files named by `args`, validate, and render the outcome.
///
/// # Errors
///
/// Fails when a file cannot be read or parsed, when the rule set does not
/// compile, or when strict mode meets an unknown rule name. Data that
/// violates rules is not an error: it yields [`EXIT_INVALID`].
pub fn check(args: &CheckArgs) -> Result<CheckOutcome> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => EngineOptions::default(),
    };
    if args.strict {
        options = EngineOptions::strict();
    }

    let rules = load_rules(&args.rules)?;
    let data = load_data(&args.data)?;

    let registry = RuleRegistry::new();
    match Engine::with_options(&registry, options).validate(&data, &rules) {
        Ok(()) => {
            tracing::info!(rules = %args.rules.display(), "data is valid");
            Ok(CheckOutcome {
                output: render_ok(args.format),
                exit_code: EXIT_OK,
            })
        }
        Err(Error::Invalid(report)) => {
            tracing::info!(failures = report.len(), "data is invalid");
            Ok(CheckOutcome {
                output: render_report(&report, args.format)?,
                exit_code: EXIT_INVALID,
            })
        }
        Err(other) => Err(other.into()),
    }
}

fn render_ok(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => "ok".to_string(),
        OutputFormat::Json => serde_json::json!({"valid": true}).to_string(),
    }
}

/// Render a report. Text lists each failure as `key (rule): message`,
/// with per-element failures of structural rules indented beneath it.
pub fn render_report(report: &ValidationError, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = report.to_json();
            if let Some(obj) = json.as_object_mut() {
                obj.insert("valid".to_string(), serde_json::Value::Bool(false));
            }
            Ok(serde_json::to_string_pretty(&json)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, failure) in report.failures().iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                write!(out, "{} ({}): {}", failure.key, failure.rule, failure.message)?;
                for element in &failure.elements {
                    for inner in &element.failures {
                        write!(
                            out,
                            "\n  [{}] {} ({}): {}",
                            element.index, inner.key, inner.rule, inner.message
                        )?;
                    }
                }
            }
            Ok(out)
        }
    }
}
