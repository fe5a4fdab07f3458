//! Rules subcommand: lists the rule and message names the built-in
//! registry knows.

use anyhow::Result;
use clap::Args;

use paramval::RuleRegistry;

use crate::check::OutputFormat;
use crate::EXIT_OK;

/// Arguments for `paramval rules`.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Listing format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the rules subcommand.
pub fn run_rules(args: &RulesArgs) -> Result<u8> {
    println!("{}", render_rules(&RuleRegistry::new(), args.format)?);
    Ok(EXIT_OK)
}

/// Render the validator and message names of `registry`.
pub fn render_rules(registry: &RuleRegistry, format: OutputFormat) -> Result<String> {
    let validators = registry.validator_names();
    let messages = registry.message_names();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "validators": validators,
            "messages": messages,
        }))?),
        OutputFormat::Text => {
            let mut lines = vec![format!("Validators ({}):", validators.len())];
            lines.extend(validators.iter().map(|name| format!("  {name}")));
            lines.push(String::new());
            lines.push(format!("Messages ({}):", messages.len()));
            lines.extend(messages.iter().map(|name| format!("  {name}")));
            Ok(lines.join("\n"))
        }
    }
}
