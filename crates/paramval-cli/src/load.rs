//! Loading rule sets, data documents, and engine options from disk.
//!
//! The document format follows the file extension: `.yaml` and `.yml`
//! are YAML, anything else is JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use paramval::value::yaml_str_to_data;
use paramval::{EngineOptions, RuleSet};

/// On-disk document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON, the default for any extension other than YAML's.
    Json,
    /// YAML, for `.yaml` and `.yml` files.
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse a document into validation data. YAML keys that are numbers or
/// booleans are stringified.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Yaml => yaml_str_to_data(text).map_err(anyhow::Error::msg),
    }
}

/// Load a data document.
pub fn load_data(path: &Path) -> Result<Value> {
    let text = read(path)?;
    parse_document(&text, DocumentFormat::from_path(path))
        .with_context(|| format!("failed to parse data file {}", path.display()))
}

/// Load and compile a rule set.
pub fn load_rules(path: &Path) -> Result<RuleSet> {
    let text = read(path)?;
    let rules = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => RuleSet::from_json_str(&text),
        DocumentFormat::Yaml => RuleSet::from_yaml_str(&text),
    };
    let rules = rules.with_context(|| format!("invalid rule set in {}", path.display()))?;
    tracing::debug!(path = %path.display(), fields = rules.len(), "loaded rule set");
    Ok(rules)
}

/// Load engine options from a YAML config file. JSON is accepted too,
/// being a subset of YAML.
pub fn load_options(path: &Path) -> Result<EngineOptions> {
    let text = read(path)?;
    EngineOptions::from_yaml_str(&text)
        .with_context(|| format!("invalid config file {}", path.display()))
}
