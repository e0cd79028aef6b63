//! Output reporters for labsig results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with per-level colors
//! - `json` - Machine-readable JSON (the wire shapes of the library types)
//! - `markdown` - GitHub-flavored Markdown tables

mod json;
mod markdown;
mod text;

use crate::catalog::LabTestDefinition;
use crate::models::{BatchReport, EvaluationResult, TestListing};
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Anything the CLI can print
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    Result(&'a EvaluationResult),
    Batch(&'a BatchReport),
    Tests(&'a TestListing),
    Rules(&'a LabTestDefinition),
}

/// Render a report using an OutputFormat enum. `color` only affects text output.
pub fn report_with_format(report: Report<'_>, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report, color),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::ClinicalSignificanceEngine;
    use crate::models::{BatchItem, PatientContext, Sex};

    pub(crate) fn engine() -> &'static ClinicalSignificanceEngine {
        ClinicalSignificanceEngine::shared().unwrap()
    }

    /// Female hemoglobin of 11.8
    pub(crate) fn test_result() -> EvaluationResult {
        let ctx = PatientContext::default().with_sex(Sex::Female);
        engine().evaluate("hgb", 11.8, &ctx).unwrap()
    }

    /// One critical, one normal, one unknown test
    pub(crate) fn test_batch() -> BatchReport {
        engine()
            .evaluate_batch(
                &[
                    BatchItem::new("k", 6.5),
                    BatchItem::new("tsh", 2.0),
                    BatchItem::new("sodium", 140),
                ],
                &PatientContext::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_format_display_round_trips() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown] {
            assert_eq!(OutputFormat::from_str(&format.to_string()).unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_format_lists_valid_ones() {
        let err = OutputFormat::from_str("xml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown format 'xml'. Valid formats: text, json, markdown"
        );
    }
}
