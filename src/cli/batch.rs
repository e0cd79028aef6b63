//! Batch command - grade many lab values against one patient context

use super::{check_fail_threshold, ContextArgs, OutputArgs, Session};
use anyhow::{bail, Context, Result};
use labsig::models::{BatchItem, ContextOverrides, RawValue};
use labsig::reporters::{self, Report};
use labsig::ClinicalSignificanceEngine;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Accepted input documents
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchInput {
    Items(Vec<BatchItem>),
    Request {
        #[serde(alias = "items")]
        lab_values: Vec<BatchItem>,
        #[serde(default)]
        patient_context: ContextOverrides,
    },
}

impl BatchInput {
    fn into_parts(self) -> (Vec<BatchItem>, ContextOverrides) {
        match self {
            BatchInput::Items(items) => (items, ContextOverrides::default()),
            BatchInput::Request {
                lab_values,
                patient_context,
            } => (lab_values, patient_context),
        }
    }
}

/// Run the batch command
pub fn run(
    engine: &ClinicalSignificanceEngine,
    session: &Session,
    file: Option<&Path>,
    extra: &[String],
    context: &ContextArgs,
    output: &OutputArgs,
) -> Result<()> {
    let format = session.format(output.format.as_deref())?;

    let (mut items, file_context) = match file {
        Some(path) => parse_input(&read_input(path)?)
            .with_context(|| format!("Invalid batch input in {}", path.display()))?,
        None => (Vec::new(), ContextOverrides::default()),
    };
    for item in extra {
        items.push(parse_item(item)?);
    }
    if items.is_empty() {
        bail!("No lab values given. Pass a JSON file, '-' for stdin, or --item TEST=VALUE");
    }

    // config < file < flags
    let mut overrides = file_context;
    overrides.merge(&context.overrides());
    let ctx = session.context(&overrides);
    debug!(?ctx, items = items.len(), "effective patient context");

    let batch = engine.evaluate_batch(&items, &ctx)?;

    let out = reporters::report_with_format(Report::Batch(&batch), format, session.color)?;
    println!("{}", out.trim_end());

    check_fail_threshold(output.fail_on, batch.max_significance())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read batch input from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_input(content: &str) -> Result<(Vec<BatchItem>, ContextOverrides)> {
    let input: BatchInput = serde_json::from_str(content).context(
        "expected a JSON array of {test_name, value} items or {\"lab_values\": [...], \"patient_context\": {...}}",
    )?;
    Ok(input.into_parts())
}

/// Parse `TEST=VALUE`
fn parse_item(arg: &str) -> Result<BatchItem> {
    let Some((test, value)) = arg.split_once('=') else {
        bail!("Invalid --item '{}': expected TEST=VALUE", arg);
    };
    Ok(BatchItem::new(test.trim(), RawValue::Text(value.to_string())))
}
