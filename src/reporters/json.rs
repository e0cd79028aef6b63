//! JSON reporter
//!
//! Emits the serde shapes of the library types, pretty-printed.
//! Rule tables have no wire type of their own and are built here.

use super::Report;
use crate::catalog::LabTestDefinition;
use anyhow::Result;
use serde_json::{json, Value};

/// Render report as JSON
pub fn render(report: Report<'_>) -> Result<String> {
    let out = match report {
        Report::Result(result) => serde_json::to_string_pretty(result)?,
        Report::Batch(batch) => serde_json::to_string_pretty(batch)?,
        Report::Tests(listing) => serde_json::to_string_pretty(listing)?,
        Report::Rules(test) => serde_json::to_string_pretty(&rules_value(test))?,
    };
    Ok(out)
}

fn rules_value(test: &LabTestDefinition) -> Value {
    let table = test.evaluator().rules();
    let rules: Vec<Value> = table
        .rules
        .iter()
        .map(|rule| {
            json!({
                "id": rule.id,
                "condition": rule.condition,
                "significance": rule.level,
                "clinical_pearl": rule.pearl,
                "action": rule.action,
            })
        })
        .collect();
    json!({
        "test_key": test.key,
        "test_name": test.name,
        "unit": test.unit,
        "reference_range": test.reference_range,
        "rules": rules,
        "fallback": {
            "id": table.fallback.id,
            "significance": table.fallback.level,
            "clinical_pearl": table.fallback.pearl,
            "action": table.fallback.action,
        },
    })
}
