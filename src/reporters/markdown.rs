//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for chart notes, wikis and pull request comments.

use super::Report;
use crate::catalog::LabTestDefinition;
use crate::models::{BatchReport, EvaluationResult, SignificanceLevel, TestListing};
use anyhow::Result;

/// Render report as GitHub-flavored Markdown
pub fn render(report: Report<'_>) -> Result<String> {
    Ok(match report {
        Report::Result(result) => render_result(result),
        Report::Batch(batch) => render_batch(batch),
        Report::Tests(listing) => render_tests(listing),
        Report::Rules(test) => render_rules(test),
    })
}

fn level_emoji(level: SignificanceLevel) -> &'static str {
    match level {
        SignificanceLevel::Normal => "🟢",
        SignificanceLevel::LikelyInsignificant => "⚪",
        SignificanceLevel::PossiblySignificant => "🟡",
        SignificanceLevel::ClinicallySignificant => "🟠",
        SignificanceLevel::Critical => "🔴",
    }
}

/// Pipes would end the table cell
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

fn render_result(result: &EvaluationResult) -> String {
    let mut md = format!(
        "## {} {}: {} {}\n\n",
        level_emoji(result.significance),
        cell(&result.test_name),
        result.value,
        cell(&result.unit)
    );
    md.push_str("| Field | Value |\n|-------|-------|\n");
    md.push_str(&format!(
        "| Significance | **{}** ({}/5) |\n",
        result.significance.label(),
        result.significance.ordinal()
    ));
    md.push_str(&format!(
        "| Reference range | {} |\n",
        cell(&result.reference_range)
    ));
    md.push_str(&format!(
        "| Clinical pearl | {} |\n",
        cell(&result.clinical_pearl)
    ));
    md.push_str(&format!("| Action | {} |\n", cell(&result.action)));
    md.push_str(&format!("| Rule | `{}` |\n", result.matched_rule));
    md.push_str(&format!(
        "\n*Evaluated {}*\n",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md
}

fn render_batch(batch: &BatchReport) -> String {
    let mut md = String::from("## Lab Results\n\n");
    md.push_str(&format!("**{}**\n\n", batch.summary.message));

    if batch.results.is_empty() {
        md.push_str("_No values submitted._\n");
        return md;
    }

    md.push_str("| # | Test | Value | Significance | Clinical pearl | Action |\n");
    md.push_str("|---|------|-------|--------------|----------------|--------|\n");
    for (i, entry) in batch.results.iter().enumerate() {
        match entry {
            Ok(r) => md.push_str(&format!(
                "| {} | {} | {} {} | {} {} | {} | {} |\n",
                i + 1,
                cell(&r.test_name),
                r.value,
                cell(&r.unit),
                level_emoji(r.significance),
                r.significance.label(),
                cell(&r.clinical_pearl),
                cell(&r.action)
            )),
            Err(err) => md.push_str(&format!(
                "| {} | - | - | ❌ Error | {} | - |\n",
                i + 1,
                cell(&err.to_string())
            )),
        }
    }

    let summary = &batch.summary;
    md.push_str("\n| Significance | Count |\n|--------------|-------|\n");
    for level in SignificanceLevel::ALL.iter().rev() {
        md.push_str(&format!(
            "| {} {} | {} |\n",
            level_emoji(*level),
            level.label(),
            summary.count(*level)
        ));
    }
    if summary.error_count > 0 {
        md.push_str(&format!("| ❌ Error | {} |\n", summary.error_count));
    }
    md
}

fn render_tests(listing: &TestListing) -> String {
    let mut md = String::from("## Lab Tests\n\n");
    md.push_str("| Key | Name | Unit | Reference range | Aliases |\n");
    md.push_str("|-----|------|------|-----------------|---------|\n");
    for test in &listing.0 {
        let aliases: Vec<String> = test.aliases.iter().map(|a| format!("`{a}`")).collect();
        md.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            test.key,
            cell(&test.name),
            cell(&test.unit),
            cell(&test.reference_range),
            aliases.join(", ")
        ));
    }
    md
}

fn render_rules(test: &LabTestDefinition) -> String {
    let table = test.evaluator().rules();
    let mut md = format!(
        "## {} rules\n\nUnit: {}. Reference range: {}. First matching rule wins.\n\n",
        cell(&test.name),
        cell(&test.unit),
        cell(&test.reference_range)
    );
    md.push_str("| # | Rule | Condition | Significance | Clinical pearl | Action |\n");
    md.push_str("|---|------|-----------|--------------|----------------|--------|\n");
    for (i, rule) in table.rules.iter().enumerate() {
        md.push_str(&format!(
            "| {} | `{}` | `{}` | {} {} | {} | {} |\n",
            i + 1,
            rule.id,
            rule.condition,
            level_emoji(rule.level),
            rule.level.label(),
            cell(rule.pearl),
            cell(rule.action)
        ));
    }
    let fallback = &table.fallback;
    md.push_str(&format!(
        "| - | `{}` | otherwise | {} {} | {} | {} |\n",
        fallback.id,
        level_emoji(fallback.level),
        fallback.level.label(),
        cell(fallback.pearl),
        cell(fallback.action)
    ));
    md
}
