//! Text (terminal) reporter with colors and formatting

use super::Report;
use crate::catalog::LabTestDefinition;
use crate::models::{BatchReport, EvaluationResult, SignificanceLevel, TestListing};
use anyhow::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ERROR: &str = "\x1b[35m"; // Magenta

const RULE_LINE: &str = "──────────────────────────────────────";

/// Level colors (ANSI escape codes)
fn level_color(level: SignificanceLevel) -> &'static str {
    match level {
        SignificanceLevel::Normal => "\x1b[32m",                // Green
        SignificanceLevel::LikelyInsignificant => "\x1b[90m",   // Gray
        SignificanceLevel::PossiblySignificant => "\x1b[33m",   // Yellow
        SignificanceLevel::ClinicallySignificant => "\x1b[91m", // Light red
        SignificanceLevel::Critical => "\x1b[31m",              // Red
    }
}

/// Escape codes that collapse to nothing when color is off
#[derive(Clone, Copy)]
struct Style {
    color: bool,
}

impl Style {
    fn code(self, code: &'static str) -> &'static str {
        if self.color {
            code
        } else {
            ""
        }
    }

    fn bold(self) -> &'static str {
        self.code(BOLD)
    }

    fn dim(self) -> &'static str {
        self.code(DIM)
    }

    fn reset(self) -> &'static str {
        self.code(RESET)
    }

    fn level(self, level: SignificanceLevel) -> &'static str {
        self.code(level_color(level))
    }
}

/// Render report as formatted terminal output
pub fn render(report: Report<'_>, color: bool) -> Result<String> {
    let style = Style { color };
    Ok(match report {
        Report::Result(result) => render_result(result, style),
        Report::Batch(batch) => render_batch(batch, style),
        Report::Tests(listing) => render_tests(listing, style),
        Report::Rules(test) => render_rules(test, style),
    })
}

fn render_result(result: &EvaluationResult, s: Style) -> String {
    let (b, d, r) = (s.bold(), s.dim(), s.reset());
    let lc = s.level(result.significance);
    let mut out = String::new();

    out.push_str(&format!(
        "\n{b}{}{r}  {} {}\n",
        result.test_name, result.value, result.unit
    ));
    out.push_str(&format!("{d}{RULE_LINE}{r}\n"));
    out.push_str(&format!(
        "Significance: {lc}{b}{}{r} {d}({}/5){r}\n",
        result.significance.label(),
        result.significance.ordinal()
    ));
    out.push_str(&format!("Reference:    {}\n", result.reference_range));
    out.push_str(&format!("Pearl:        {}\n", result.clinical_pearl));
    out.push_str(&format!("Action:       {}\n", result.action));
    out.push_str(&format!("{d}Rule:         {}{r}\n", result.matched_rule));
    out
}

fn render_batch(batch: &BatchReport, s: Style) -> String {
    let (b, d, r) = (s.bold(), s.dim(), s.reset());
    let mut out = String::new();

    out.push_str(&format!("\n{b}BATCH{r} ({} values)\n", batch.results.len()));
    if !batch.results.is_empty() {
        out.push_str(&format!(
            "{d}  #   TEST          VALUE            SIGNIFICANCE             NOTE{r}\n"
        ));
        out.push_str(&format!(
            "{d}  ─────────────────────────────────────────────────────────────────────────{r}\n"
        ));
    }

    for (i, entry) in batch.results.iter().enumerate() {
        match entry {
            Ok(result) => {
                let lc = s.level(result.significance);
                let value = format!("{} {}", result.value, result.unit);
                out.push_str(&format!(
                    "  {d}{:>3}{r}  {:<12}  {:<15}  {lc}{:<23}{r}  {}\n",
                    i + 1,
                    truncate(&result.test_name, 12),
                    value,
                    result.significance.label(),
                    truncate(&result.clinical_pearl, 40),
                ));
            }
            Err(err) => {
                out.push_str(&format!(
                    "  {d}{:>3}{r}  {:<12}  {:<15}  {}{:<23}{r}  {}\n",
                    i + 1,
                    "-",
                    "-",
                    s.code(ERROR),
                    "error",
                    err,
                ));
            }
        }
    }

    let summary = &batch.summary;
    out.push('\n');
    out.push_str(&format!("{b}SUMMARY{r}  {}\n", summary.message));

    let mut parts = Vec::new();
    for level in SignificanceLevel::ALL.iter().rev() {
        let n = summary.count(*level);
        if n > 0 {
            parts.push(format!("{}{} {}{r}", s.level(*level), n, level.label().to_lowercase()));
        }
    }
    if summary.error_count > 0 {
        parts.push(format!("{} failed", summary.error_count));
    }
    if !parts.is_empty() {
        out.push_str(&format!("  {}\n", parts.join(" | ")));
    }
    out
}

fn render_tests(listing: &TestListing, s: Style) -> String {
    let (b, d, r) = (s.bold(), s.dim(), s.reset());
    let mut out = String::new();

    out.push_str(&format!("\n{b}LAB TESTS{r} ({} total)\n", listing.0.len()));
    out.push_str(&format!(
        "{d}  KEY          NAME         UNIT      REFERENCE RANGE              ALIASES{r}\n"
    ));
    for test in &listing.0 {
        out.push_str(&format!(
            "  {:<11}  {:<11}  {:<8}  {:<27}  {d}{}{r}\n",
            test.key,
            truncate(&test.name, 11),
            test.unit,
            truncate(&test.reference_range, 27),
            test.aliases.join(", ")
        ));
    }
    out
}

fn render_rules(test: &LabTestDefinition, s: Style) -> String {
    let (b, d, r) = (s.bold(), s.dim(), s.reset());
    let table = test.evaluator().rules();
    let mut out = String::new();

    out.push_str(&format!(
        "\n{b}{}{r} ({}, {})\n",
        test.name, test.key, test.unit
    ));
    out.push_str(&format!("{d}Reference range: {}{r}\n", test.reference_range));
    out.push_str(&format!("{d}First matching rule wins.{r}\n\n"));

    for (i, rule) in table.rules.iter().enumerate() {
        out.push_str(&format!(
            "  {d}{:>2}{r}  {:<28}  {}{:<23}{r}  {}\n",
            i + 1,
            rule.id,
            s.level(rule.level),
            rule.level.label(),
            rule.condition
        ));
        out.push_str(&format!("      {d}{} / {}{r}\n", rule.pearl, rule.action));
    }

    let fallback = &table.fallback;
    out.push_str(&format!(
        "  {d} *{r}  {:<28}  {}{:<23}{r}  otherwise\n",
        fallback.id,
        s.level(fallback.level),
        fallback.level.label()
    ));
    out.push_str(&format!(
        "      {d}{} / {}{r}\n",
        fallback.pearl, fallback.action
    ));
    out
}

/// Truncate to `max` chars, adding an ellipsis. Char-based to stay UTF-8 safe.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{engine, test_batch, test_result};

    #[test]
    fn test_result_card() {
        let out = render(Report::Result(&test_result()), false).unwrap();
        assert!(out.contains("Hemoglobin  11.8 g/dL"));
        assert!(out.contains("Significance: Likely Insignificant (2/5)"));
        assert!(out.contains("Rule:         female_mild_anemia"));
    }

    #[test]
    fn test_no_color_has_no_escapes() {
        let batch = test_batch();
        for report in [Report::Result(&test_result()), Report::Batch(&batch)] {
            let out = render(report, false).unwrap();
            assert!(!out.contains('\x1b'), "{out}");
        }
    }

    #[test]
    fn test_color_uses_level_color() {
        let batch = test_batch();
        let out = render(Report::Batch(&batch), true).unwrap();
        assert!(out.contains("\x1b[31mCritical"));
    }

    #[test]
    fn test_batch_lists_errors_inline() {
        let out = render(Report::Batch(&test_batch()), false).unwrap();
        assert!(out.contains("Lab test \"sodium\" not recognized"));
        assert!(out.contains("SUMMARY  1 findings need review, 1 within normal limits"));
        assert!(out.contains("1 critical | 1 normal | 1 failed"));
    }

    #[test]
    fn test_tests_listing() {
        let out = render(Report::Tests(&engine().list_tests()), false).unwrap();
        assert!(out.contains("LAB TESTS (5 total)"));
        assert!(out.contains("k, k+, potassium"));
    }

    #[test]
    fn test_rules_show_order_and_fallback() {
        let test = engine().find_test("tsh").unwrap();
        let out = render(Report::Rules(test), false).unwrap();
        let first = out.find("overt_hypothyroidism").unwrap();
        let last = out.find("borderline").unwrap();
        assert!(first < last);
        assert!(out.contains("normal"));
        assert!(out.contains("otherwise"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
