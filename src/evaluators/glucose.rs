//! Glucose evaluator; fasting and random samples use different thresholds

use super::base::{Evaluator, Fallback, Rule, RuleSet};
use crate::models::SignificanceLevel;

pub struct GlucoseEvaluator;

const PREDIABETES_ACTION: &str = "Lifestyle counseling, monitor trend, consider HbA1c";

// The two fasting prediabetes rows share an outcome level but keep their
// own wording. Fasting values strictly between 109 and 110 match neither.
static RULES: RuleSet = RuleSet {
    rules: &[
        Rule {
            id: "critical_high",
            condition: "value > 400",
            level: SignificanceLevel::Critical,
            pearl: "Severe hyperglycemia - DKA risk",
            action: "Immediate evaluation for DKA/HHS",
            guard: |v, _| v > 400.0,
        },
        Rule {
            id: "critical_low",
            condition: "value < 50",
            level: SignificanceLevel::Critical,
            pearl: "Severe hypoglycemia",
            action: "Immediate treatment required",
            guard: |v, _| v < 50.0,
        },
        Rule {
            id: "fasting_diabetic",
            condition: "fasting and value >= 126",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Diabetes diagnostic threshold",
            action: "Diabetes workup recommended",
            guard: |v, c| c.fasting && v >= 126.0,
        },
        Rule {
            id: "fasting_prediabetes",
            condition: "fasting and 100 <= value <= 109",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Impaired fasting glucose - prediabetes range",
            action: PREDIABETES_ACTION,
            guard: |v, c| c.fasting && (100.0..=109.0).contains(&v),
        },
        Rule {
            id: "fasting_upper_prediabetes",
            condition: "fasting and value >= 110",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Impaired fasting glucose - upper prediabetes range",
            action: PREDIABETES_ACTION,
            guard: |v, c| c.fasting && v >= 110.0,
        },
        Rule {
            id: "random_diabetic",
            condition: "not fasting and value >= 200",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Random glucose suggests diabetes",
            action: "Fasting glucose or HbA1c needed",
            guard: |v, c| !c.fasting && v >= 200.0,
        },
    ],
    fallback: Fallback {
        id: "normal",
        level: SignificanceLevel::Normal,
        pearl: "Normal glucose level",
        action: "No action needed",
    },
};

impl Evaluator for GlucoseEvaluator {
    fn key(&self) -> &'static str {
        "glucose"
    }

    fn display_name(&self) -> &'static str {
        "Glucose"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["gluc", "glucose", "bg", "blood glucose"]
    }

    fn unit(&self) -> &'static str {
        "mg/dL"
    }

    fn reference_range(&self) -> &'static str {
        "Fasting: 70-99, Random: <140"
    }

    fn rules(&self) -> &'static RuleSet {
        &RULES
    }
}
