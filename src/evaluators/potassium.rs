//! Potassium evaluator - tight critical ranges, no context sensitivity

use super::base::{Evaluator, Fallback, Rule, RuleSet};
use crate::models::SignificanceLevel;

pub struct PotassiumEvaluator;

const CARDIAC_MONITORING: &str = "Immediate action required - cardiac monitoring";

static RULES: RuleSet = RuleSet {
    rules: &[
        Rule {
            id: "critical_low",
            condition: "value < 2.5",
            level: SignificanceLevel::Critical,
            pearl: "Severe hypokalemia - arrhythmia risk",
            action: CARDIAC_MONITORING,
            guard: |v, _| v < 2.5,
        },
        Rule {
            id: "critical_high",
            condition: "value >= 6.0",
            level: SignificanceLevel::Critical,
            pearl: "Severe hyperkalemia - arrhythmia risk",
            action: CARDIAC_MONITORING,
            guard: |v, _| v >= 6.0,
        },
        Rule {
            id: "significant_imbalance",
            condition: "value < 3.0 or value > 5.5",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Significant electrolyte imbalance",
            action: "Correction needed, monitor closely",
            guard: |v, _| v < 3.0 || v > 5.5,
        },
        Rule {
            id: "mild_imbalance",
            condition: "3.0 <= value <= 3.4 or 5.1 <= value <= 5.5",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Mild imbalance - recheck if hemolyzed sample suspected",
            action: "Consider repeat, monitor trend",
            guard: |v, _| (3.0..=3.4).contains(&v) || (5.1..=5.5).contains(&v),
        },
    ],
    fallback: Fallback {
        id: "normal",
        level: SignificanceLevel::Normal,
        pearl: "Normal potassium level",
        action: "No action needed",
    },
};

impl Evaluator for PotassiumEvaluator {
    fn key(&self) -> &'static str {
        "potassium"
    }

    fn display_name(&self) -> &'static str {
        "Potassium"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["k", "k+", "potassium"]
    }

    fn unit(&self) -> &'static str {
        "mEq/L"
    }

    fn reference_range(&self) -> &'static str {
        "3.5-5.0"
    }

    fn rules(&self) -> &'static RuleSet {
        &RULES
    }
}
