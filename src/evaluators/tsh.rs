//! TSH evaluator

use super::base::{Evaluator, Fallback, Rule, RuleSet};
use crate::models::SignificanceLevel;

pub struct TshEvaluator;

static RULES: RuleSet = RuleSet {
    rules: &[
        Rule {
            id: "overt_hypothyroidism",
            condition: "value > 10.0",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Overt hypothyroidism",
            action: "Thyroid hormone replacement needed",
            guard: |v, _| v > 10.0,
        },
        Rule {
            id: "suppressed",
            condition: "value < 0.1",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Suppressed TSH - hyperthyroidism",
            action: "Free T4, T3 recommended",
            guard: |v, _| v < 0.1,
        },
        Rule {
            id: "borderline",
            condition: "value > 4.5 or value < 0.4",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Borderline thyroid function",
            action: "Consider repeat in 6-8 weeks",
            guard: |v, _| v > 4.5 || v < 0.4,
        },
    ],
    fallback: Fallback {
        id: "normal",
        level: SignificanceLevel::Normal,
        pearl: "Normal thyroid function",
        action: "No action needed",
    },
};

impl Evaluator for TshEvaluator {
    fn key(&self) -> &'static str {
        "tsh"
    }

    fn display_name(&self) -> &'static str {
        "TSH"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["tsh", "thyroid stimulating hormone"]
    }

    fn unit(&self) -> &'static str {
        "mIU/L"
    }

    fn reference_range(&self) -> &'static str {
        "0.4-4.0"
    }

    fn rules(&self) -> &'static RuleSet {
        &RULES
    }
}
