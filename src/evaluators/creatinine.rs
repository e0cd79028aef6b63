//! Creatinine evaluator with sex- and age-adjusted upper bounds

use super::base::{Evaluator, Fallback, Rule, RuleSet};
use crate::models::{PatientContext, Sex, SignificanceLevel};

pub struct CreatinineEvaluator;

/// Age at which the normal upper bound is relaxed
const ELDERLY_AGE: u32 = 65;

/// Upper bound of the normal range for this patient.
///
/// `None` when sex is unknown: there is no normal band in that case.
fn normal_upper_bound(ctx: &PatientContext) -> Option<f64> {
    let elderly = ctx.age >= ELDERLY_AGE;
    match ctx.sex {
        Sex::Female if elderly => Some(1.3),
        Sex::Female => Some(1.1),
        Sex::Male if elderly => Some(1.5),
        Sex::Male => Some(1.3),
        Sex::Unknown => None,
    }
}

static RULES: RuleSet = RuleSet {
    rules: &[
        Rule {
            id: "normal",
            condition: "value <= upper bound (F <65: 1.1, F >=65: 1.3, M <65: 1.3, M >=65: 1.5)",
            level: SignificanceLevel::Normal,
            pearl: "Normal kidney function",
            action: "No action needed",
            guard: |v, c| normal_upper_bound(c).is_some_and(|upper| v <= upper),
        },
        Rule {
            id: "critical",
            condition: "value > 4.0",
            level: SignificanceLevel::Critical,
            pearl: "Severe kidney dysfunction",
            action: "Urgent nephrology consultation",
            guard: |v, _| v > 4.0,
        },
        Rule {
            id: "significant_impairment",
            condition: "value > 2.0",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Significant kidney impairment",
            action: "Nephrology evaluation recommended",
            guard: |v, _| v > 2.0,
        },
    ],
    fallback: Fallback {
        id: "mild_elevation",
        level: SignificanceLevel::PossiblySignificant,
        pearl: "Mild elevation - monitor trend",
        action: "Repeat in 1-2 weeks, check trend",
    },
};

impl Evaluator for CreatinineEvaluator {
    fn key(&self) -> &'static str {
        "creatinine"
    }

    fn display_name(&self) -> &'static str {
        "Creatinine"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cr", "creat", "creatinine"]
    }

    fn unit(&self) -> &'static str {
        "mg/dL"
    }

    fn reference_range(&self) -> &'static str {
        "M: 0.7-1.3, F: 0.6-1.1"
    }

    fn rules(&self) -> &'static RuleSet {
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SignificanceLevel::*;

    fn level(value: f64, sex: Sex, age: u32) -> SignificanceLevel {
        let ctx = PatientContext::default().with_sex(sex).with_age(age);
        CreatinineEvaluator.assess(value, &ctx).level
    }

    #[test]
    fn test_upper_bounds() {
        let ctx = PatientContext::default();
        assert_eq!(normal_upper_bound(&ctx.with_sex(Sex::Female).with_age(30)), Some(1.1));
        assert_eq!(normal_upper_bound(&ctx.with_sex(Sex::Female).with_age(65)), Some(1.3));
        assert_eq!(normal_upper_bound(&ctx.with_sex(Sex::Male).with_age(64)), Some(1.3));
        assert_eq!(normal_upper_bound(&ctx.with_sex(Sex::Male).with_age(80)), Some(1.5));
        assert_eq!(normal_upper_bound(&ctx), None);
    }

    #[test]
    fn test_age_adjusted_normal() {
        assert_eq!(level(1.2, Sex::Female, 75), Normal);
        assert_eq!(level(1.2, Sex::Female, 30), PossiblySignificant);
        assert_eq!(level(1.1, Sex::Female, 30), Normal);
        assert_eq!(level(1.1, Sex::Male, 35), Normal);
        assert_eq!(level(1.5, Sex::Male, 70), Normal);
        assert_eq!(level(1.6, Sex::Male, 35), PossiblySignificant);
    }

    #[test]
    fn test_elevations() {
        assert_eq!(level(2.5, Sex::Female, 30), ClinicallySignificant);
        assert_eq!(level(2.0, Sex::Female, 30), PossiblySignificant);
        assert_eq!(level(4.0, Sex::Male, 45), ClinicallySignificant);
        assert_eq!(level(4.5, Sex::Male, 45), Critical);
    }

    #[test]
    fn test_unknown_sex_has_no_normal_band() {
        assert_eq!(level(0.8, Sex::Unknown, 30), PossiblySignificant);
        assert_eq!(level(3.0, Sex::Unknown, 30), ClinicallySignificant);
        assert_eq!(level(5.0, Sex::Unknown, 30), Critical);
    }
}
