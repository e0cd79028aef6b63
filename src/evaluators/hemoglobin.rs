//! Hemoglobin evaluator
//!
//! Critical bounds apply to everyone. Female and male bands come next; a
//! value that slips between two sex-specific bands (female 11.9-12.0, male
//! 13.4-13.5) falls through to the unknown-sex bands at the bottom.
//!
//! Age is accepted in the patient context but no band depends on it.

use super::base::{Evaluator, Fallback, Rule, RuleSet};
use crate::models::{Sex, SignificanceLevel};

pub struct HemoglobinEvaluator;

const NO_ACTION: &str = "No action needed";

static RULES: RuleSet = RuleSet {
    rules: &[
        Rule {
            id: "critical_low",
            condition: "value < 7.0",
            level: SignificanceLevel::Critical,
            pearl: "Severe anemia - transfusion may be needed",
            action: "Immediate evaluation required",
            guard: |v, _| v < 7.0,
        },
        Rule {
            id: "critical_high",
            condition: "value > 18.0",
            level: SignificanceLevel::Critical,
            pearl: "Severe polycythemia - check for hyperviscosity",
            action: "Immediate evaluation required",
            guard: |v, _| v > 18.0,
        },
        Rule {
            id: "female_mild_anemia",
            condition: "female and 11.5 <= value <= 11.9",
            level: SignificanceLevel::LikelyInsignificant,
            pearl: "Mild anemia - common in menstruating women",
            action: "Consider iron studies if symptoms present",
            guard: |v, c| c.sex == Sex::Female && (11.5..=11.9).contains(&v),
        },
        Rule {
            id: "female_moderate_anemia",
            condition: "female and 10.0 <= value < 11.5",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Moderate anemia - investigate cause",
            action: "Iron studies, B12/folate recommended",
            guard: |v, c| c.sex == Sex::Female && (10.0..11.5).contains(&v),
        },
        Rule {
            id: "female_significant_anemia",
            condition: "female and value < 10.0",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Significant anemia requiring evaluation",
            action: "Comprehensive anemia workup needed",
            guard: |v, c| c.sex == Sex::Female && v < 10.0,
        },
        Rule {
            id: "female_normal",
            condition: "female and value >= 12.0",
            level: SignificanceLevel::Normal,
            pearl: "Normal hemoglobin for female",
            action: NO_ACTION,
            guard: |v, c| c.sex == Sex::Female && v >= 12.0,
        },
        Rule {
            id: "male_borderline_low",
            condition: "male and 13.0 <= value <= 13.4",
            level: SignificanceLevel::PossiblySignificant,
            pearl: "Borderline low for male - monitor trend",
            action: "Consider repeat if symptomatic",
            guard: |v, c| c.sex == Sex::Male && (13.0..=13.4).contains(&v),
        },
        Rule {
            id: "male_anemia",
            condition: "male and value < 13.0",
            level: SignificanceLevel::ClinicallySignificant,
            pearl: "Anemia in male - needs investigation",
            action: "Comprehensive anemia workup recommended",
            guard: |v, c| c.sex == Sex::Male && v < 13.0,
        },
        Rule {
            id: "male_normal",
            condition: "male and value >= 13.5",
            level: SignificanceLevel::Normal,
            pearl: "Normal hemoglobin for male",
            action: NO_ACTION,
            guard: |v, c| c.sex == Sex::Male && v >= 13.5,
        },
        Rule {
            id: "general_normal",
            condition: "12.0 <= value <= 16.0",
            level: SignificanceLevel::Normal,
            pearl: "Within normal range",
            action: NO_ACTION,
            guard: |v, _| (12.0..=16.0).contains(&v),
        },
    ],
    fallback: Fallback {
        id: "general_abnormal",
        level: SignificanceLevel::PossiblySignificant,
        pearl: "Abnormal value - consider clinical context",
        action: "Clinical correlation recommended",
    },
};

impl Evaluator for HemoglobinEvaluator {
    fn key(&self) -> &'static str {
        "hemoglobin"
    }

    fn display_name(&self) -> &'static str {
        "Hemoglobin"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["hgb", "hb", "hemoglobin", "haemoglobin"]
    }

    fn unit(&self) -> &'static str {
        "g/dL"
    }

    fn reference_range(&self) -> &'static str {
        "M: 13.5-17.5, F: 12.0-15.5"
    }

    fn rules(&self) -> &'static RuleSet {
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientContext;

    fn assess(value: f64, sex: Sex) -> (SignificanceLevel, &'static str) {
        let a = HemoglobinEvaluator.assess(value, &PatientContext::default().with_sex(sex));
        (a.level, a.rule)
    }

    #[test]
    fn test_critical_bounds_ignore_sex() {
        for sex in [Sex::Female, Sex::Male, Sex::Unknown] {
            assert_eq!(assess(6.9, sex), (SignificanceLevel::Critical, "critical_low"));
            assert_eq!(assess(18.1, sex), (SignificanceLevel::Critical, "critical_high"));
        }
        // Boundaries themselves are not critical
        assert_ne!(assess(7.0, Sex::Female).0, SignificanceLevel::Critical);
        assert_ne!(assess(18.0, Sex::Male).0, SignificanceLevel::Critical);
    }

    #[test]
    fn test_female_bands() {
        use SignificanceLevel::*;
        assert_eq!(assess(11.8, Sex::Female).0, LikelyInsignificant);
        assert_eq!(assess(11.5, Sex::Female).0, LikelyInsignificant);
        assert_eq!(assess(11.9, Sex::Female).0, LikelyInsignificant);
        assert_eq!(assess(11.49, Sex::Female).0, PossiblySignificant);
        assert_eq!(assess(10.0, Sex::Female).0, PossiblySignificant);
        assert_eq!(assess(9.5, Sex::Female).0, ClinicallySignificant);
        assert_eq!(assess(12.0, Sex::Female).0, Normal);
        assert_eq!(assess(17.5, Sex::Female), (Normal, "female_normal"));
    }

    #[test]
    fn test_female_gap_falls_through_to_general_bands() {
        assert_eq!(
            assess(11.95, Sex::Female),
            (SignificanceLevel::PossiblySignificant, "general_abnormal")
        );
    }

    #[test]
    fn test_male_bands() {
        use SignificanceLevel::*;
        assert_eq!(assess(13.2, Sex::Male).0, PossiblySignificant);
        assert_eq!(assess(13.0, Sex::Male).0, PossiblySignificant);
        assert_eq!(assess(13.4, Sex::Male).0, PossiblySignificant);
        assert_eq!(assess(12.5, Sex::Male).0, ClinicallySignificant);
        assert_eq!(assess(13.5, Sex::Male).0, Normal);
        assert_eq!(assess(14.5, Sex::Male), (Normal, "male_normal"));
    }

    #[test]
    fn test_male_gap_falls_through_to_general_bands() {
        assert_eq!(
            assess(13.45, Sex::Male),
            (SignificanceLevel::Normal, "general_normal")
        );
    }

    #[test]
    fn test_unknown_sex_bands() {
        use SignificanceLevel::*;
        assert_eq!(assess(12.0, Sex::Unknown), (Normal, "general_normal"));
        assert_eq!(assess(16.0, Sex::Unknown), (Normal, "general_normal"));
        assert_eq!(assess(11.99, Sex::Unknown).0, PossiblySignificant);
        assert_eq!(assess(16.01, Sex::Unknown).0, PossiblySignificant);
    }

    #[test]
    fn test_age_does_not_change_outcome() {
        let young = PatientContext::default().with_sex(Sex::Female).with_age(20);
        let old = young.with_age(90);
        for v in [6.0, 10.5, 11.7, 12.3, 19.0] {
            assert_eq!(
                HemoglobinEvaluator.assess(v, &young),
                HemoglobinEvaluator.assess(v, &old)
            );
        }
    }
}
