//! Lab test evaluators
//!
//! Each lab test is one `Evaluator`: static catalog data plus an ordered
//! decision table. The catalog selects an evaluator by alias; the engine
//! only ever talks to the trait.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            ClinicalSignificanceEngine        │
//! │  - resolves names through the Catalog        │
//! │  - parses the raw value                      │
//! │  - wraps the Assessment into a result        │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │                Evaluator trait               │
//! │  - key / aliases / unit / reference range    │
//! │  - rules(): ordered RuleSet, first match     │
//! │  - assess(value, context) -> Assessment      │
//! └──────────────────────────────────────────────┘
//! ```

mod base;
mod creatinine;
mod glucose;
mod hemoglobin;
mod potassium;
mod tsh;

pub use base::{Assessment, Evaluator, Fallback, Guard, Rule, RuleSet};
pub use creatinine::CreatinineEvaluator;
pub use glucose::GlucoseEvaluator;
pub use hemoglobin::HemoglobinEvaluator;
pub use potassium::PotassiumEvaluator;
pub use tsh::TshEvaluator;

use std::sync::Arc;

/// The built-in evaluators, in catalog order
pub fn standard_evaluators() -> Vec<Arc<dyn Evaluator>> {
    vec![
        Arc::new(HemoglobinEvaluator),
        Arc::new(CreatinineEvaluator),
        Arc::new(PotassiumEvaluator),
        Arc::new(GlucoseEvaluator),
        Arc::new(TshEvaluator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientContext, Sex};

    #[test]
    fn test_standard_keys_in_order() {
        let keys: Vec<_> = standard_evaluators().iter().map(|e| e.key()).collect();
        assert_eq!(
            keys,
            vec!["hemoglobin", "creatinine", "potassium", "glucose", "tsh"]
        );
    }

    #[test]
    fn test_rule_ids_unique_within_each_table() {
        for evaluator in standard_evaluators() {
            let ids = evaluator.rules().rule_ids();
            let mut deduped = ids.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(ids.len(), deduped.len(), "{}", evaluator.key());
        }
    }

    #[test]
    fn test_every_table_is_total_over_a_sweep() {
        let contexts = [
            PatientContext::default(),
            PatientContext::default().with_sex(Sex::Female).with_age(70),
            PatientContext::default().with_sex(Sex::Male).with_fasting(true),
        ];
        for evaluator in standard_evaluators() {
            for ctx in &contexts {
                let mut v = -5.0;
                while v < 600.0 {
                    let a = evaluator.assess(v, ctx);
                    assert!(!a.pearl.is_empty());
                    assert!(!a.action.is_empty());
                    v += 0.05;
                }
            }
        }
    }
}
