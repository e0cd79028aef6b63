//! Base evaluator trait and rule-table types
//!
//! This module defines the core abstractions for lab value evaluation:
//! - `Evaluator` trait that every lab test implements
//! - `Rule` / `RuleSet` for ordered, first-match-wins decision tables
//! - `Assessment` for capturing which rule fired and what it concluded

use crate::models::{PatientContext, SignificanceLevel};
use std::fmt;
use tracing::trace;

/// Predicate deciding whether a rule applies to a value
pub type Guard = fn(f64, &PatientContext) -> bool;

/// One row of a decision table
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable identifier, reported as `matched_rule`
    pub id: &'static str,
    /// Human-readable form of the guard, for `labsig rules`
    pub condition: &'static str,
    pub level: SignificanceLevel,
    pub pearl: &'static str,
    pub action: &'static str,
    pub guard: Guard,
}

impl Rule {
    pub fn matches(&self, value: f64, ctx: &PatientContext) -> bool {
        (self.guard)(value, ctx)
    }

    fn assessment(&self) -> Assessment {
        Assessment {
            rule: self.id,
            level: self.level,
            pearl: self.pearl,
            action: self.action,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("condition", &self.condition)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Outcome used when no rule in the table matches
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub id: &'static str,
    pub level: SignificanceLevel,
    pub pearl: &'static str,
    pub action: &'static str,
}

/// Ordered decision table. Rules are tried top to bottom; the first match wins.
///
/// The fallback is mandatory, so every finite value gets exactly one outcome.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub rules: &'static [Rule],
    pub fallback: Fallback,
}

impl RuleSet {
    pub fn evaluate(&self, value: f64, ctx: &PatientContext) -> Assessment {
        match self.rules.iter().find(|rule| rule.matches(value, ctx)) {
            Some(rule) => {
                trace!(rule = rule.id, value, "rule matched");
                rule.assessment()
            }
            None => {
                trace!(rule = self.fallback.id, value, "fallback");
                Assessment {
                    rule: self.fallback.id,
                    level: self.fallback.level,
                    pearl: self.fallback.pearl,
                    action: self.fallback.action,
                }
            }
        }
    }

    /// Rule identifiers in evaluation order, fallback last
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .map(|r| r.id)
            .chain(std::iter::once(self.fallback.id))
            .collect()
    }
}

/// What a decision table concluded for one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub rule: &'static str,
    pub level: SignificanceLevel,
    pub pearl: &'static str,
    pub action: &'static str,
}

/// Trait for all lab test evaluators
///
/// An evaluator owns the static description of one lab test (key, aliases,
/// unit, reference range) and its decision table.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct SodiumEvaluator;
///
/// static RULES: RuleSet = RuleSet {
///     rules: &[Rule {
///         id: "critical_low",
///         condition: "value < 120",
///         level: SignificanceLevel::Critical,
///         pearl: "Severe hyponatremia",
///         action: "Immediate evaluation required",
///         guard: |v, _| v < 120.0,
///     }],
///     fallback: Fallback { id: "normal", level: SignificanceLevel::Normal, pearl: "...", action: "..." },
/// };
///
/// impl Evaluator for SodiumEvaluator {
///     fn key(&self) -> &'static str { "sodium" }
///     fn display_name(&self) -> &'static str { "Sodium" }
///     fn aliases(&self) -> &'static [&'static str] { &["na", "sodium"] }
///     fn unit(&self) -> &'static str { "mEq/L" }
///     fn reference_range(&self) -> &'static str { "135-145" }
///     fn rules(&self) -> &'static RuleSet { &RULES }
/// }
/// ```
pub trait Evaluator: Send + Sync {
    /// Canonical key (e.g. "hemoglobin")
    fn key(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Case-insensitive lookup names
    fn aliases(&self) -> &'static [&'static str];

    fn unit(&self) -> &'static str;

    /// Human-readable reference range, reported verbatim
    fn reference_range(&self) -> &'static str;

    fn rules(&self) -> &'static RuleSet;

    /// Run the decision table
    fn assess(&self, value: f64, ctx: &PatientContext) -> Assessment {
        self.rules().evaluate(value, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: RuleSet = RuleSet {
        rules: &[
            Rule {
                id: "high",
                condition: "value > 10",
                level: SignificanceLevel::Critical,
                pearl: "high",
                action: "act",
                guard: |v, _| v > 10.0,
            },
            Rule {
                id: "wide",
                condition: "value > 5",
                level: SignificanceLevel::PossiblySignificant,
                pearl: "wide",
                action: "watch",
                guard: |v, _| v > 5.0,
            },
        ],
        fallback: Fallback {
            id: "rest",
            level: SignificanceLevel::Normal,
            pearl: "fine",
            action: "none",
        },
    };

    #[test]
    fn test_first_match_wins() {
        let ctx = PatientContext::default();
        assert_eq!(TABLE.evaluate(11.0, &ctx).rule, "high");
        assert_eq!(TABLE.evaluate(7.0, &ctx).rule, "wide");
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let a = TABLE.evaluate(1.0, &PatientContext::default());
        assert_eq!(a.rule, "rest");
        assert_eq!(a.level, SignificanceLevel::Normal);
        assert_eq!(a.pearl, "fine");
    }

    #[test]
    fn test_rule_ids_in_order() {
        assert_eq!(TABLE.rule_ids(), vec!["high", "wide", "rest"]);
    }
}
