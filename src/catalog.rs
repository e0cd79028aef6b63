//! Lab test catalog
//!
//! Built once from a set of evaluators and read-only afterwards. Lookup is
//! an exact match on the lower-cased, trimmed name against every alias (and
//! the canonical key) of every test.

use crate::evaluators::{self, Assessment, Evaluator};
use crate::models::{PatientContext, TestInfo, TestListing};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate lab test key '{0}'")]
    DuplicateKey(String),

    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
}

/// Immutable description of one lab test
pub struct LabTestDefinition {
    pub key: String,
    pub name: String,
    /// Lower-cased lookup names
    pub aliases: Vec<String>,
    pub unit: String,
    pub reference_range: String,
    evaluator: Arc<dyn Evaluator>,
}

impl LabTestDefinition {
    pub fn from_evaluator(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            key: evaluator.key().to_string(),
            name: evaluator.display_name().to_string(),
            aliases: evaluator
                .aliases()
                .iter()
                .map(|a| normalize_name(a))
                .collect(),
            unit: evaluator.unit().to_string(),
            reference_range: evaluator.reference_range().to_string(),
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn assess(&self, value: f64, ctx: &PatientContext) -> Assessment {
        self.evaluator.assess(value, ctx)
    }

    pub fn info(&self) -> TestInfo {
        TestInfo {
            key: self.key.clone(),
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            unit: self.unit.clone(),
            reference_range: self.reference_range.clone(),
        }
    }
}

impl fmt::Debug for LabTestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabTestDefinition")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("unit", &self.unit)
            .field("reference_range", &self.reference_range)
            .finish_non_exhaustive()
    }
}

/// Lower-case and trim a free-text test name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fixed set of lab tests with a disjoint alias index
#[derive(Debug)]
pub struct Catalog {
    tests: Vec<LabTestDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// The five built-in tests
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_evaluators(evaluators::standard_evaluators())
    }

    /// Build a catalog, rejecting duplicate keys and aliases shared between tests
    pub fn from_evaluators(
        evaluators: impl IntoIterator<Item = Arc<dyn Evaluator>>,
    ) -> Result<Self, CatalogError> {
        let mut tests: Vec<LabTestDefinition> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for evaluator in evaluators {
            let definition = LabTestDefinition::from_evaluator(evaluator);
            if tests.iter().any(|t| t.key == definition.key) {
                return Err(CatalogError::DuplicateKey(definition.key));
            }
            let position = tests.len();
            let names = definition
                .aliases
                .iter()
                .cloned()
                .chain(std::iter::once(normalize_name(&definition.key)));
            for name in names {
                match index.get(&name) {
                    Some(&existing) if existing != position => {
                        return Err(CatalogError::DuplicateAlias {
                            alias: name,
                            first: tests[existing].key.clone(),
                            second: definition.key.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.insert(name, position);
                    }
                }
            }
            tests.push(definition);
        }

        debug!(tests = tests.len(), aliases = index.len(), "catalog built");
        Ok(Self { tests, index })
    }

    /// Resolve a free-text name. Exact alias match only.
    pub fn find(&self, name: &str) -> Option<&LabTestDefinition> {
        self.index
            .get(&normalize_name(name))
            .map(|&i| &self.tests[i])
    }

    /// Canonical keys in catalog order
    pub fn keys(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.key.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabTestDefinition> {
        self.tests.iter()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn listing(&self) -> TestListing {
        TestListing(self.tests.iter().map(LabTestDefinition::info).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::{HemoglobinEvaluator, RuleSet, TshEvaluator};

    struct ClashingEvaluator;

    impl Evaluator for ClashingEvaluator {
        fn key(&self) -> &'static str {
            "hematocrit"
        }
        fn display_name(&self) -> &'static str {
            "Hematocrit"
        }
        fn aliases(&self) -> &'static [&'static str] {
            &["hct", "HB"]
        }
        fn unit(&self) -> &'static str {
            "%"
        }
        fn reference_range(&self) -> &'static str {
            "36-50"
        }
        fn rules(&self) -> &'static RuleSet {
            HemoglobinEvaluator.rules()
        }
    }

    #[test]
    fn test_standard_catalog_builds() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(
            catalog.keys(),
            vec!["hemoglobin", "creatinine", "potassium", "glucose", "tsh"]
        );
    }

    #[test]
    fn test_find_normalizes_input() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.find("  HGB ").unwrap().key, "hemoglobin");
        assert_eq!(catalog.find("K+").unwrap().key, "potassium");
        assert_eq!(catalog.find("Blood Glucose").unwrap().key, "glucose");
        assert_eq!(
            catalog.find("thyroid stimulating hormone").unwrap().key,
            "tsh"
        );
    }

    #[test]
    fn test_find_is_exact() {
        let catalog = Catalog::standard().unwrap();
        assert!(catalog.find("hemo").is_none());
        assert!(catalog.find("glucose level").is_none());
        assert!(catalog.find("").is_none());
    }

    #[test]
    fn test_aliases_are_disjoint() {
        let catalog = Catalog::standard().unwrap();
        let mut seen = std::collections::HashSet::new();
        for test in catalog.iter() {
            for alias in &test.aliases {
                assert!(seen.insert(alias.clone()), "alias {alias} reused");
            }
        }
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let err = Catalog::from_evaluators(vec![
            Arc::new(HemoglobinEvaluator) as Arc<dyn Evaluator>,
            Arc::new(ClashingEvaluator),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateAlias {
                alias: "hb".into(),
                first: "hemoglobin".into(),
                second: "hematocrit".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Catalog::from_evaluators(vec![
            Arc::new(TshEvaluator) as Arc<dyn Evaluator>,
            Arc::new(TshEvaluator),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateKey("tsh".into()));
    }

    #[test]
    fn test_listing_carries_catalog_data() {
        let listing = Catalog::standard().unwrap().listing();
        let hgb = listing.get("hemoglobin").unwrap();
        assert_eq!(hgb.name, "Hemoglobin");
        assert_eq!(hgb.unit, "g/dL");
        assert_eq!(hgb.reference_range, "M: 13.5-17.5, F: 12.0-15.5");
        assert_eq!(hgb.aliases, vec!["hgb", "hb", "hemoglobin", "haemoglobin"]);
    }
}
