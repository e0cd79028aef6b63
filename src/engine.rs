//! Clinical significance engine
//!
//! The engine owns the catalog and exposes the three caller-facing
//! operations: single evaluation, batch evaluation and catalog listing.
//! Every call is a pure function of its inputs apart from the timestamp;
//! the engine holds no mutable state and can be shared freely across
//! threads.
//!
//! ```text
//! name ──► Catalog::find ──► RawValue::parse ──► Evaluator::assess ──► EvaluationResult
//!              │                   │
//!              ▼                   ▼
//!        UnknownTest          InvalidValue
//! ```

use crate::catalog::{Catalog, CatalogError, LabTestDefinition};
use crate::models::{
    BatchItem, BatchReport, EvaluationResult, PatientContext, RawValue, TestListing,
};
use chrono::Utc;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Maximum number of items accepted by a single batch
pub const MAX_BATCH_SIZE: usize = 50;

/// Errors reported to callers. All are recoverable by resubmitting corrected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("Lab test \"{name}\" not recognized")]
    UnknownTest {
        name: String,
        /// Every canonical key in the catalog
        suggestions: Vec<String>,
    },

    #[error("Invalid numeric value: {value}")]
    InvalidValue { value: String },

    #[error("Maximum {max} lab values allowed per request (got {count})")]
    BatchTooLarge { count: usize, max: usize },
}

impl EvaluationError {
    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::UnknownTest { .. } => "unknown_test",
            EvaluationError::InvalidValue { .. } => "invalid_value",
            EvaluationError::BatchTooLarge { .. } => "batch_too_large",
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            EvaluationError::UnknownTest { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

/// Core engine for determining the clinical significance of lab values
#[derive(Debug)]
pub struct ClinicalSignificanceEngine {
    catalog: Catalog,
}

static SHARED: OnceLock<Result<ClinicalSignificanceEngine, CatalogError>> = OnceLock::new();

impl ClinicalSignificanceEngine {
    /// Engine over the built-in catalog
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self::with_catalog(Catalog::standard()?))
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Process-wide engine over the built-in catalog, built on first use
    pub fn shared() -> Result<&'static Self, CatalogError> {
        SHARED.get_or_init(Self::new).as_ref().map_err(Clone::clone)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn find_test(&self, name: &str) -> Option<&LabTestDefinition> {
        self.catalog.find(name)
    }

    pub fn list_tests(&self) -> TestListing {
        self.catalog.listing()
    }

    /// Evaluate one value.
    ///
    /// The test name is resolved first, so an unknown test with a bad value
    /// reports `UnknownTest`.
    pub fn evaluate(
        &self,
        test_name: &str,
        value: impl Into<RawValue>,
        ctx: &PatientContext,
    ) -> Result<EvaluationResult, EvaluationError> {
        let raw = value.into();

        let Some(test) = self.catalog.find(test_name) else {
            warn!(test = test_name, "unknown lab test");
            return Err(EvaluationError::UnknownTest {
                name: test_name.to_string(),
                suggestions: self.catalog.keys(),
            });
        };

        let Some(value) = raw.parse() else {
            warn!(test = %test.key, value = %raw, "invalid numeric value");
            return Err(EvaluationError::InvalidValue {
                value: raw.to_string(),
            });
        };

        let assessment = test.assess(value, ctx);
        debug!(
            test = %test.key,
            value,
            sex = %ctx.sex,
            age = ctx.age,
            fasting = ctx.fasting,
            rule = assessment.rule,
            significance = %assessment.level,
            "evaluated"
        );

        Ok(EvaluationResult {
            test_key: test.key.clone(),
            test_name: test.name.clone(),
            value,
            unit: test.unit.clone(),
            reference_range: test.reference_range.clone(),
            significance: assessment.level,
            clinical_pearl: assessment.pearl.to_string(),
            action: assessment.action.to_string(),
            matched_rule: assessment.rule.to_string(),
            timestamp: Utc::now(),
            presentation: assessment.level.presentation(),
        })
    }

    /// Evaluate up to `MAX_BATCH_SIZE` items against one shared context.
    ///
    /// Item failures are reported at their position and never abort the
    /// rest of the batch.
    pub fn evaluate_batch(
        &self,
        items: &[BatchItem],
        ctx: &PatientContext,
    ) -> Result<BatchReport, EvaluationError> {
        if items.len() > MAX_BATCH_SIZE {
            warn!(count = items.len(), max = MAX_BATCH_SIZE, "batch too large");
            return Err(EvaluationError::BatchTooLarge {
                count: items.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let batch_id = Uuid::new_v4();
        let span = info_span!("batch", id = %batch_id, items = items.len());
        let _guard = span.enter();

        let results: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let result = self.evaluate(&item.test_name, item.value.clone(), ctx);
                if let Err(err) = &result {
                    debug!(position = i + 1, kind = err.kind(), "item failed");
                }
                result
            })
            .collect();

        let report = BatchReport::new(results);
        info!(
            total = report.summary.total_tests,
            need_attention = report.summary.need_attention_count,
            critical = report.summary.critical_count,
            errors = report.summary.error_count,
            "batch evaluated"
        );
        Ok(report)
    }
}
