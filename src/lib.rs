//! labsig - clinical significance triage for lab values
//!
//! Resolves a lab test by name or alias, runs its ordered decision table
//! against a numeric value and optional patient context, and reports how
//! urgently the value deserves attention.
//!
//! ```
//! use labsig::engine::ClinicalSignificanceEngine;
//! use labsig::models::{PatientContext, Sex, SignificanceLevel};
//!
//! let engine = ClinicalSignificanceEngine::new().unwrap();
//! let ctx = PatientContext::default().with_sex(Sex::Female);
//! let result = engine.evaluate("hgb", 11.8, &ctx).unwrap();
//! assert_eq!(result.significance, SignificanceLevel::LikelyInsignificant);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod evaluators;
pub mod models;
pub mod reporters;

pub use engine::{ClinicalSignificanceEngine, EvaluationError, MAX_BATCH_SIZE};
pub use models::{EvaluationResult, PatientContext, Sex, SignificanceLevel};
