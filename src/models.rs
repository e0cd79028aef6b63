//! Core data models for labsig
//!
//! These models flow between the catalog, the evaluators, the engine and
//! the reporters. Everything here is a plain value: built once per call,
//! never mutated afterwards.

use crate::engine::EvaluationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Age assumed when the patient context does not carry one
pub const DEFAULT_AGE: u32 = 30;

/// Clinical urgency of a lab value, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceLevel {
    #[default]
    Normal,
    LikelyInsignificant,
    PossiblySignificant,
    ClinicallySignificant,
    Critical,
}

impl SignificanceLevel {
    /// All levels in ascending order of urgency
    pub const ALL: [SignificanceLevel; 5] = [
        SignificanceLevel::Normal,
        SignificanceLevel::LikelyInsignificant,
        SignificanceLevel::PossiblySignificant,
        SignificanceLevel::ClinicallySignificant,
        SignificanceLevel::Critical,
    ];

    /// Ordinal from 1 (normal) to 5 (critical)
    pub fn ordinal(self) -> u8 {
        match self {
            SignificanceLevel::Normal => 1,
            SignificanceLevel::LikelyInsignificant => 2,
            SignificanceLevel::PossiblySignificant => 3,
            SignificanceLevel::ClinicallySignificant => 4,
            SignificanceLevel::Critical => 5,
        }
    }

    /// Wire tag
    pub fn as_str(self) -> &'static str {
        match self {
            SignificanceLevel::Normal => "normal",
            SignificanceLevel::LikelyInsignificant => "likely_insignificant",
            SignificanceLevel::PossiblySignificant => "possibly_significant",
            SignificanceLevel::ClinicallySignificant => "clinically_significant",
            SignificanceLevel::Critical => "critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignificanceLevel::Normal => "Normal",
            SignificanceLevel::LikelyInsignificant => "Likely Insignificant",
            SignificanceLevel::PossiblySignificant => "Possibly Significant",
            SignificanceLevel::ClinicallySignificant => "Clinically Significant",
            SignificanceLevel::Critical => "Critical",
        }
    }

    /// Anything above normal counts toward "need attention"
    pub fn needs_attention(self) -> bool {
        self != SignificanceLevel::Normal
    }

    /// Display metadata consumed by front ends
    pub fn presentation(self) -> Presentation {
        let (color, bg) = match self {
            SignificanceLevel::Normal => ("text-gray-600", ""),
            SignificanceLevel::LikelyInsignificant => ("text-gray-500", "bg-gray-50"),
            SignificanceLevel::PossiblySignificant => ("text-amber-700", "bg-amber-50"),
            SignificanceLevel::ClinicallySignificant => ("text-orange-700", "bg-orange-50"),
            SignificanceLevel::Critical => ("text-red-700", "bg-red-50"),
        };
        Presentation {
            level: self.ordinal(),
            label: self.label(),
            color,
            bg,
        }
    }
}

impl fmt::Display for SignificanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown significance level '{0}' (expected one of: normal, likely_insignificant, possibly_significant, clinically_significant, critical)")]
pub struct ParseLevelError(String);

impl FromStr for SignificanceLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        SignificanceLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// Presentation metadata for a significance level.
///
/// Only `level` has invariant meaning; the rest is styling for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub level: u8,
    pub label: &'static str,
    pub color: &'static str,
    pub bg: &'static str,
}

/// Patient sex as far as the decision tables care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Case-insensitive; anything unrecognised is `Unknown`
    pub fn from_lenient(s: &str) -> Sex {
        match s.trim().to_lowercase().as_str() {
            "male" => Sex::Male,
            "female" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Sex::from_lenient(&s)).unwrap_or_default())
    }
}

/// Optional patient information that some decision tables branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContext {
    pub sex: Sex,
    pub age: u32,
    pub fasting: bool,
}

impl Default for PatientContext {
    fn default() -> Self {
        Self {
            sex: Sex::Unknown,
            age: DEFAULT_AGE,
            fasting: false,
        }
    }
}

impl PatientContext {
    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_fasting(mut self, fasting: bool) -> Self {
        self.fasting = fasting;
        self
    }
}

/// A partial patient context. Set fields win over the base they are applied to.
///
/// Used for config-file defaults, batch request contexts and CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fasting: Option<bool>,
}

impl ContextOverrides {
    pub fn apply(&self, base: PatientContext) -> PatientContext {
        PatientContext {
            sex: self.sex.unwrap_or(base.sex),
            age: self.age.unwrap_or(base.age),
            fasting: self.fasting.unwrap_or(base.fasting),
        }
    }

    /// Merge another set of overrides into this one (other takes priority)
    pub fn merge(&mut self, other: &ContextOverrides) {
        if other.sex.is_some() {
            self.sex = other.sex;
        }
        if other.age.is_some() {
            self.age = other.age;
        }
        if other.fasting.is_some() {
            self.fasting = other.fasting;
        }
    }
}

/// A lab value exactly as a caller supplied it
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl RawValue {
    /// Finite numeric value, if there is one
    pub fn parse(&self) -> Option<f64> {
        let parsed = match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            RawValue::Missing => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Missing,
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .unwrap_or_else(|| RawValue::Text(n.to_string())),
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Missing => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(RawValue::from_json(&value))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Number(f64::from(v))
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        RawValue::Number(f64::from(v))
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map(RawValue::Number).unwrap_or(RawValue::Missing)
    }
}

/// One entry of a batch request.
///
/// Deserialization never fails: a missing or odd-shaped name or value is
/// kept as-is and surfaces as a positional error when the batch runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchItem {
    pub test_name: String,
    pub value: RawValue,
}

impl BatchItem {
    pub fn new(test_name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            test_name: test_name.into(),
            value: value.into(),
        }
    }

    /// Accepts `test_name` or `testName`. Non-objects yield an empty item.
    pub fn from_json(item: &serde_json::Value) -> Self {
        let name = item.get("test_name").or_else(|| item.get("testName"));
        let test_name = match name {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            test_name,
            value: item.get("value").map(RawValue::from_json).unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for BatchItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(BatchItem::from_json(&value))
    }
}

/// Outcome of evaluating one lab value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Canonical key of the resolved test
    pub test_key: String,
    /// Display name of the resolved test
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: String,
    pub significance: SignificanceLevel,
    pub clinical_pearl: String,
    pub action: String,
    /// Identifier of the decision-table rule that fired
    pub matched_rule: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub presentation: Presentation,
}

/// Per-level counts over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total_tests: usize,
    pub need_attention_count: usize,
    pub normal_count: usize,
    pub critical_count: usize,
    pub clinically_significant_count: usize,
    pub possibly_significant_count: usize,
    pub likely_insignificant_count: usize,
    pub error_count: usize,
    pub message: String,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<EvaluationResult, EvaluationError>]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total_tests += 1;
            let Ok(result) = result else {
                summary.error_count += 1;
                continue;
            };
            match result.significance {
                SignificanceLevel::Normal => summary.normal_count += 1,
                SignificanceLevel::LikelyInsignificant => summary.likely_insignificant_count += 1,
                SignificanceLevel::PossiblySignificant => summary.possibly_significant_count += 1,
                SignificanceLevel::ClinicallySignificant => {
                    summary.clinically_significant_count += 1
                }
                SignificanceLevel::Critical => summary.critical_count += 1,
            }
            if result.significance.needs_attention() {
                summary.need_attention_count += 1;
            }
        }
        summary.message = format!(
            "{} findings need review, {} within normal limits",
            summary.need_attention_count, summary.normal_count
        );
        summary
    }

    pub fn count(&self, level: SignificanceLevel) -> usize {
        match level {
            SignificanceLevel::Normal => self.normal_count,
            SignificanceLevel::LikelyInsignificant => self.likely_insignificant_count,
            SignificanceLevel::PossiblySignificant => self.possibly_significant_count,
            SignificanceLevel::ClinicallySignificant => self.clinically_significant_count,
            SignificanceLevel::Critical => self.critical_count,
        }
    }
}

/// Positional results of a batch plus their summary.
///
/// `results[i]` always corresponds to input item `i`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    #[serde(serialize_with = "serialize_entries")]
    pub results: Vec<Result<EvaluationResult, EvaluationError>>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(results: Vec<Result<EvaluationResult, EvaluationError>>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { results, summary }
    }

    /// Highest level among successful entries
    pub fn max_significance(&self) -> Option<SignificanceLevel> {
        self.results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|r| r.significance)
            .max()
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchEntry<'a> {
    Evaluated(&'a EvaluationResult),
    Failed {
        position: usize,
        error: String,
        kind: &'static str,
        #[serde(skip_serializing_if = "<[String]>::is_empty")]
        suggestions: &'a [String],
    },
}

#[allow(clippy::ptr_arg)]
fn serialize_entries<S: Serializer>(
    entries: &Vec<Result<EvaluationResult, EvaluationError>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entries.iter().enumerate().map(|(i, entry)| match entry {
        Ok(result) => BatchEntry::Evaluated(result),
        Err(err) => BatchEntry::Failed {
            position: i + 1,
            error: err.to_string(),
            kind: err.kind(),
            suggestions: err.suggestions(),
        },
    }))
}

/// Catalog introspection entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestInfo {
    #[serde(skip)]
    pub key: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub unit: String,
    pub reference_range: String,
}

/// Catalog listing; serializes as an object keyed by canonical key, in catalog order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestListing(pub Vec<TestInfo>);

impl TestListing {
    pub fn get(&self, key: &str) -> Option<&TestInfo> {
        self.0.iter().find(|t| t.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|t| t.key.as_str())
    }
}

impl Serialize for TestListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|t| (t.key.as_str(), t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_follows_ordinal() {
        for pair in SignificanceLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].ordinal() + 1, pair[1].ordinal());
        }
        assert_eq!(SignificanceLevel::Normal.ordinal(), 1);
        assert_eq!(SignificanceLevel::Critical.ordinal(), 5);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(
            "critical".parse::<SignificanceLevel>().unwrap(),
            SignificanceLevel::Critical
        );
        assert_eq!(
            "Possibly-Significant".parse::<SignificanceLevel>().unwrap(),
            SignificanceLevel::PossiblySignificant
        );
        assert!("severe".parse::<SignificanceLevel>().is_err());
    }

    #[test]
    fn test_level_serializes_as_tag() {
        let json = serde_json::to_string(&SignificanceLevel::ClinicallySignificant).unwrap();
        assert_eq!(json, "\"clinically_significant\"");
    }

    #[test]
    fn test_presentation_metadata() {
        let p = SignificanceLevel::Critical.presentation();
        assert_eq!(p.level, 5);
        assert_eq!(p.label, "Critical");
        assert_eq!(p.color, "text-red-700");
        assert_eq!(p.bg, "bg-red-50");
        assert_eq!(SignificanceLevel::Normal.presentation().bg, "");
    }

    #[test]
    fn test_sex_is_lenient() {
        assert_eq!(Sex::from_lenient(" Female "), Sex::Female);
        assert_eq!(Sex::from_lenient("MALE"), Sex::Male);
        assert_eq!(Sex::from_lenient("other"), Sex::Unknown);
    }

    #[test]
    fn test_context_defaults_and_unknown_keys() {
        let ctx: PatientContext =
            serde_json::from_str(r#"{"sex": "Female", "weight": 70}"#).unwrap();
        assert_eq!(ctx.sex, Sex::Female);
        assert_eq!(ctx.age, DEFAULT_AGE);
        assert!(!ctx.fasting);

        let empty: PatientContext = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PatientContext::default());
    }

    #[test]
    fn test_context_null_sex_is_unknown() {
        let ctx: PatientContext = serde_json::from_str(r#"{"sex": null, "age": 70}"#).unwrap();
        assert_eq!(ctx.sex, Sex::Unknown);
        assert_eq!(ctx.age, 70);
    }

    #[test]
    fn test_overrides_apply_and_merge() {
        let mut base = ContextOverrides {
            sex: Some(Sex::Male),
            age: Some(50),
            fasting: None,
        };
        base.merge(&ContextOverrides {
            age: Some(70),
            fasting: Some(true),
            ..Default::default()
        });
        let ctx = base.apply(PatientContext::default());
        assert_eq!(ctx.sex, Sex::Male);
        assert_eq!(ctx.age, 70);
        assert!(ctx.fasting);
    }

    #[test]
    fn test_raw_value_parsing() {
        assert_eq!(RawValue::from(" 11.8 ").parse(), Some(11.8));
        assert_eq!(RawValue::from(110).parse(), Some(110.0));
        assert_eq!(RawValue::from("abc").parse(), None);
        assert_eq!(RawValue::from("").parse(), None);
        assert_eq!(RawValue::from("NaN").parse(), None);
        assert_eq!(RawValue::from("inf").parse(), None);
        assert_eq!(RawValue::Missing.parse(), None);
    }

    #[test]
    fn test_batch_item_accepts_both_field_spellings() {
        let items: Vec<BatchItem> = serde_json::from_str(
            r#"[{"test_name": "k", "value": "4.0"}, {"testName": "tsh", "value": 2.5}, {"value": true}]"#,
        )
        .unwrap();
        assert_eq!(items[0], BatchItem::new("k", "4.0"));
        assert_eq!(items[1], BatchItem::new("tsh", 2.5));
        assert_eq!(items[2].test_name, "");
        assert_eq!(items[2].value, RawValue::Text("true".into()));
    }

    #[test]
    fn test_batch_item_tolerates_malformed_entries() {
        let items: Vec<BatchItem> = serde_json::from_str(
            r#"[{"test_name": "k", "value": 4.0}, {"test_name": 5, "value": 4.0}, 7, null, {"testName": null}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0], BatchItem::new("k", 4.0));
        assert_eq!(items[1], BatchItem::new("5", 4.0));
        assert_eq!(items[2], BatchItem::default());
        assert_eq!(items[3], BatchItem::default());
        assert_eq!(items[4], BatchItem::default());
    }

    #[test]
    fn test_listing_serializes_as_ordered_map() {
        let listing = TestListing(vec![
            TestInfo {
                key: "zeta".into(),
                name: "Zeta".into(),
                aliases: vec!["z".into()],
                unit: "u".into(),
                reference_range: "1-2".into(),
            },
            TestInfo {
                key: "alpha".into(),
                name: "Alpha".into(),
                aliases: vec!["a".into()],
                unit: "u".into(),
                reference_range: "1-2".into(),
            },
        ]);
        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.starts_with(r#"{"zeta":{"name":"Zeta""#));
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
        assert!(!json.contains("\"key\""));
    }
}
