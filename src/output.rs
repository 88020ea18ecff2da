//! Result types produced by the analysis pipeline.
//!
//! [`ExtractionResult`] is the wire contract: the HTTP endpoint returns it
//! verbatim and the model is prompted to emit exactly this shape.
//! [`AnalysisOutput`] wraps it with timing data for logs and the CLI.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The asset inventory returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Assets in the order the model listed them. May be empty.
    pub items: Vec<Item>,
    /// Sum of item prices as asserted by the model (not recomputed).
    #[serde(serialize_with = "serialize_amount")]
    pub total_value: f64,
    /// Coverage amount chosen by the model.
    #[serde(serialize_with = "serialize_amount")]
    pub recommended_coverage: f64,
}

/// One identified asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub category: String,
    /// Free text; by convention "New", "Used" or "Damaged", sometimes finer.
    pub condition: String,
    #[serde(serialize_with = "serialize_amount")]
    pub estimated_price_inr: f64,
    pub risk_factor: RiskFactor,
}

/// Underwriting risk assigned to an item.
///
/// Labels outside the three known values are kept in `Unrecognized` so the
/// lenient parser can pass them through; the strict parser rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskFactor {
    Low,
    Medium,
    High,
    Unrecognized(String),
}

impl RiskFactor {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, RiskFactor::Unrecognized(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskFactor::Low => "Low",
            RiskFactor::Medium => "Medium",
            RiskFactor::High => "High",
            RiskFactor::Unrecognized(s) => s,
        }
    }
}

impl From<String> for RiskFactor {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Low" => RiskFactor::Low,
            "Medium" => RiskFactor::Medium,
            "High" => RiskFactor::High,
            _ => RiskFactor::Unrecognized(s),
        }
    }
}

impl From<RiskFactor> for String {
    fn from(r: RiskFactor) -> Self {
        match r {
            RiskFactor::Unrecognized(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Absolute difference (in rupees) tolerated between `total_value` and the
/// sum of item prices before it is reported as a discrepancy.
pub const TOTAL_TOLERANCE_INR: f64 = 1.0;

impl ExtractionResult {
    /// Sum of `estimated_price_inr` across all items.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.estimated_price_inr).sum()
    }

    /// `Some(total_value - items_total)` when the model's total disagrees
    /// with its own item list by more than [`TOTAL_TOLERANCE_INR`].
    pub fn value_discrepancy(&self) -> Option<f64> {
        let diff = self.total_value - self.items_total();
        (diff.abs() > TOTAL_TOLERANCE_INR).then_some(diff)
    }
}

/// Whole rupee amounts go out as JSON integers (`50000`, not `50000.0`).
fn serialize_amount<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        s.serialize_i64(*value as i64)
    } else {
        s.serialize_f64(*value)
    }
}

/// Timings and counters for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Bytes written to the staging directory.
    pub staged_bytes: u64,
    /// Number of remote state fetches made while waiting for readiness.
    pub status_checks: u32,
    pub upload_duration_ms: u64,
    pub processing_duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub result: ExtractionResult,
    pub stats: AnalysisStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: f64, risk: RiskFactor) -> Item {
        Item {
            name: name.into(),
            category: "Electronics".into(),
            condition: "Used".into(),
            estimated_price_inr: price,
            risk_factor: risk,
        }
    }

    #[test]
    fn whole_amounts_serialise_as_integers() {
        let result = ExtractionResult {
            items: vec![item("TV", 65000.0, RiskFactor::Medium)],
            total_value: 65000.0,
            recommended_coverage: 70000.5,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"estimated_price_inr\":65000,"), "got: {json}");
        assert!(json.contains("\"total_value\":65000,"), "got: {json}");
        assert!(json.contains("\"recommended_coverage\":70000.5"), "got: {json}");
    }

    #[test]
    fn risk_factor_round_trips_unknown_labels() {
        let r: RiskFactor = serde_json::from_str("\"Severe\"").unwrap();
        assert_eq!(r, RiskFactor::Unrecognized("Severe".into()));
        assert!(!r.is_recognized());
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"Severe\"");

        let high: RiskFactor = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(high, RiskFactor::High);
        assert!(high.is_recognized());
    }

    #[test]
    fn discrepancy_reported_only_beyond_tolerance() {
        let mut result = ExtractionResult {
            items: vec![
                item("Sofa", 50000.0, RiskFactor::Low),
                item("Laptop", 90000.0, RiskFactor::High),
            ],
            total_value: 140000.0,
            recommended_coverage: 160000.0,
        };
        assert_eq!(result.items_total(), 140000.0);
        assert_eq!(result.value_discrepancy(), None);

        result.total_value = 150000.0;
        assert_eq!(result.value_discrepancy(), Some(10000.0));
    }
}
