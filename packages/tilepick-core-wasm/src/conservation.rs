// Conservation check: compares the total of the joined property before and after a
// conversion. Diagnostic only, values are never adjusted.

use serde::{Deserialize, Serialize};

use crate::geojson_features::FeatureCollection;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConservationReport {
    pub area: Option<String>,
    pub source: Option<String>,
    pub value_property: String,
    pub source_total: f64,
    pub result_total: f64,
    pub source_features: usize,
    pub result_features: usize,
}

impl ConservationReport {
    /// How much the result total deviates from the source total.
    pub fn drift(&self) -> f64 {
        self.result_total - self.source_total
    }

    /// `result_total / source_total`, `None` when the source total is zero.
    pub fn ratio(&self) -> Option<f64> {
        (self.source_total != 0.0).then(|| self.result_total / self.source_total)
    }
}

// Sum of the numeric values of `value_property`; missing and non-numeric values count as 0
pub fn sum_property(collection: &FeatureCollection, value_property: &str) -> f64 {
    collection
        .features
        .iter()
        .filter_map(|f| f.value(value_property).and_then(|v| v.as_f64()))
        .sum()
}

pub fn validate_conservation(
    source: &FeatureCollection,
    result: &FeatureCollection,
    value_property: &str,
) -> ConservationReport {
    let report = ConservationReport {
        area: result.area.clone(),
        source: result.source.clone().or_else(|| source.name.clone()),
        value_property: value_property.to_string(),
        source_total: sum_property(source, value_property),
        result_total: sum_property(result, value_property),
        source_features: source.features.len(),
        result_features: result.features.len(),
    };

    log::info!(
        "validation {} --- {} vs {} (drift {}, ratio {})",
        report.source.as_deref().unwrap_or("<unnamed>"),
        report.source_total,
        report.result_total,
        report.drift(),
        report
            .ratio()
            .map_or_else(|| "n/a".to_string(), |ratio| format!("{:.3}", ratio))
    );
    report
}
