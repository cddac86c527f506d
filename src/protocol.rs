//! Typed request/response contracts for the analysis service.
//!
//! Every business response shares the `{status: "success"|"error",
//! message?, ...payload}` envelope; [`decode_envelope`] turns it into a
//! tagged success/error result so no call site ever inspects a
//! loosely-typed object. Chart descriptions stay opaque strings.

use crate::error::ClientError;
use crate::table_data::TableDataset;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Splits the shared envelope: an `error` status becomes
/// [`ClientError::Server`] carrying the message verbatim, a `success`
/// status deserializes the endpoint-specific payload from the same
/// object (so payload structs may pick up `message` where the UI uses it).
pub fn decode_envelope<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ClientError> {
    match value.get("status").and_then(|s| s.as_str()) {
        Some("success") => Ok(serde_json::from_value(value)?),
        Some("error") => Err(ClientError::Server(
            value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request rejected")
                .to_string(),
        )),
        _ => Err(ClientError::Server(
            "response carried no status field".to_string(),
        )),
    }
}

/// Empty success payload, for endpoints that acknowledge without data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {}

// ---------------------------------------------------------------------------
// Thresholds

pub const ZSCORE_RANGE: RangeInclusive<f64> = 1.0..=5.0;
pub const IQR_RANGE: RangeInclusive<f64> = 0.5..=3.0;
pub const MAD_RANGE: RangeInclusive<f64> = 1.0..=5.0;
pub const THRESHOLD_STEP: f64 = 0.1;

/// Detection cutoffs, mutated only by direct slider input and read at
/// request time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfiguration {
    pub zscore: f64,
    pub iqr: f64,
    pub mad: f64,
}

impl Default for ThresholdConfiguration {
    fn default() -> Self {
        Self {
            zscore: 3.0,
            iqr: 1.5,
            mad: 3.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Samples and groups

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Experimental,
    Control,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Experimental => "experimental",
            GroupKind::Control => "control",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalMethod {
    Manual,
    #[serde(rename = "Z-Score")]
    ZScore,
    #[serde(rename = "IQR")]
    Iqr,
    #[serde(rename = "MAD")]
    Mad,
}

impl RemovalMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalMethod::Manual => "Manual",
            RemovalMethod::ZScore => "Z-Score",
            RemovalMethod::Iqr => "IQR",
            RemovalMethod::Mad => "MAD",
        }
    }
}

impl fmt::Display for RemovalMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for RemovalMethod {
    fn default() -> Self {
        RemovalMethod::Manual
    }
}

fn default_threshold_used() -> String {
    "N/A".to_string()
}

/// One committed group entry, keyed by sample name within its group.
/// Correction is delete plus re-add; there is no edit-in-place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_name: String,
    pub size_avg: f64,
    pub pi_avg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data_value: Option<f64>,
    #[serde(default)]
    pub removal_method: RemovalMethod,
    #[serde(default = "default_threshold_used")]
    pub threshold_used: String,
    #[serde(default)]
    pub timestamp: String,
    /// Present when the server returns one combined list instead of
    /// per-group lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<GroupKind>,
}

// ---------------------------------------------------------------------------
// Requests

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDataRequest {
    pub sample_name: String,
    pub production_date: String,
    pub pass_count: u32,
    pub table_data: TableDataset,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddColumnRequest {
    pub column_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculateRequest {
    pub thresholds: ThresholdConfiguration,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetNameRequest {
    pub dataset_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareDatasetsRequest {
    pub dataset_names: Vec<String>,
}

/// Per-group sub-payload of the combined add. An incomplete group goes
/// out as `{}`, never as a partial object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_method: Option<RemovalMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_used: Option<String>,
}

impl GroupFields {
    /// A group counts only when both required averages are present.
    pub fn is_complete(&self) -> bool {
        self.size_avg.is_some() && self.pi_avg.is_some()
    }

    /// Collapses a partially filled group to the empty payload.
    pub fn complete_or_empty(self) -> Self {
        if self.is_complete() {
            self
        } else {
            Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BothGroupsRequest {
    pub sample_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data_name: Option<String>,
    pub experimental: GroupFields,
    pub control: GroupFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupEntryRequest {
    pub sample_name: String,
    pub size_avg: f64,
    pub pi_avg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data_name: Option<String>,
    pub removal_method: RemovalMethod,
    pub threshold_used: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteGroupEntryRequest {
    pub sample_name: String,
    pub group_type: GroupKind,
}

// ---------------------------------------------------------------------------
// Responses

#[derive(Debug, Clone, Deserialize)]
pub struct TableDataResponse {
    pub table_data: TableDataset,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub production_date: Option<String>,
    #[serde(default)]
    pub pass_count: Option<u32>,
    #[serde(default)]
    pub columns_mapped: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Summary statistics for one outlier-removal method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub threshold: f64,
    pub count: usize,
    pub outliers_count: usize,
    pub size_mean: f64,
    pub size_std: f64,
    pub pi_mean: f64,
    pub pi_std: f64,
}

/// Full detection response, cached client-side as the source for
/// add-from-result actions and redraws. Overwritten wholesale by each
/// fresh run.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculationResponse {
    pub original_count: usize,
    #[serde(default)]
    pub sample_name: String,
    #[serde(default)]
    pub production_date: String,
    #[serde(default)]
    pub pass_count: u32,
    pub zscore: MethodSummary,
    pub iqr: MethodSummary,
    pub mad: MethodSummary,
    #[serde(default)]
    pub scatter_plot: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdateResponse {
    #[serde(default)]
    pub experimental_data: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub control_data: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub pass_averages: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub custom_data_field_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub data_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedDatasetsResponse {
    #[serde(default)]
    pub datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetLoadResponse {
    #[serde(default)]
    pub sample_name: String,
    #[serde(default)]
    pub production_date: String,
    #[serde(default)]
    pub pass_count: u32,
    pub table_data: TableDataset,
    #[serde(default)]
    pub custom_data_field_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetStats {
    pub count: usize,
    pub size_mean: f64,
    pub size_std: f64,
    pub pi_mean: f64,
    pub pi_std: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareResponse {
    pub stats_summary: BTreeMap<String, DatasetStats>,
    #[serde(default)]
    pub comparison_plot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendStatistics {
    pub pass_count: usize,
    pub correlation: f64,
    pub size_cv: f64,
    pub pi_cv: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendResponse {
    pub statistics: TrendStatistics,
    #[serde(default)]
    pub size_trend_chart: Option<String>,
    #[serde(default)]
    pub pi_trend_chart: Option<String>,
    #[serde(default)]
    pub correlation_chart: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomCorrelationStats {
    #[serde(default)]
    pub data_count: Option<usize>,
    #[serde(default)]
    pub experimental_count: Option<usize>,
    #[serde(default)]
    pub control_count: Option<usize>,
    #[serde(default)]
    pub total_count: Option<usize>,
    #[serde(default)]
    pub correlation: f64,
    #[serde(default)]
    pub custom_mean: Option<f64>,
    #[serde(default)]
    pub size_mean: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomCorrelationResponse {
    #[serde(default)]
    pub custom_field_name: Option<String>,
    pub statistics: CustomCorrelationStats,
    #[serde(default)]
    pub custom_correlation_chart: Option<String>,
}

/// Server-injected restore payload rendered through the same paths as
/// live responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub table_data: Option<TableDataset>,
    #[serde(default)]
    pub experimental_data: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub control_data: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub pass_averages: Option<Vec<SampleRecord>>,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub production_date: Option<String>,
    #[serde(default)]
    pub pass_count: Option<u32>,
    #[serde(default)]
    pub custom_data_field_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_typed_payload() {
        let value = json!({
            "status": "success",
            "message": "20 rows loaded",
            "table_data": {"No.": [1], "Size(nm)": [5.0], "PI": [null]}
        });
        let response: TableDataResponse = decode_envelope(value).unwrap();
        assert_eq!(response.table_data.row_count(), 1);
        assert_eq!(response.message.as_deref(), Some("20 rows loaded"));
    }

    #[test]
    fn error_envelope_surfaces_message_verbatim() {
        let value = json!({"status": "error", "message": "유효한 데이터가 없습니다."});
        let err = decode_envelope::<Ack>(value).unwrap_err();
        assert_eq!(err.user_message(), Some("유효한 데이터가 없습니다."));
    }

    #[test]
    fn missing_status_is_rejected() {
        let err = decode_envelope::<Ack>(json!({"table_data": {}})).unwrap_err();
        assert!(err.user_message().unwrap().contains("status"));
    }

    #[test]
    fn incomplete_group_fields_collapse_to_empty_object() {
        let partial = GroupFields {
            size_avg: Some(5.0),
            ..GroupFields::default()
        };
        let collapsed = partial.complete_or_empty();
        assert_eq!(collapsed, GroupFields::default());
        assert_eq!(serde_json::to_value(&collapsed).unwrap(), json!({}));
    }

    #[test]
    fn both_groups_request_keeps_empty_experimental_object() {
        let request = BothGroupsRequest {
            sample_name: "P-7".to_string(),
            custom_data_name: None,
            experimental: GroupFields::default(),
            control: GroupFields {
                size_avg: Some(5.0),
                pi_avg: Some(0.2),
                ..GroupFields::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["experimental"], json!({}));
        assert_eq!(value["control"]["size_avg"], json!(5.0));
        assert_eq!(value["control"]["pi_avg"], json!(0.2));
    }

    #[test]
    fn removal_method_uses_wire_spellings() {
        assert_eq!(
            serde_json::to_value(RemovalMethod::ZScore).unwrap(),
            json!("Z-Score")
        );
        assert_eq!(
            serde_json::from_value::<RemovalMethod>(json!("IQR")).unwrap(),
            RemovalMethod::Iqr
        );
        assert_eq!(
            serde_json::from_value::<RemovalMethod>(json!("Manual")).unwrap(),
            RemovalMethod::Manual
        );
    }

    #[test]
    fn sample_record_defaults_to_manual_without_threshold() {
        let record: SampleRecord = serde_json::from_value(json!({
            "sample_name": "A-1",
            "size_avg": 120.5,
            "pi_avg": 0.21
        }))
        .unwrap();
        assert_eq!(record.removal_method, RemovalMethod::Manual);
        assert_eq!(record.threshold_used, "N/A");
        assert_eq!(record.custom_data_value, None);
    }

    #[test]
    fn calculation_response_decodes_method_blocks() {
        let value = json!({
            "status": "success",
            "original_count": 20,
            "sample_name": "S-1",
            "production_date": "2024-11-02",
            "pass_count": 3,
            "zscore": {"threshold": 3.0, "count": 18, "outliers_count": 2,
                        "size_mean": 101.2, "size_std": 4.1, "pi_mean": 0.22, "pi_std": 0.01},
            "iqr": {"threshold": 1.5, "count": 19, "outliers_count": 1,
                     "size_mean": 100.8, "size_std": 4.9, "pi_mean": 0.23, "pi_std": 0.02},
            "mad": {"threshold": 3.5, "count": 20, "outliers_count": 0,
                     "size_mean": 100.1, "size_std": 5.2, "pi_mean": 0.23, "pi_std": 0.02},
            "scatter_plot": "{\"data\":[],\"layout\":{}}"
        });
        let response: CalculationResponse = decode_envelope(value).unwrap();
        assert_eq!(response.zscore.outliers_count, 2);
        assert_eq!(response.mad.threshold, 3.5);
        assert!(response.scatter_plot.is_some());
    }
}
