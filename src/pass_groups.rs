//! Experimental/control group reconciliation.
//!
//! Both group tables are replaced wholesale from the server's
//! post-mutation lists after every add or delete, never patched
//! incrementally, so the client view matches server state exactly after
//! each round trip.

use crate::error::ClientError;
use crate::protocol::{
    BothGroupsRequest, CalculationResponse, GroupKind, GroupUpdateResponse, RemovalMethod,
    SampleRecord,
};
use crate::TRANSLATIONS;
use itertools::Itertools;

/// Absolute tolerance on both dimensions when matching submitted averages
/// against a cached method result.
pub const METHOD_MATCH_TOLERANCE: f64 = 0.0005;
pub const NO_THRESHOLD: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBoard {
    pub experimental: Vec<SampleRecord>,
    pub control: Vec<SampleRecord>,
}

impl GroupBoard {
    pub fn records(&self, group: GroupKind) -> &[SampleRecord] {
        match group {
            GroupKind::Experimental => &self.experimental,
            GroupKind::Control => &self.control,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.experimental.is_empty() && self.control.is_empty()
    }

    /// Full-table replacement from an authoritative response. Lists the
    /// response does not carry are left untouched. A combined
    /// `pass_averages` list replaces both tables, split by each record's
    /// group tag.
    pub fn apply_response(&mut self, response: &GroupUpdateResponse) {
        if let Some(records) = &response.pass_averages {
            let (experimental, control): (Vec<SampleRecord>, Vec<SampleRecord>) = records
                .iter()
                .cloned()
                .partition(|record| record.group_type != Some(GroupKind::Control));
            self.experimental = sorted_by_name(experimental);
            self.control = sorted_by_name(control);
            return;
        }
        if let Some(records) = &response.experimental_data {
            self.experimental = sorted_by_name(records.clone());
        }
        if let Some(records) = &response.control_data {
            self.control = sorted_by_name(records.clone());
        }
    }
}

fn sorted_by_name(records: Vec<SampleRecord>) -> Vec<SampleRecord> {
    records
        .into_iter()
        .sorted_by(|a, b| a.sample_name.cmp(&b.sample_name))
        .collect()
}

/// Picks the removal-method tag for averages about to be committed.
///
/// The UI allows free-text editing of values that originated from a
/// detection run, and a hand-edited value must not be silently labeled as
/// a method's output: a method tag is attached only when the submitted
/// averages match that method's cached result within
/// [`METHOD_MATCH_TOLERANCE`] on both dimensions. Among several matches
/// the smallest combined deviation wins; without one, the caller's
/// default stands with no threshold.
pub fn classify_removal_method(
    size_avg: f64,
    pi_avg: f64,
    cached: Option<&CalculationResponse>,
    fallback: RemovalMethod,
) -> (RemovalMethod, String) {
    let Some(result) = cached else {
        return (fallback, NO_THRESHOLD.to_string());
    };
    let candidates = [
        (RemovalMethod::ZScore, &result.zscore),
        (RemovalMethod::Iqr, &result.iqr),
        (RemovalMethod::Mad, &result.mad),
    ];
    let mut best: Option<(RemovalMethod, f64, f64)> = None;
    for (method, summary) in candidates {
        let size_delta = (summary.size_mean - size_avg).abs();
        let pi_delta = (summary.pi_mean - pi_avg).abs();
        if size_delta >= METHOD_MATCH_TOLERANCE || pi_delta >= METHOD_MATCH_TOLERANCE {
            continue;
        }
        let distance = size_delta + pi_delta;
        if best.is_none_or(|(_, _, current)| distance < current) {
            best = Some((method, summary.threshold, distance));
        }
    }
    match best {
        Some((method, threshold, _)) => (method, format!("{threshold}")),
        None => (fallback, NO_THRESHOLD.to_string()),
    }
}

/// Local gate for the combined add: a sample name and at least one group
/// with both required averages, checked before any request goes out.
pub fn validate_both_groups(request: &BothGroupsRequest) -> Result<(), ClientError> {
    if request.sample_name.trim().is_empty() {
        return Err(ClientError::Precondition(
            TRANSLATIONS.get("err_sample_name_required"),
        ));
    }
    if !request.experimental.is_complete() && !request.control.is_complete() {
        return Err(ClientError::Precondition(
            TRANSLATIONS.get("err_one_group_required"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{GroupFields, MethodSummary};

    fn record(name: &str) -> SampleRecord {
        SampleRecord {
            sample_name: name.to_string(),
            size_avg: 100.0,
            pi_avg: 0.2,
            custom_data_value: None,
            removal_method: RemovalMethod::Manual,
            threshold_used: NO_THRESHOLD.to_string(),
            timestamp: String::new(),
            group_type: None,
        }
    }

    fn summary(threshold: f64, size_mean: f64, pi_mean: f64) -> MethodSummary {
        MethodSummary {
            threshold,
            count: 18,
            outliers_count: 2,
            size_mean,
            size_std: 1.0,
            pi_mean,
            pi_std: 0.01,
        }
    }

    fn calculation() -> CalculationResponse {
        CalculationResponse {
            original_count: 20,
            sample_name: "S".to_string(),
            production_date: String::new(),
            pass_count: 1,
            zscore: summary(3.0, 101.0, 0.210),
            iqr: summary(1.5, 102.0, 0.220),
            mad: summary(3.5, 103.0, 0.230),
            scatter_plot: None,
        }
    }

    #[test]
    fn group_lists_are_replaced_and_sorted_by_sample_name() {
        let mut board = GroupBoard {
            experimental: vec![record("zzz")],
            ..GroupBoard::default()
        };
        let response = GroupUpdateResponse {
            experimental_data: Some(vec![record("b"), record("a")]),
            control_data: Some(vec![record("d"), record("c")]),
            ..GroupUpdateResponse::default()
        };
        board.apply_response(&response);
        let names: Vec<&str> = board
            .experimental
            .iter()
            .map(|r| r.sample_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        let names: Vec<&str> = board.control.iter().map(|r| r.sample_name.as_str()).collect();
        assert_eq!(names, vec!["c", "d"]);
    }

    #[test]
    fn absent_lists_leave_tables_untouched() {
        let mut board = GroupBoard {
            experimental: vec![record("kept")],
            control: vec![record("kept-too")],
        };
        board.apply_response(&GroupUpdateResponse::default());
        assert_eq!(board.experimental.len(), 1);
        assert_eq!(board.control.len(), 1);
    }

    #[test]
    fn combined_list_splits_by_group_tag() {
        let mut board = GroupBoard::default();
        let mut control = record("c-1");
        control.group_type = Some(GroupKind::Control);
        let response = GroupUpdateResponse {
            pass_averages: Some(vec![record("e-1"), control]),
            ..GroupUpdateResponse::default()
        };
        board.apply_response(&response);
        assert_eq!(board.experimental[0].sample_name, "e-1");
        assert_eq!(board.control[0].sample_name, "c-1");
    }

    #[test]
    fn matching_averages_attach_method_and_threshold() {
        let cached = calculation();
        let (method, threshold) =
            classify_removal_method(101.0004, 0.2101, Some(&cached), RemovalMethod::Manual);
        assert_eq!(method, RemovalMethod::ZScore);
        assert_eq!(threshold, "3");
    }

    #[test]
    fn deviation_on_one_dimension_keeps_the_default() {
        let cached = calculation();
        // Size matches Z-Score exactly, PI is off by 0.001.
        let (method, threshold) =
            classify_removal_method(101.0, 0.211, Some(&cached), RemovalMethod::Manual);
        assert_eq!(method, RemovalMethod::Manual);
        assert_eq!(threshold, NO_THRESHOLD);
    }

    #[test]
    fn best_of_several_matches_wins() {
        let mut cached = calculation();
        cached.iqr = summary(1.5, 101.0003, 0.2100);
        // Both Z-Score and IQR are inside tolerance; IQR is closer.
        let (method, _) =
            classify_removal_method(101.0002, 0.2100, Some(&cached), RemovalMethod::Manual);
        assert_eq!(method, RemovalMethod::Iqr);
    }

    #[test]
    fn no_cached_result_keeps_the_default() {
        let (method, threshold) =
            classify_removal_method(100.0, 0.2, None, RemovalMethod::Manual);
        assert_eq!(method, RemovalMethod::Manual);
        assert_eq!(threshold, NO_THRESHOLD);
    }

    #[test]
    fn combined_add_requires_one_complete_group() {
        let request = BothGroupsRequest {
            sample_name: "P-1".to_string(),
            custom_data_name: None,
            experimental: GroupFields {
                size_avg: Some(5.0),
                ..GroupFields::default()
            },
            control: GroupFields::default(),
        };
        assert!(validate_both_groups(&request).is_err());

        let request = BothGroupsRequest {
            control: GroupFields {
                size_avg: Some(5.0),
                pi_avg: Some(0.2),
                ..GroupFields::default()
            },
            ..request
        };
        assert!(validate_both_groups(&request).is_ok());
    }

    #[test]
    fn combined_add_requires_a_sample_name() {
        let request = BothGroupsRequest {
            sample_name: "  ".to_string(),
            custom_data_name: None,
            experimental: GroupFields {
                size_avg: Some(1.0),
                pi_avg: Some(2.0),
                ..GroupFields::default()
            },
            control: GroupFields::default(),
        };
        assert!(validate_both_groups(&request).is_err());
    }
}
