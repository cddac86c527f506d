//! The application context: one explicit object owning the table view,
//! metadata fields, thresholds, group board, cached calculation result,
//! dataset catalog and notification log, plus the orchestration of every
//! user-triggered action.
//!
//! Each action awaits its synchronization call before touching any state
//! derived from it, so a single action's effects apply atomically and a
//! failed call leaves the session exactly as it was. Calls run on the UI
//! thread, which serializes mutations by construction; the last completed
//! full-table replacement wins.

use crate::api_client::ApiClient;
use crate::error::ClientError;
use crate::notifications::NotificationLog;
use crate::numeric::coerce_number;
use crate::pass_groups::{classify_removal_method, validate_both_groups, GroupBoard};
use crate::protocol::{
    BothGroupsRequest, CalculationResponse, CompareResponse, CustomCorrelationResponse,
    DatasetInfo, GroupEntryRequest, GroupFields, GroupKind, GroupUpdateResponse, RemovalMethod,
    SessionSnapshot, TableDataResponse, ThresholdConfiguration, TrendResponse, UpdateDataRequest,
};
use crate::table_data::TableDataset;
use crate::table_view::TableView;
use crate::TRANSLATIONS;
use std::path::Path;

/// Row count of a freshly initialized table, matching the server default.
pub const DEFAULT_ROW_COUNT: usize = 20;

/// Input buffers of the combined group-entry form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupEntryForm {
    pub sample_name: String,
    pub exp_size: String,
    pub exp_pi: String,
    pub exp_custom: String,
    pub ctrl_size: String,
    pub ctrl_pi: String,
    pub ctrl_custom: String,
}

impl GroupEntryForm {
    pub fn experimental_fields(&self) -> GroupFields {
        GroupFields {
            size_avg: coerce_number(&self.exp_size),
            pi_avg: coerce_number(&self.exp_pi),
            custom_data_value: coerce_number(&self.exp_custom),
            ..GroupFields::default()
        }
    }

    pub fn control_fields(&self) -> GroupFields {
        GroupFields {
            size_avg: coerce_number(&self.ctrl_size),
            pi_avg: coerce_number(&self.ctrl_pi),
            custom_data_value: coerce_number(&self.ctrl_custom),
            ..GroupFields::default()
        }
    }

    pub fn clear_values(&mut self) {
        *self = Self::default();
    }
}

pub struct AppSession {
    client: ApiClient,
    pub table: TableView,
    pub sample_name: String,
    pub production_date: String,
    pub pass_count_input: String,
    pub custom_field_name: String,
    pub thresholds: ThresholdConfiguration,
    pub group_form: GroupEntryForm,
    pub groups: GroupBoard,
    pub last_calculation: Option<CalculationResponse>,
    pub datasets: Vec<DatasetInfo>,
    pub comparison: Option<CompareResponse>,
    pub trend: Option<TrendResponse>,
    pub custom_correlation: Option<CustomCorrelationResponse>,
    pub notifications: NotificationLog,
}

impl AppSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            table: TableDataset::new(DEFAULT_ROW_COUNT).render(),
            sample_name: String::new(),
            production_date: String::new(),
            pass_count_input: "1".to_string(),
            custom_field_name: String::new(),
            thresholds: ThresholdConfiguration::default(),
            group_form: GroupEntryForm::default(),
            groups: GroupBoard::default(),
            last_calculation: None,
            datasets: Vec::new(),
            comparison: None,
            trend: None,
            custom_correlation: None,
            notifications: NotificationLog::default(),
        }
    }

    pub fn server_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count_input.trim().parse().unwrap_or(1)
    }

    fn custom_data_name(&self) -> Option<String> {
        let trimmed = self.custom_field_name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Server rejections and local precondition failures surface their
    /// message verbatim; transport detail goes to the log behind a fixed
    /// localized notification.
    fn notify_error(&mut self, err: ClientError) {
        match err.user_message() {
            Some(message) => self.notifications.error(message.to_string()),
            None => {
                log::warn!("request failed: {err}");
                self.notifications.error(TRANSLATIONS.get("err_transport"));
            }
        }
    }

    // -- table -------------------------------------------------------------

    /// The canonical dataset as currently entered.
    pub fn current_dataset(&self) -> TableDataset {
        TableDataset::extract(&self.table)
    }

    fn update_request(&self) -> UpdateDataRequest {
        UpdateDataRequest {
            sample_name: self.sample_name.clone(),
            production_date: self.production_date.clone(),
            pass_count: self.pass_count(),
            table_data: self.current_dataset(),
        }
    }

    /// Authoritative-snapshot reducer: a complete dataset becomes the new
    /// rendered table wholesale.
    pub fn replace_table(&mut self, dataset: &TableDataset) {
        self.table = dataset.render();
    }

    /// Pushes the current grid contents to the server.
    pub fn sync_table(&mut self) {
        let request = self.update_request();
        if let Err(err) = self.client.update_data(&request) {
            self.notify_error(err);
        }
    }

    fn apply_table_response(&mut self, response: &TableDataResponse) {
        if let Some(sample_name) = &response.sample_name {
            self.sample_name = sample_name.clone();
        }
        if let Some(production_date) = &response.production_date {
            self.production_date = production_date.clone();
        }
        if let Some(pass_count) = response.pass_count {
            self.pass_count_input = pass_count.to_string();
        }
        self.replace_table(&response.table_data);
    }

    pub fn add_row(&mut self) {
        match self.client.add_row() {
            Ok(response) => self.replace_table(&response.table_data),
            Err(err) => self.notify_error(err),
        }
    }

    pub fn add_column(&mut self, column_name: &str) {
        let trimmed = column_name.trim();
        if trimmed.is_empty() {
            let message = TRANSLATIONS.get("err_column_name_required");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        match self.client.add_column(trimmed) {
            Ok(response) => self.replace_table(&response.table_data),
            Err(err) => self.notify_error(err),
        }
    }

    /// Confirmed reset: the server rebuilds the default table and hands
    /// back the cleared metadata; the cached detection result dies with
    /// the data it described.
    pub fn reset_data(&mut self) {
        match self.client.reset_data() {
            Ok(response) => {
                self.apply_table_response(&response);
                self.last_calculation = None;
            }
            Err(err) => self.notify_error(err),
        }
    }

    /// Confirmed row deletion: drop the row locally, then push the
    /// re-extracted dataset so the server renumbers with us.
    pub fn delete_row(&mut self, index: usize) {
        if self.table.delete_row(index) {
            self.sync_table();
        }
    }

    pub fn upload_file(&mut self, path: &Path) {
        match self.client.upload_file(path) {
            Ok(response) => {
                self.replace_table(&response.table_data);
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| TRANSLATIONS.get("ok_upload"));
                self.notifications.success(message);
                if let Some(mapping) = &response.columns_mapped {
                    let mut lines = vec![TRANSLATIONS.get("i_column_mapping")];
                    for (column, mapped) in mapping {
                        if let Some(mapped) = mapped {
                            lines.push(format!("{column}: {mapped}"));
                        }
                    }
                    self.notifications.info(lines.join("\n"));
                }
            }
            Err(err) => self.notify_error(err),
        }
    }

    /// Table export; synchronizes first so the file reflects the latest
    /// edits, then hands the bytes to a save dialog.
    pub fn download_table(&mut self, data_only: bool) {
        self.sync_table();
        let result = self.client.download_table_data(data_only);
        self.finish_download(result);
    }

    pub fn download_results(&mut self, combined: bool) {
        if self.last_calculation.is_none() {
            let message = TRANSLATIONS.get("err_no_result");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        let result = if combined {
            self.client.download_combined_results()
        } else {
            self.client.download_csv()
        };
        self.finish_download(result);
    }

    fn finish_download(
        &mut self,
        result: Result<crate::downloads::DownloadedFile, ClientError>,
    ) {
        match result.and_then(|file| crate::downloads::save_with_dialog(&file)) {
            Ok(Some(path)) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.notifications
                    .success(TRANSLATIONS.get("ok_download").replace("{}", &name));
            }
            Ok(None) => {} // dialog dismissed
            Err(err) => self.notify_error(err),
        }
    }

    // -- detection ---------------------------------------------------------

    pub fn run_detection(&mut self) {
        match self.client.calculate_with_thresholds(self.thresholds) {
            Ok(response) => self.last_calculation = Some(response),
            Err(err) => self.notify_error(err),
        }
    }

    // -- groups ------------------------------------------------------------

    /// Combined add. Incomplete sub-payloads collapse to `{}`; a complete
    /// one gets its removal-method tag classified against the cached
    /// calculation result so hand-edited values stay `Manual`.
    pub fn add_both_groups(&mut self) {
        let request = BothGroupsRequest {
            sample_name: self.group_form.sample_name.trim().to_string(),
            custom_data_name: self.custom_data_name(),
            experimental: self.classified(self.group_form.experimental_fields()),
            control: self.classified(self.group_form.control_fields()),
        };
        if let Err(err) = validate_both_groups(&request) {
            self.notify_error(err);
            return;
        }
        match self.client.add_both_groups(&request) {
            Ok(response) => {
                self.group_form.clear_values();
                self.apply_group_response(&response);
            }
            Err(err) => self.notify_error(err),
        }
    }

    fn classified(&self, fields: GroupFields) -> GroupFields {
        let fields = fields.complete_or_empty();
        match (fields.size_avg, fields.pi_avg) {
            (Some(size_avg), Some(pi_avg)) => {
                let (method, threshold) = classify_removal_method(
                    size_avg,
                    pi_avg,
                    self.last_calculation.as_ref(),
                    RemovalMethod::Manual,
                );
                GroupFields {
                    removal_method: Some(method),
                    threshold_used: Some(threshold),
                    ..fields
                }
            }
            _ => fields,
        }
    }

    /// Commits the cached detection result (Z-score summary) to a group.
    pub fn add_from_result(&mut self, group: GroupKind) {
        if self.last_calculation.is_none() {
            let message = TRANSLATIONS.get("err_no_result");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        let sample_name = self.sample_name.trim().to_string();
        if sample_name.is_empty() {
            let message = TRANSLATIONS.get("err_sample_name_required");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        let Some(calculation) = &self.last_calculation else {
            return;
        };
        let summary = &calculation.zscore;
        let (removal_method, threshold_used) = classify_removal_method(
            summary.size_mean,
            summary.pi_mean,
            Some(calculation),
            RemovalMethod::ZScore,
        );
        let request = GroupEntryRequest {
            sample_name,
            size_avg: summary.size_mean,
            pi_avg: summary.pi_mean,
            custom_data_value: None,
            custom_data_name: self.custom_data_name(),
            removal_method,
            threshold_used,
        };
        match self.client.add_group_entry(group, &request) {
            Ok(response) => self.apply_group_response(&response),
            Err(err) => self.notify_error(err),
        }
    }

    /// Confirmed deletion by sample name within one group.
    pub fn delete_group_entry(&mut self, group: GroupKind, sample_name: &str) {
        match self.client.delete_group_entry(group, sample_name) {
            Ok(response) => self.apply_group_response(&response),
            Err(err) => self.notify_error(err),
        }
    }

    fn apply_group_response(&mut self, response: &GroupUpdateResponse) {
        self.groups.apply_response(response);
        if let Some(name) = &response.custom_data_field_name {
            self.custom_field_name = name.clone();
        }
        if let Some(message) = &response.message {
            self.notifications.success(message.clone());
        }
    }

    // -- datasets ----------------------------------------------------------

    pub fn refresh_datasets(&mut self) {
        match self.client.get_saved_datasets() {
            Ok(response) => self.datasets = response.datasets,
            Err(err) => self.notify_error(err),
        }
    }

    pub fn save_dataset(&mut self, dataset_name: &str) {
        let trimmed = dataset_name.trim();
        if trimmed.is_empty() {
            let message = TRANSLATIONS.get("err_dataset_name_required");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        match self.client.save_dataset(trimmed) {
            Ok(_) => {
                self.notifications.success(TRANSLATIONS.get("ok_dataset_saved"));
                self.refresh_datasets();
            }
            Err(err) => self.notify_error(err),
        }
    }

    pub fn load_dataset(&mut self, dataset_name: &str) {
        match self.client.load_dataset(dataset_name) {
            Ok(response) => {
                self.sample_name = response.sample_name.clone();
                self.production_date = response.production_date.clone();
                self.pass_count_input = response.pass_count.to_string();
                if let Some(name) = &response.custom_data_field_name {
                    self.custom_field_name = name.clone();
                }
                self.replace_table(&response.table_data);
                self.notifications
                    .success(TRANSLATIONS.get("ok_dataset_loaded"));
            }
            Err(err) => self.notify_error(err),
        }
    }

    pub fn delete_dataset(&mut self, dataset_name: &str) {
        match self.client.delete_dataset(dataset_name) {
            Ok(_) => {
                self.notifications
                    .success(TRANSLATIONS.get("ok_dataset_deleted"));
                self.refresh_datasets();
            }
            Err(err) => self.notify_error(err),
        }
    }

    /// Comparison needs at least two datasets; fewer is rejected locally
    /// without a round trip.
    pub fn compare_datasets(&mut self, dataset_names: &[String]) {
        if dataset_names.len() < 2 {
            let message = TRANSLATIONS.get("err_compare_selection");
            self.notify_error(ClientError::Precondition(message));
            return;
        }
        match self.client.compare_datasets(dataset_names) {
            Ok(response) => self.comparison = Some(response),
            Err(err) => self.notify_error(err),
        }
    }

    // -- trend / correlation -----------------------------------------------

    pub fn show_trend(&mut self) {
        match self.client.pass_trend() {
            Ok(response) => self.trend = Some(response),
            Err(err) => self.notify_error(err),
        }
    }

    pub fn show_custom_correlation(&mut self) {
        match self.client.custom_correlation() {
            Ok(response) => self.custom_correlation = Some(response),
            Err(err) => self.notify_error(err),
        }
    }

    // -- bootstrap ---------------------------------------------------------

    /// Renders a prior session snapshot through the same paths as live
    /// responses, so there is no separate restore format.
    pub fn restore_snapshot(&mut self, snapshot: SessionSnapshot) {
        if let Some(sample_name) = snapshot.sample_name {
            self.sample_name = sample_name;
        }
        if let Some(production_date) = snapshot.production_date {
            self.production_date = production_date;
        }
        if let Some(pass_count) = snapshot.pass_count {
            self.pass_count_input = pass_count.to_string();
        }
        if let Some(name) = snapshot.custom_data_field_name {
            self.custom_field_name = name;
        }
        if let Some(table_data) = &snapshot.table_data {
            self.replace_table(table_data);
        }
        let groups = GroupUpdateResponse {
            experimental_data: snapshot.experimental_data,
            control_data: snapshot.control_data,
            pass_averages: snapshot.pass_averages,
            ..GroupUpdateResponse::default()
        };
        self.groups.apply_response(&groups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MethodSummary;
    use crate::table_data::{COLUMN_NO, COLUMN_PI, COLUMN_SIZE};

    fn session() -> AppSession {
        AppSession::new(ApiClient::new("http://127.0.0.1:1"))
    }

    #[test]
    fn fresh_session_renders_the_default_table() {
        let session = session();
        assert_eq!(session.table.row_count(), DEFAULT_ROW_COUNT);
        assert_eq!(session.pass_count(), 1);
        let dataset = session.current_dataset();
        assert_eq!(dataset.row_count(), DEFAULT_ROW_COUNT);
        assert_eq!(
            dataset.column(COLUMN_SIZE).unwrap().values,
            vec![None; DEFAULT_ROW_COUNT]
        );
    }

    #[test]
    fn entered_values_survive_extraction() {
        let mut session = session();
        session.replace_table(&TableDataset::new(3));
        for (row, (size, pi)) in [("10", "0.1"), ("20", "0.2"), ("30", "0.3")]
            .iter()
            .enumerate()
        {
            session.table.rows[row].cells[0].buffer = size.to_string();
            session.table.rows[row].cells[1].buffer = pi.to_string();
        }
        let dataset = session.current_dataset();
        assert_eq!(
            dataset.column(COLUMN_NO).unwrap().values,
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(
            dataset.column(COLUMN_SIZE).unwrap().values,
            vec![Some(10.0), Some(20.0), Some(30.0)]
        );
        assert_eq!(
            dataset.column(COLUMN_PI).unwrap().values,
            vec![Some(0.1), Some(0.2), Some(0.3)]
        );
    }

    #[test]
    fn malformed_pass_count_falls_back_to_one() {
        let mut session = session();
        session.pass_count_input = "three".to_string();
        assert_eq!(session.pass_count(), 1);
        session.pass_count_input = "7".to_string();
        assert_eq!(session.pass_count(), 7);
    }

    #[test]
    fn compare_with_one_dataset_is_rejected_locally() {
        let mut session = session();
        session.compare_datasets(&["only-one".to_string()]);
        // Rejected before any request: the unroutable client address was
        // never touched, and the message is the local precondition.
        let notice = session.notifications.latest().unwrap();
        assert_eq!(notice.message, TRANSLATIONS.get("err_compare_selection"));
        assert!(session.comparison.is_none());
    }

    #[test]
    fn add_both_groups_with_no_complete_group_is_rejected_locally() {
        let mut session = session();
        session.group_form.sample_name = "P-1".to_string();
        session.group_form.exp_size = "5.0".to_string(); // PI missing
        session.add_both_groups();
        let notice = session.notifications.latest().unwrap();
        assert_eq!(notice.message, TRANSLATIONS.get("err_one_group_required"));
    }

    #[test]
    fn classified_fields_pick_up_matching_method_tags() {
        let mut session = session();
        let summary = MethodSummary {
            threshold: 3.0,
            count: 18,
            outliers_count: 2,
            size_mean: 101.0,
            size_std: 1.0,
            pi_mean: 0.21,
            pi_std: 0.01,
        };
        session.last_calculation = Some(CalculationResponse {
            original_count: 20,
            sample_name: "S".to_string(),
            production_date: String::new(),
            pass_count: 1,
            zscore: summary.clone(),
            iqr: MethodSummary {
                size_mean: 200.0,
                ..summary.clone()
            },
            mad: MethodSummary {
                size_mean: 300.0,
                ..summary
            },
            scatter_plot: None,
        });

        let matching = session.classified(GroupFields {
            size_avg: Some(101.0),
            pi_avg: Some(0.21),
            ..GroupFields::default()
        });
        assert_eq!(matching.removal_method, Some(RemovalMethod::ZScore));
        assert_eq!(matching.threshold_used.as_deref(), Some("3"));

        let edited = session.classified(GroupFields {
            size_avg: Some(101.0),
            pi_avg: Some(0.211), // off by 0.001
            ..GroupFields::default()
        });
        assert_eq!(edited.removal_method, Some(RemovalMethod::Manual));
        assert_eq!(edited.threshold_used.as_deref(), Some("N/A"));
    }

    #[test]
    fn snapshot_restores_through_live_render_paths() {
        let mut session = session();
        let snapshot: SessionSnapshot = serde_json::from_str(
            r#"{
                "sample_name": "S-9",
                "production_date": "2024-11-02",
                "pass_count": 4,
                "custom_data_field_name": "Viscosity",
                "table_data": {"No.": [1, 2], "Size(nm)": [10, 20], "PI": [0.1, null]},
                "experimental_data": [
                    {"sample_name": "b", "size_avg": 1.0, "pi_avg": 0.1},
                    {"sample_name": "a", "size_avg": 2.0, "pi_avg": 0.2}
                ]
            }"#,
        )
        .unwrap();
        session.restore_snapshot(snapshot);
        assert_eq!(session.sample_name, "S-9");
        assert_eq!(session.pass_count(), 4);
        assert_eq!(session.custom_field_name, "Viscosity");
        assert_eq!(session.table.row_count(), 2);
        assert_eq!(session.table.rows[0].cells[0].buffer, "10");
        assert_eq!(session.table.rows[1].cells[1].buffer, "");
        // Group list went through the same full-replace path: sorted.
        assert_eq!(session.groups.experimental[0].sample_name, "a");
    }

    #[test]
    fn deleting_a_view_row_renumbers_on_extraction() {
        let mut session = session();
        session.replace_table(&TableDataset::new(3));
        session.table.rows[0].cells[0].buffer = "10".to_string();
        session.table.rows[2].cells[0].buffer = "30".to_string();
        assert!(session.table.delete_row(1));
        let dataset = session.current_dataset();
        assert_eq!(
            dataset.column(COLUMN_NO).unwrap().values,
            vec![Some(1.0), Some(2.0)]
        );
        assert_eq!(
            dataset.column(COLUMN_SIZE).unwrap().values,
            vec![Some(10.0), Some(30.0)]
        );
    }
}
