//! Blocking synchronization client for the analysis service.
//!
//! One thin wrapper per endpoint: serialize the typed request, perform the
//! round trip, split the shared envelope. The client never interprets
//! payloads, never retries, sets no explicit timeout and cannot cancel a
//! request in flight; callers await each call before touching any state
//! derived from it.

use crate::downloads::{self, DownloadedFile};
use crate::error::ClientError;
use crate::protocol::{
    decode_envelope, Ack, AddColumnRequest, BothGroupsRequest, CalculateRequest,
    CalculationResponse, CompareDatasetsRequest, CompareResponse, CustomCorrelationResponse,
    DatasetLoadResponse, DatasetNameRequest, DeleteGroupEntryRequest, GroupEntryRequest,
    GroupKind, GroupUpdateResponse, SavedDatasetsResponse, TableDataResponse,
    ThresholdConfiguration, TrendResponse, UpdateDataRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const SERVER_URL_ENV: &str = "DLSQC_SERVER_URL";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        let base = std::env::var(SERVER_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        Self::new(&base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let value = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()?
            .json::<serde_json::Value>()?;
        decode_envelope(value)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let value = self
            .http
            .get(self.endpoint(path))
            .send()?
            .json::<serde_json::Value>()?;
        decode_envelope(value)
    }

    /// Download endpoints answer either with a CSV stream (named via
    /// `Content-Disposition`) or with a plain error envelope.
    fn get_download(&self, path: &str, fallback_name: &str) -> Result<DownloadedFile, ClientError> {
        let response = self.http.get(self.endpoint(path)).send()?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|header| header.to_str().ok())
            .and_then(downloads::filename_from_content_disposition);
        match filename {
            Some(filename) => Ok(DownloadedFile {
                filename,
                bytes: response.bytes()?.to_vec(),
            }),
            None => {
                let value = response.json::<serde_json::Value>()?;
                let _: Ack = decode_envelope(value)?;
                // A success envelope on a download endpoint still carries
                // no file; treat it like a named fallback export.
                Err(ClientError::Server(format!(
                    "no export stream received for {fallback_name}"
                )))
            }
        }
    }

    // -- table -------------------------------------------------------------

    pub fn update_data(&self, request: &UpdateDataRequest) -> Result<Ack, ClientError> {
        self.post_json("/update_data", request)
    }

    pub fn add_row(&self) -> Result<TableDataResponse, ClientError> {
        self.post_json("/add_row", &serde_json::json!({}))
    }

    pub fn add_column(&self, column_name: &str) -> Result<TableDataResponse, ClientError> {
        self.post_json(
            "/add_column",
            &AddColumnRequest {
                column_name: column_name.to_string(),
            },
        )
    }

    pub fn reset_data(&self) -> Result<TableDataResponse, ClientError> {
        self.post_json("/reset_data", &serde_json::json!({}))
    }

    pub fn upload_file(&self, path: &Path) -> Result<TableDataResponse, ClientError> {
        let form = reqwest::blocking::multipart::Form::new().file("file", path)?;
        let value = self
            .http
            .post(self.endpoint("/upload_file"))
            .multipart(form)
            .send()?
            .json::<serde_json::Value>()?;
        decode_envelope(value)
    }

    pub fn download_table_data(&self, data_only: bool) -> Result<DownloadedFile, ClientError> {
        let path = if data_only {
            "/download_table_data?data_only=true"
        } else {
            "/download_table_data"
        };
        self.get_download(path, "table_data.csv")
    }

    // -- detection ---------------------------------------------------------

    pub fn calculate_with_thresholds(
        &self,
        thresholds: ThresholdConfiguration,
    ) -> Result<CalculationResponse, ClientError> {
        self.post_json("/calculate_with_thresholds", &CalculateRequest { thresholds })
    }

    pub fn download_csv(&self) -> Result<DownloadedFile, ClientError> {
        self.get_download("/download_csv", "outlier_results.csv")
    }

    pub fn download_combined_results(&self) -> Result<DownloadedFile, ClientError> {
        self.get_download("/download_combined_results", "combined_results.csv")
    }

    // -- groups ------------------------------------------------------------

    pub fn add_experimental_data(
        &self,
        request: &GroupEntryRequest,
    ) -> Result<GroupUpdateResponse, ClientError> {
        self.post_json("/add_experimental_data", request)
    }

    pub fn add_control_data(
        &self,
        request: &GroupEntryRequest,
    ) -> Result<GroupUpdateResponse, ClientError> {
        self.post_json("/add_control_data", request)
    }

    pub fn add_group_entry(
        &self,
        group: GroupKind,
        request: &GroupEntryRequest,
    ) -> Result<GroupUpdateResponse, ClientError> {
        match group {
            GroupKind::Experimental => self.add_experimental_data(request),
            GroupKind::Control => self.add_control_data(request),
        }
    }

    pub fn add_both_groups(
        &self,
        request: &BothGroupsRequest,
    ) -> Result<GroupUpdateResponse, ClientError> {
        self.post_json("/add_both_groups_pass_average", request)
    }

    pub fn delete_group_entry(
        &self,
        group: GroupKind,
        sample_name: &str,
    ) -> Result<GroupUpdateResponse, ClientError> {
        let request = DeleteGroupEntryRequest {
            sample_name: sample_name.to_string(),
            group_type: group,
        };
        match group {
            GroupKind::Experimental => self.post_json("/delete_pass_average", &request),
            GroupKind::Control => self.post_json("/delete_control_data", &request),
        }
    }

    // -- datasets ----------------------------------------------------------

    pub fn save_dataset(&self, dataset_name: &str) -> Result<GroupUpdateResponse, ClientError> {
        self.post_json(
            "/save_dataset",
            &DatasetNameRequest {
                dataset_name: dataset_name.to_string(),
            },
        )
    }

    pub fn load_dataset(&self, dataset_name: &str) -> Result<DatasetLoadResponse, ClientError> {
        self.post_json(
            "/load_dataset",
            &DatasetNameRequest {
                dataset_name: dataset_name.to_string(),
            },
        )
    }

    pub fn delete_dataset(&self, dataset_name: &str) -> Result<Ack, ClientError> {
        self.post_json(
            "/delete_dataset",
            &DatasetNameRequest {
                dataset_name: dataset_name.to_string(),
            },
        )
    }

    pub fn get_saved_datasets(&self) -> Result<SavedDatasetsResponse, ClientError> {
        self.get_json("/get_saved_datasets")
    }

    pub fn compare_datasets(
        &self,
        dataset_names: &[String],
    ) -> Result<CompareResponse, ClientError> {
        self.post_json(
            "/compare_datasets",
            &CompareDatasetsRequest {
                dataset_names: dataset_names.to_vec(),
            },
        )
    }

    // -- trend / correlation -----------------------------------------------

    pub fn pass_trend(&self) -> Result<TrendResponse, ClientError> {
        self.get_json("/get_pass_trend_data")
    }

    pub fn custom_correlation(&self) -> Result<CustomCorrelationResponse, ClientError> {
        self.get_json("/get_custom_data_correlation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed_of_trailing_slashes() {
        let client = ApiClient::new("http://lab-server:5000/");
        assert_eq!(client.base_url(), "http://lab-server:5000");
        assert_eq!(
            client.endpoint("/update_data"),
            "http://lab-server:5000/update_data"
        );
    }
}
