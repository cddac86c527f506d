//! CSV export plumbing: filename extraction from `Content-Disposition`
//! headers and saving the received bytes to disk.

use crate::error::ClientError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref FILENAME_STAR: Regex =
        Regex::new(r"filename\*=UTF-8''([^;]+)").expect("filename pattern");
}

/// One downloaded export, named by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    /// Writes the export under its server-assigned name. Used by headless
    /// callers and tests; the GUI goes through [`save_with_dialog`].
    pub fn write_to(&self, directory: &Path) -> Result<PathBuf, ClientError> {
        let path = directory.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Parses the RFC 5987 `filename*=UTF-8''...` parameter the server uses
/// for non-ASCII export names.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    FILENAME_STAR
        .captures(header)
        .and_then(|captures| captures.get(1))
        .map(|m| percent_decode(m.as_str().trim().trim_matches('"')))
        .filter(|name| !name.is_empty())
}

fn percent_decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&encoded[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Asks the user where to put the export, seeded with the server-assigned
/// name. `Ok(None)` means the dialog was dismissed.
pub fn save_with_dialog(file: &DownloadedFile) -> Result<Option<PathBuf>, ClientError> {
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(&file.filename)
        .save_file()
    else {
        return Ok(None);
    };
    fs::write(&path, &file.bytes)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_encoded_utf8_filename() {
        let header =
            "attachment; filename*=UTF-8''outlier_results_%EC%83%98%ED%94%8C_20241102.csv";
        assert_eq!(
            filename_from_content_disposition(header).as_deref(),
            Some("outlier_results_샘플_20241102.csv")
        );
    }

    #[test]
    fn plain_ascii_filenames_pass_through() {
        let header = "attachment; filename*=UTF-8''table_data.csv";
        assert_eq!(
            filename_from_content_disposition(header).as_deref(),
            Some("table_data.csv")
        );
    }

    #[test]
    fn header_without_extended_parameter_yields_none() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=data.csv"),
            None
        );
    }

    #[test]
    fn malformed_percent_escapes_are_kept_literally() {
        assert_eq!(percent_decode("a%ZZb%4"), "a%ZZb%4");
        assert_eq!(percent_decode("100%"), "100%");
    }

    #[test]
    fn write_to_uses_server_assigned_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = DownloadedFile {
            filename: "export.csv".to_string(),
            bytes: b"No.,Size(nm),PI\n1,10,0.1\n".to_vec(),
        };
        let path = file.write_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "export.csv");
        assert_eq!(std::fs::read(path).unwrap(), file.bytes);
    }
}
