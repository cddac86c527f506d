//! UI translation catalogs and language helpers.
//!
//! The deployment sites of the original tool run a Korean UI, so the
//! catalog ships English and Korean columns.

use csv::ReaderBuilder;
use std::collections::HashMap;

pub struct Translations {
    values: HashMap<String, String>,
    language: String,
}

impl Translations {
    fn from_text(csv_text: &str) -> Self {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());

        let headers = rdr
            .headers()
            .expect("Could not read translations.csv headers");
        let mut languages = Self::to_vec(headers);
        let _ = languages.remove(0); // Remove the key column

        let mut values = HashMap::new();
        for record in rdr.records().flatten() {
            let mut record = Self::to_vec(&record);
            let key = record.remove(0);
            for (lnum, t) in record.iter().enumerate() {
                let lang_key = format!("{}:{key}", languages[lnum]);
                values.insert(lang_key, t.to_owned());
            }
        }

        Self {
            values,
            language: "en".to_owned(),
        }
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    /// Falls back to the key itself so a missing row degrades visibly
    /// instead of taking the UI down.
    pub fn get(&self, key: &str) -> String {
        let lang_key = format!("{}:{}", self.language, key);
        self.values
            .get(&lang_key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn to_vec(record: &csv::StringRecord) -> Vec<String> {
        record.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for Translations {
    fn default() -> Self {
        let text = include_str!("../assets/translations.csv");
        Self::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let translations = Translations::default();
        assert_eq!(translations.get("b_add_row"), "Add row");
    }

    #[test]
    fn test_ko() {
        let mut translations = Translations::default();
        translations.set_language("ko");
        assert_eq!(translations.get("b_add_row"), "행 추가");
    }

    #[test]
    fn missing_keys_fall_back_to_the_key() {
        let translations = Translations::default();
        assert_eq!(translations.get("no_such_key"), "no_such_key");
    }
}
