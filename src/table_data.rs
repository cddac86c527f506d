//! Canonical ordered-column dataset behind the editable measurement grid.
//!
//! The dataset is the wire shape of the table: a mapping from column name
//! to an equal-length sequence of nullable numeric values, rows aligned by
//! position. The grid view is the live copy; the server holds the
//! authoritative copy after each successful synchronization. Rendering
//! always regenerates the whole view from a complete dataset, never
//! patching rows in place.

use crate::numeric::coerce_number;
use crate::table_view::{CellInput, RowView, TableView};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const COLUMN_NO: &str = "No.";
pub const COLUMN_SIZE: &str = "Size(nm)";
pub const COLUMN_PI: &str = "PI";

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl TableColumn {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
        }
    }

    /// Display casing is canonical for the two fixed columns, regardless
    /// of how the server spells the key.
    pub fn display_name(&self) -> &str {
        if self.name.eq_ignore_ascii_case(COLUMN_SIZE) {
            COLUMN_SIZE
        } else if self.name.eq_ignore_ascii_case(COLUMN_PI) {
            COLUMN_PI
        } else {
            self.name.as_str()
        }
    }
}

/// Invariants, maintained by [`TableDataset::normalized`]:
/// `No.` is always present and equals `1..=row_count` in order;
/// `Size(nm)` and `PI` always exist (created empty when missing) and sit
/// directly after `No.`; further columns keep their first-seen order;
/// every column holds exactly `row_count` values, missing ones as
/// explicit `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDataset {
    columns: Vec<TableColumn>,
}

impl TableDataset {
    /// Fresh dataset with `row_count` empty measurement rows.
    pub fn new(row_count: usize) -> Self {
        let mut columns = vec![
            TableColumn::new(COLUMN_NO),
            TableColumn::new(COLUMN_SIZE),
            TableColumn::new(COLUMN_PI),
        ];
        columns[0].values = (1..=row_count).map(|n| Some(n as f64)).collect();
        columns[1].values = vec![None; row_count];
        columns[2].values = vec![None; row_count];
        Self { columns }
    }

    /// Row count is defined by the `No.` column, zero when it is absent.
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .find(|c| c.name == COLUMN_NO)
            .map(|c| c.values.len())
            .unwrap_or(0)
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Re-establishes every dataset invariant: positional `No.`
    /// renumbering, presence and placement of the fixed columns,
    /// first-seen order for the rest, and uniform column lengths.
    pub fn normalized(self) -> Self {
        let row_count = self.row_count();
        let mut rest: Vec<TableColumn> = Vec::new();
        let mut size: Option<TableColumn> = None;
        let mut pi: Option<TableColumn> = None;
        for column in self.columns {
            if column.name == COLUMN_NO {
                continue;
            }
            if column.name.eq_ignore_ascii_case(COLUMN_SIZE) {
                if size.is_none() {
                    size = Some(column);
                }
            } else if column.name.eq_ignore_ascii_case(COLUMN_PI) {
                if pi.is_none() {
                    pi = Some(column);
                }
            } else if !rest.iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
                rest.push(column);
            }
        }

        let mut no = TableColumn::new(COLUMN_NO);
        no.values = (1..=row_count).map(|n| Some(n as f64)).collect();
        let mut columns = vec![
            no,
            size.unwrap_or_else(|| TableColumn::new(COLUMN_SIZE)),
            pi.unwrap_or_else(|| TableColumn::new(COLUMN_PI)),
        ];
        columns.append(&mut rest);
        for column in columns.iter_mut().skip(1) {
            column.values.resize(row_count, None);
        }
        Self { columns }
    }

    /// Grid → dataset. Row position assigns `No.` 1-based and contiguous;
    /// the first data cell of each row is `Size(nm)`, the second `PI`,
    /// later cells are identified by their column tag. A column first seen
    /// at row *i* is backfilled with `None` for the rows above it. Every
    /// cell passes through numeric coercion.
    pub fn extract(view: &TableView) -> Self {
        let mut dataset = Self {
            columns: vec![
                TableColumn::new(COLUMN_NO),
                TableColumn::new(COLUMN_SIZE),
                TableColumn::new(COLUMN_PI),
            ],
        };
        for (row_index, row) in view.rows.iter().enumerate() {
            dataset.columns[0].values.push(Some((row_index + 1) as f64));
            let size = row.cells.first().and_then(|c| coerce_number(&c.buffer));
            let pi = row.cells.get(1).and_then(|c| coerce_number(&c.buffer));
            dataset.columns[1].values.push(size);
            dataset.columns[2].values.push(pi);

            for cell in row.cells.iter().skip(2) {
                let tag = cell.column.trim();
                if tag.is_empty() {
                    continue;
                }
                let position = match dataset.position_of(tag) {
                    Some(position) => position,
                    None => {
                        let mut column = TableColumn::new(tag);
                        column.values = vec![None; row_index];
                        dataset.columns.push(column);
                        dataset.columns.len() - 1
                    }
                };
                dataset.columns[position].values.push(coerce_number(&cell.buffer));
            }
            // A row without a cell for some known column must not shift
            // that column's later values upwards.
            for column in dataset.columns.iter_mut().skip(3) {
                column.values.resize(row_index + 1, None);
            }
        }
        dataset.normalized()
    }

    /// Dataset → grid, a full regeneration. Header order is `No.` first,
    /// then `Size(nm)` and `PI` in canonical casing, then the remaining
    /// columns in first-seen order; the trailing action column is a GUI
    /// concern and not part of the view-model.
    pub fn render(&self) -> TableView {
        let normalized = self.clone().normalized();
        let row_count = normalized.row_count();
        let data_columns = &normalized.columns[1..];
        let headers = data_columns
            .iter()
            .map(|c| c.display_name().to_string())
            .collect();
        let rows = (0..row_count)
            .map(|row_index| RowView {
                cells: data_columns
                    .iter()
                    .map(|column| CellInput::new(&column.name, column.values[row_index]))
                    .collect(),
            })
            .collect();
        TableView { headers, rows }
    }
}

impl Serialize for TableDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            if column.name == COLUMN_NO {
                // Row numbers go out as plain integers.
                let numbers: Vec<u64> = (1..=column.values.len() as u64).collect();
                map.serialize_entry(&column.name, &numbers)?;
            } else {
                map.serialize_entry(&column.name, &column.values)?;
            }
        }
        map.end()
    }
}

/// A cell on the wire: a number, a numeric-or-empty string, or null.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireCell {
    Number(f64),
    Text(String),
    Empty(()),
}

impl WireCell {
    fn into_value(self) -> Option<f64> {
        match self {
            WireCell::Number(value) => Some(value).filter(|v| v.is_finite()),
            WireCell::Text(text) => coerce_number(&text),
            WireCell::Empty(()) => None,
        }
    }
}

impl<'de> Deserialize<'de> for TableDataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = TableDataset;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of column names to value arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut dataset = TableDataset::default();
                while let Some((name, cells)) = access.next_entry::<String, Vec<WireCell>>()? {
                    dataset.columns.push(TableColumn {
                        name,
                        values: cells.into_iter().map(WireCell::into_value).collect(),
                    });
                }
                Ok(dataset.normalized())
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_view::CellInput;

    fn view_row(cells: &[(&str, &str)]) -> RowView {
        RowView {
            cells: cells
                .iter()
                .map(|(column, text)| CellInput::with_text(column, text))
                .collect(),
        }
    }

    #[test]
    fn fresh_dataset_has_fixed_columns_and_numbering() {
        let dataset = TableDataset::new(3);
        assert_eq!(dataset.row_count(), 3);
        let names: Vec<&str> = dataset.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![COLUMN_NO, COLUMN_SIZE, COLUMN_PI]);
        assert_eq!(
            dataset.column(COLUMN_NO).unwrap().values,
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(dataset.column(COLUMN_SIZE).unwrap().values, vec![None; 3]);
    }

    #[test]
    fn extraction_reads_three_entered_rows() {
        let view = TableView {
            headers: vec![COLUMN_SIZE.to_string(), COLUMN_PI.to_string()],
            rows: vec![
                view_row(&[(COLUMN_SIZE, "10"), (COLUMN_PI, "0.1")]),
                view_row(&[(COLUMN_SIZE, "20"), (COLUMN_PI, "0.2")]),
                view_row(&[(COLUMN_SIZE, "30"), (COLUMN_PI, "0.3")]),
            ],
        };
        let dataset = TableDataset::extract(&view);
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
    fn extraction_is_positional_for_fixed_columns_and_coerces_garbage() {
        let view = TableView {
            headers: vec![COLUMN_SIZE.to_string(), COLUMN_PI.to_string()],
            rows: vec![view_row(&[("whatever", "abc"), ("ignored", "Infinity")])],
        };
        let dataset = TableDataset::extract(&view);
        assert_eq!(dataset.column(COLUMN_SIZE).unwrap().values, vec![None]);
        assert_eq!(dataset.column(COLUMN_PI).unwrap().values, vec![None]);
    }

    #[test]
    fn late_seen_column_is_backfilled_with_nulls() {
        let view = TableView {
            headers: vec![],
            rows: vec![
                view_row(&[(COLUMN_SIZE, "1"), (COLUMN_PI, "2")]),
                view_row(&[(COLUMN_SIZE, "3"), (COLUMN_PI, "4"), ("Temp", "25")]),
            ],
        };
        let dataset = TableDataset::extract(&view);
        assert_eq!(
            dataset.column("Temp").unwrap().values,
            vec![None, Some(25.0)]
        );
    }

    #[test]
    fn header_order_is_fixed_regardless_of_key_casing_and_input_order() {
        let json = r#"{"PI": [0.1], "Custom1": [7], "size(nm)": [10], "No.": [1]}"#;
        let dataset: TableDataset = serde_json::from_str(json).unwrap();
        let view = dataset.render();
        assert_eq!(
            view.headers,
            vec!["Size(nm)".to_string(), "PI".to_string(), "Custom1".to_string()]
        );
        // The raw key survives on the cell tag even though the header
        // shows canonical casing.
        assert_eq!(view.rows[0].cells[0].column, "size(nm)");
        assert_eq!(view.rows[0].cells[0].buffer, "10");
    }

    #[test]
    fn no_ragged_columns_after_deserialization() {
        let json = r#"{"No.": [1, 2, 3], "Size(nm)": [5], "PI": [null, 2, 3, 4, 5]}"#;
        let dataset: TableDataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.row_count(), 3);
        for column in dataset.columns() {
            assert_eq!(column.values.len(), 3, "column {}", column.name);
        }
    }

    #[test]
    fn missing_fixed_columns_are_created_empty() {
        let json = r#"{"No.": [1, 2]}"#;
        let dataset: TableDataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.column(COLUMN_SIZE).unwrap().values, vec![None, None]);
        assert_eq!(dataset.column(COLUMN_PI).unwrap().values, vec![None, None]);
    }

    #[test]
    fn wire_cells_accept_numbers_strings_and_nulls() {
        let json = r#"{"No.": [1, 2, 3], "Size(nm)": ["3.5", "", null], "PI": [1, "x", 2]}"#;
        let dataset: TableDataset = serde_json::from_str(json).unwrap();
        assert_eq!(
            dataset.column(COLUMN_SIZE).unwrap().values,
            vec![Some(3.5), None, None]
        );
        assert_eq!(
            dataset.column(COLUMN_PI).unwrap().values,
            vec![Some(1.0), None, Some(2.0)]
        );
    }

    #[test]
    fn render_then_extract_round_trips() {
        let json = r#"{"No.": [1, 2], "Size(nm)": [10, null], "PI": [0.1, 0.2], "Temp": [null, 40]}"#;
        let dataset: TableDataset = serde_json::from_str(json).unwrap();
        let round_tripped = TableDataset::extract(&dataset.render());
        assert_eq!(round_tripped, dataset);
        // And the view itself survives a full cycle.
        assert_eq!(round_tripped.render(), dataset.render());
    }

    #[test]
    fn serialization_writes_row_numbers_as_integers() {
        let dataset = TableDataset::new(2);
        let value = serde_json::to_value(&dataset).unwrap();
        assert_eq!(value["No."], serde_json::json!([1, 2]));
        assert_eq!(value["Size(nm)"], serde_json::json!([null, null]));
        // Column order survives serialization.
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["No.", "Size(nm)", "PI"]);
    }
}
