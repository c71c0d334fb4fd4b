//! String-typed sample and feature metadata.

use crate::data::index::{ensure_unique, Indexed};
use crate::data::tsv::read_tsv;
use crate::data::Source;
use crate::error::{QurroError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single metadata cell.
///
/// Values are never type-inferred: `"True"`, `"5.0"` and `"0003"` stay
/// exactly as written. Serializes to a JSON string or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text as it appeared in the file, surrounding whitespace removed.
    Text(String),
    /// Empty (or whitespace-only) cell.
    Missing,
}

impl Value {
    /// Normalize a raw cell: strip whitespace, and map empty to [`Value::Missing`].
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Missing
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Missing => None,
        }
    }

    /// Text for display, with missing rendered as the empty string.
    pub fn display_text(&self) -> &str {
        self.as_str().unwrap_or("")
    }
}

/// Identifier-keyed table of string columns.
///
/// Used both for sample metadata (keyed by sample ID) and feature metadata
/// (keyed by feature ID).
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Row identifiers in order.
    ids: Vec<String>,
    /// Column names (the index column's header is not included).
    column_names: Vec<String>,
    /// Cells, one row per identifier.
    rows: Vec<Vec<Value>>,
    /// Identifier -> row position.
    positions: HashMap<String, usize>,
}

impl Metadata {
    /// Create metadata from rows of cells.
    pub fn new(ids: Vec<String>, column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(QurroError::validation(format!(
                "Metadata has {} IDs but {} rows.",
                ids.len(),
                rows.len()
            )));
        }
        for (id, row) in ids.iter().zip(&rows) {
            if row.len() != column_names.len() {
                return Err(QurroError::validation(format!(
                    "Metadata row '{}' has {} values; expected {}.",
                    id,
                    row.len(),
                    column_names.len()
                )));
            }
        }
        ensure_unique(&ids, "IDs", "metadata")?;
        ensure_unique(&column_names, "column names", "metadata")?;

        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Ok(Self {
            ids,
            column_names,
            rows,
            positions,
        })
    }

    /// Metadata with the given IDs and no columns.
    pub fn empty(ids: Vec<String>) -> Result<Self> {
        let rows = vec![Vec::new(); ids.len()];
        Self::new(ids, Vec::new(), rows)
    }

    /// Load metadata from a tab-delimited source.
    ///
    /// Expected format:
    /// - First row: header (first cell names the ID column)
    /// - Optional `#q2:` directive rows directly below the header (skipped)
    /// - Subsequent rows: ID followed by values
    ///
    /// Every cell is kept as text with surrounding whitespace stripped; a cell
    /// that is empty after stripping becomes [`Value::Missing`]. Short rows are
    /// padded with missing values. A row with an empty ID is an error.
    pub fn from_source(source: &Source) -> Result<Self> {
        let tsv = read_tsv(source, "metadata file", false)?;

        let column_names: Vec<String> = tsv
            .header
            .iter()
            .skip(1)
            .map(|name| name.trim().to_string())
            .collect();
        let n_columns = column_names.len();

        let mut ids = Vec::with_capacity(tsv.rows.len());
        let mut rows = Vec::with_capacity(tsv.rows.len());

        for (line_idx, fields) in tsv.rows.iter().enumerate() {
            let id = match Value::from_raw(&fields[0]) {
                Value::Text(id) => id,
                Value::Missing => {
                    return Err(QurroError::validation(format!(
                        "Data row {} of the metadata file has an empty ID; every row needs an ID.",
                        line_idx + 1
                    )))
                }
            };
            if fields.len() > n_columns + 1 {
                return Err(QurroError::validation(format!(
                    "Metadata row '{}' has {} values but the header names {} columns.",
                    id,
                    fields.len() - 1,
                    n_columns
                )));
            }

            let mut row: Vec<Value> = fields[1..].iter().map(|raw| Value::from_raw(raw)).collect();
            row.resize(n_columns, Value::Missing);

            ids.push(id);
            rows.push(row);
        }

        ensure_unique(&ids, "IDs", "metadata file")?;
        ensure_unique(&column_names, "column names", "metadata file")?;
        Self::new(ids, column_names, rows)
    }

    /// Copy in which missing cells hold the empty string instead.
    pub fn missing_as_empty(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| Value::Text(v.display_text().to_string()))
                    .collect()
            })
            .collect();
        Self {
            ids: self.ids.clone(),
            column_names: self.column_names.clone(),
            rows,
            positions: self.positions.clone(),
        }
    }

    /// Row identifiers in order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.ids.len()
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// All cells for one identifier, in column order.
    pub fn row(&self, id: &str) -> Option<&[Value]> {
        self.positions.get(id).map(|&i| self.rows[i].as_slice())
    }

    /// Cell for a specific identifier and column.
    pub fn get(&self, id: &str, column: &str) -> Option<&Value> {
        let col = self.column_names.iter().position(|c| c == column)?;
        self.row(id).map(|row| &row[col])
    }

    /// Subset to the given identifiers, in that order.
    pub fn select_ids(&self, ids: &[String]) -> Result<Self> {
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            let row = self.row(id).ok_or_else(|| {
                QurroError::validation(format!("ID '{}' not found in metadata", id))
            })?;
            rows.push(row.to_vec());
        }
        Self::new(ids.to_vec(), self.column_names.clone(), rows)
    }

    /// Rows for `ids` in that order; identifiers absent here get all-missing rows.
    pub fn reindex(&self, ids: &[String]) -> Result<Self> {
        let rows = ids
            .iter()
            .map(|id| match self.row(id) {
                Some(row) => row.to_vec(),
                None => vec![Value::Missing; self.n_columns()],
            })
            .collect();
        Self::new(ids.to_vec(), self.column_names.clone(), rows)
    }

    /// Rewrite every identifier and column name with `f`.
    ///
    /// Fails, naming the table, if the rewrite makes two names equal.
    pub fn map_names<F: Fn(&str) -> String>(self, f: F, table: &str) -> Result<Self> {
        let ids: Vec<String> = self.ids.iter().map(|id| f(id.as_str())).collect();
        let column_names: Vec<String> = self.column_names.iter().map(|c| f(c.as_str())).collect();
        ensure_unique(&ids, "IDs", table)?;
        ensure_unique(&column_names, "column names", table)?;
        Self::new(ids, column_names, self.rows)
    }
}

impl Indexed for Metadata {
    fn index(&self) -> &[String] {
        &self.ids
    }

    fn select_index(&self, ids: &[String]) -> Result<Self> {
        self.select_ids(ids)
    }
}

/// Read a metadata file in both of its forms.
///
/// Returns the metadata with explicit missing markers, and a display copy in
/// which missing cells are empty strings.
pub fn read_metadata_file(source: &Source) -> Result<(Metadata, Metadata)> {
    let metadata = Metadata::from_source(source)?;
    let display = metadata.missing_as_empty();
    Ok((metadata, display))
}
