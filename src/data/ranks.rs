//! Feature rankings: differentials or ordination feature loadings.

use crate::data::index::{ensure_unique, Indexed};
use crate::data::tsv::{read_records, read_tsv};
use crate::data::Source;
use crate::error::{QurroError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a rankings file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankFormat {
    /// Tab-delimited: feature ID column, then one numeric column per ranking.
    Differentials,
    /// scikit-bio ordination results; only feature loadings are used.
    Ordination,
}

/// Numeric rankings for a set of features.
///
/// Rows are features, columns are rankings. Every value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    feature_ids: Vec<String>,
    column_names: Vec<String>,
    /// Dense matrix (features × rankings)
    values: DMatrix<f64>,
}

impl RankTable {
    /// Create a ranking table.
    ///
    /// Rejects duplicate feature IDs or column names and any non-finite value.
    pub fn new(feature_ids: Vec<String>, column_names: Vec<String>, values: DMatrix<f64>) -> Result<Self> {
        if values.shape() != (feature_ids.len(), column_names.len()) {
            return Err(QurroError::validation(format!(
                "Feature rankings have shape {:?} but {} feature IDs and {} column names were given.",
                values.shape(),
                feature_ids.len(),
                column_names.len()
            )));
        }
        ensure_unique(&feature_ids, "feature IDs", "feature ranks")?;
        ensure_unique(&column_names, "column names", "feature ranks")?;

        for (col, name) in column_names.iter().enumerate() {
            if let Some(row) = values.column(col).iter().position(|v| !v.is_finite()) {
                return Err(QurroError::validation(format!(
                    "Ranking column '{}' has a non-finite value for feature '{}'.",
                    name, feature_ids[row]
                )));
            }
        }

        Ok(Self {
            feature_ids,
            column_names,
            values,
        })
    }

    /// Build from per-feature rows of values.
    pub fn from_rows(feature_ids: Vec<String>, column_names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = column_names.len();
        if let Some((i, _)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(QurroError::validation(format!(
                "Ranking row {} has {} values; expected {}.",
                i,
                rows[i].len(),
                n_cols
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = DMatrix::from_row_slice(rows.len(), n_cols, &flat);
        Self::new(feature_ids, column_names, values)
    }

    /// Read rankings in the given format.
    pub fn from_source(source: &Source, format: RankFormat) -> Result<Self> {
        match format {
            RankFormat::Differentials => Self::from_differentials(source),
            RankFormat::Ordination => Self::from_ordination(source),
        }
    }

    /// Read a tab-delimited differentials file.
    ///
    /// `#q2:` directive rows directly under the header are skipped. Every
    /// ranking cell must hold a finite number.
    pub fn from_differentials(source: &Source) -> Result<Self> {
        let tsv = read_tsv(source, "feature ranks", false)?;
        let column_names: Vec<String> = tsv.header.iter().skip(1).map(|c| c.trim().to_string()).collect();

        let mut feature_ids = Vec::with_capacity(tsv.rows.len());
        let mut rows = Vec::with_capacity(tsv.rows.len());
        for fields in &tsv.rows {
            let id = fields[0].trim().to_string();
            if id.is_empty() {
                return Err(QurroError::validation(
                    "A row of the feature ranks has an empty feature ID.",
                ));
            }
            let mut row = Vec::with_capacity(column_names.len());
            for (col_idx, name) in column_names.iter().enumerate() {
                let raw = fields.get(col_idx + 1).map(|s| s.trim()).unwrap_or("");
                row.push(parse_rank(raw, &id, name)?);
            }
            if fields.len() > column_names.len() + 1 {
                return Err(QurroError::validation(format!(
                    "Feature '{}' in the feature ranks has more values than there are columns.",
                    id
                )));
            }
            feature_ids.push(id);
            rows.push(row);
        }

        Self::from_rows(feature_ids, column_names, &rows)
    }

    /// Read the feature loadings of an ordination results file.
    ///
    /// Only the `Species` section is consumed; its columns are named
    /// `Axis 1`, `Axis 2`, ... in order.
    pub fn from_ordination(source: &Source) -> Result<Self> {
        let records = read_records(source)?;
        let start = records
            .iter()
            .position(|r| r.first().map(|s| s.trim()) == Some("Species"))
            .ok_or_else(|| {
                QurroError::validation("The ordination file has no feature loadings (Species) section.")
            })?;

        let header = &records[start];
        let n_rows = parse_count(header.get(1), "rows")?;
        let n_cols = parse_count(header.get(2), "columns")?;
        if n_rows == 0 || n_cols == 0 {
            return Err(QurroError::validation(
                "The ordination file's feature loadings (Species) section is empty.",
            ));
        }

        let body = records.get(start + 1..start + 1 + n_rows).ok_or_else(|| {
            QurroError::validation(format!(
                "The ordination file's feature loadings section declares {} rows but ends early.",
                n_rows
            ))
        })?;

        let column_names: Vec<String> = (1..=n_cols).map(|i| format!("Axis {}", i)).collect();
        let mut feature_ids = Vec::with_capacity(n_rows);
        let mut rows = Vec::with_capacity(n_rows);
        for fields in body {
            let id = fields[0].trim().to_string();
            if fields.len() != n_cols + 1 {
                return Err(QurroError::validation(format!(
                    "Feature '{}' in the ordination loadings has {} values; expected {}.",
                    id,
                    fields.len() - 1,
                    n_cols
                )));
            }
            let row = column_names
                .iter()
                .zip(&fields[1..])
                .map(|(name, raw)| parse_rank(raw.trim(), &id, name))
                .collect::<Result<Vec<f64>>>()?;
            feature_ids.push(id);
            rows.push(row);
        }

        Self::from_rows(feature_ids, column_names, &rows)
    }

    /// Feature identifiers.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Ranking column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Underlying dense matrix (features × rankings).
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Value for a feature (row position) and ranking (column position).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// Value for a feature and ranking, by name.
    pub fn value(&self, feature_id: &str, column: &str) -> Option<f64> {
        let row = self.feature_ids.iter().position(|id| id == feature_id)?;
        let col = self.column_names.iter().position(|c| c == column)?;
        Some(self.values[(row, col)])
    }

    /// Subset to the given feature positions.
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_features()) {
            return Err(QurroError::validation(format!(
                "Feature index {} out of bounds",
                bad
            )));
        }
        let values = DMatrix::from_fn(indices.len(), self.n_columns(), |r, c| {
            self.values[(indices[r], c)]
        });
        let feature_ids = indices.iter().map(|&i| self.feature_ids[i].clone()).collect();
        Self::new(feature_ids, self.column_names.clone(), values)
    }

    /// Subset to the named features, in the given order.
    pub fn select_features(&self, ids: &[String]) -> Result<Self> {
        let positions: HashMap<&str, usize> = self
            .feature_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let indices = ids
            .iter()
            .map(|id| {
                positions.get(id.as_str()).copied().ok_or_else(|| {
                    QurroError::validation(format!("Feature '{}' not found in the feature ranks", id))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        self.subset_features(&indices)
    }

    /// Rewrite every feature ID and column name with `f`.
    pub fn map_names<F: Fn(&str) -> String>(self, f: F, table: &str) -> Result<Self> {
        let feature_ids: Vec<String> = self.feature_ids.iter().map(|id| f(id.as_str())).collect();
        let column_names: Vec<String> = self.column_names.iter().map(|c| f(c.as_str())).collect();
        ensure_unique(&feature_ids, "feature IDs", table)?;
        ensure_unique(&column_names, "column names", table)?;
        Self::new(feature_ids, column_names, self.values)
    }
}

impl Indexed for RankTable {
    fn index(&self) -> &[String] {
        &self.feature_ids
    }

    fn select_index(&self, ids: &[String]) -> Result<Self> {
        self.select_features(ids)
    }
}

/// Read a rankings file in the given format.
pub fn read_rank_file(source: &Source, format: RankFormat) -> Result<RankTable> {
    RankTable::from_source(source, format)
}

fn parse_rank(raw: &str, feature_id: &str, column: &str) -> Result<f64> {
    if raw.is_empty() {
        return Err(QurroError::validation(format!(
            "Missing value for feature '{}' in ranking column '{}'.",
            feature_id, column
        )));
    }
    let value: f64 = raw.parse().map_err(|_| {
        QurroError::validation(format!(
            "Non-numeric value '{}' for feature '{}' in ranking column '{}'.",
            raw, feature_id, column
        ))
    })?;
    if !value.is_finite() {
        return Err(QurroError::validation(format!(
            "Infinite or NaN value '{}' for feature '{}' in ranking column '{}'.",
            raw, feature_id, column
        )));
    }
    Ok(value)
}

fn parse_count(field: Option<&String>, what: &str) -> Result<usize> {
    field
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            QurroError::validation(format!(
                "The ordination file's Species header does not give a number of {}.",
                what
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DIFFERENTIALS: &str = "featureid\tIntercept\tgroup[T.b]\n\
        #q2:types\tnumeric\tnumeric\n\
        F1\t1.5\t-2.0\n\
        F2\t0.25\t3\n\
        F3\t-1e-3\t0\n";

    const ORDINATION: &str = "Eigvals\t2\n0.5\t0.3\n\n\
        Proportion explained\t2\n0.6\t0.4\n\n\
        Species\t3\t2\n\
        F1\t0.1\t-0.2\n\
        F2\t0.3\t0.4\n\
        F3\t-0.5\t0.6\n\n\
        Site\t2\t2\n\
        S1\t1.0\t2.0\n\
        S2\t3.0\t4.0\n\n\
        Biplot\t0\t0\n\n\
        Site constraints\t0\t0\n";

    #[test]
    fn test_read_differentials() {
        let ranks = RankTable::from_differentials(&Source::text(DIFFERENTIALS)).unwrap();
        assert_eq!(ranks.feature_ids(), &["F1", "F2", "F3"]);
        assert_eq!(ranks.column_names(), &["Intercept", "group[T.b]"]);
        assert_relative_eq!(ranks.value("F3", "Intercept").unwrap(), -0.001);
        assert_relative_eq!(ranks.get(1, 1), 3.0);
    }

    #[test]
    fn test_differentials_reject_bad_values() {
        for bad in ["x", "", "inf", "-Infinity", "NaN"] {
            let text = format!("id\tr\nF1\t1\nF2\t{}\n", bad);
            let err = RankTable::from_differentials(&Source::text(text)).unwrap_err();
            assert!(err.is_validation(), "{:?} should be rejected", bad);
            assert!(err.to_string().contains("'r'"));
        }
    }

    #[test]
    fn test_short_row_is_missing_value() {
        let text = "id\tr1\tr2\nF1\t1\nF2\t1\t2\n";
        let err = RankTable::from_differentials(&Source::text(text)).unwrap_err();
        assert!(err.to_string().contains("Missing value"));
    }

    #[test]
    fn test_read_ordination_loadings() {
        let ranks = read_rank_file(&Source::text(ORDINATION), RankFormat::Ordination).unwrap();
        assert_eq!(ranks.feature_ids(), &["F1", "F2", "F3"]);
        assert_eq!(ranks.column_names(), &["Axis 1", "Axis 2"]);
        assert_relative_eq!(ranks.value("F3", "Axis 2").unwrap(), 0.6);
    }

    #[test]
    fn test_ordination_without_loadings() {
        let text = "Eigvals\t1\n0.5\n\nSpecies\t0\t0\n\nSite\t1\t1\nS1\t1\n";
        assert!(RankTable::from_ordination(&Source::text(text)).is_err());
        assert!(RankTable::from_ordination(&Source::text("Eigvals\t1\n0.5\n")).is_err());
    }

    #[test]
    fn test_select_features() {
        let ranks = RankTable::from_differentials(&Source::text(DIFFERENTIALS)).unwrap();
        let subset = ranks.select_features(&["F3".to_string(), "F1".to_string()]).unwrap();
        assert_eq!(subset.feature_ids(), &["F3", "F1"]);
        assert_relative_eq!(subset.get(1, 0), 1.5);
        assert!(ranks.select_features(&["F9".to_string()]).is_err());
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let err = RankTable::from_rows(
            vec!["F1".to_string(), "F2".to_string()],
            vec!["r".to_string()],
            &[vec![1.0], vec![f64::INFINITY]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("F2"));
    }
}
