//! Sparse feature-by-sample abundance table.

use crate::data::index::{ensure_unique, Indexed};
use crate::data::tsv::read_tsv;
use crate::data::Source;
use crate::error::{QurroError, Result};
use crate::validate::validate_shape;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::HashMap;

/// A sparse abundance table.
///
/// Rows represent features (taxa, metabolites, ...), columns represent samples.
/// Uses CSR (Compressed Sparse Row) storage; zero entries are never stored and
/// the table is never densified.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    /// Sparse matrix in CSR format (features × samples)
    data: CsMat<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl AbundanceTable {
    /// Create a table from a sparse matrix and identifiers.
    ///
    /// Checks that the identifier lists match the matrix shape and that
    /// each list is unique. No size limits are applied here.
    pub fn new(data: CsMat<f64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(QurroError::validation(format!(
                "The abundance table has {} rows but {} feature IDs were given.",
                nrows,
                feature_ids.len()
            )));
        }
        if ncols != sample_ids.len() {
            return Err(QurroError::validation(format!(
                "The abundance table has {} columns but {} sample IDs were given.",
                ncols,
                sample_ids.len()
            )));
        }
        ensure_unique(&feature_ids, "feature IDs", "abundance table")?;
        ensure_unique(&sample_ids, "sample IDs", "abundance table")?;
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build the canonical table from a sparse source.
    ///
    /// This is the ingestion entry point: on top of [`AbundanceTable::new`]
    /// it requires at least 2 features and 1 sample.
    pub fn from_sparse(
        data: CsMat<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let table = Self::new(data, feature_ids, sample_ids)?;
        validate_shape("BIOM table", table.n_features(), table.n_samples(), Some(2), Some(1))?;
        Ok(table)
    }

    /// Build a table from `(feature, sample, value)` triplets.
    ///
    /// Zero values are dropped; repeated coordinates are summed.
    pub fn from_triplets<I>(triplets: I, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let shape = (feature_ids.len(), sample_ids.len());
        let mut tri_mat = TriMat::new(shape);
        for (row, col, val) in triplets {
            if row >= shape.0 || col >= shape.1 {
                return Err(QurroError::validation(format!(
                    "Entry ({}, {}) lies outside the {} × {} abundance table.",
                    row, col, shape.0, shape.1
                )));
            }
            if val != 0.0 {
                tri_mat.add_triplet(row, col, val);
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load a table from a BIOM-style TSV export.
    ///
    /// Expected format:
    /// - Optional leading `# ...` comment lines (e.g. `# Constructed from biom file`)
    /// - Header: feature ID header cell (usually `#OTU ID`) followed by sample IDs
    /// - Subsequent rows: feature ID followed by one numeric value per sample
    pub fn from_tsv(source: &Source) -> Result<Self> {
        let tsv = read_tsv(source, "BIOM table", true)?;
        let sample_ids: Vec<String> = tsv.header.iter().skip(1).cloned().collect();
        let n_samples = sample_ids.len();

        // Parse data rows into triplets for sparse matrix construction
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut feature_ids: Vec<String> = Vec::with_capacity(tsv.rows.len());

        for (row_idx, fields) in tsv.rows.iter().enumerate() {
            let feature_id = fields[0].clone();
            if fields.len() != n_samples + 1 {
                return Err(QurroError::validation(format!(
                    "Feature '{}' in the BIOM table has {} values; expected {}.",
                    feature_id,
                    fields.len() - 1,
                    n_samples
                )));
            }

            for (col_idx, raw) in fields[1..].iter().enumerate() {
                let value: f64 = raw.trim().parse().map_err(|_| {
                    QurroError::validation(format!(
                        "Invalid abundance '{}' for feature '{}' in sample '{}'.",
                        raw, feature_id, sample_ids[col_idx]
                    ))
                })?;
                if !value.is_finite() {
                    return Err(QurroError::validation(format!(
                        "Non-finite abundance for feature '{}' in sample '{}'.",
                        feature_id, sample_ids[col_idx]
                    )));
                }
                if value != 0.0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
            feature_ids.push(feature_id);
        }

        let table = Self::from_triplets(triplets, feature_ids, sample_ids)?;
        validate_shape("BIOM table", table.n_features(), table.n_samples(), Some(2), Some(1))?;
        Ok(table)
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Total number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<f64> {
        &self.data
    }

    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.feature_ids.iter().any(|id| id == feature_id)
    }

    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.sample_ids.iter().any(|id| id == sample_id)
    }

    /// Iterate over stored (non-zero) entries as `(feature, sample, value)`.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .outer_iterator()
            .enumerate()
            .flat_map(|(row, row_vec)| {
                row_vec
                    .iter()
                    .map(move |(col, &val)| (row, col, val))
                    .collect::<Vec<_>>()
            })
    }

    /// Get a dense vector for a specific row (feature).
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Compute row sums (total abundance per feature).
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_features())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| val).sum())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Compute column sums (total abundance per sample).
    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_samples()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Subset the table to include only specified features (by index).
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        let n_features = indices.len();
        let n_samples = self.n_samples();

        let mut tri_mat = TriMat::new((n_features, n_samples));
        let mut new_feature_ids = Vec::with_capacity(n_features);

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_features() {
                return Err(QurroError::validation(format!(
                    "Feature index {} out of bounds",
                    old_row
                )));
            }
            new_feature_ids.push(self.feature_ids[old_row].clone());

            if let Some(row_vec) = self.data.outer_view(old_row) {
                for (col, &val) in row_vec.iter() {
                    tri_mat.add_triplet(new_row, col, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), new_feature_ids, self.sample_ids.clone())
    }

    /// Subset the table to include only specified samples (by index).
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let n_features = self.n_features();
        let n_samples = indices.len();

        // Build column index mapping
        let col_map: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| (old_idx, new_idx))
            .collect();

        let mut new_sample_ids = Vec::with_capacity(n_samples);
        for &old_col in indices {
            if old_col >= self.n_samples() {
                return Err(QurroError::validation(format!(
                    "Sample index {} out of bounds",
                    old_col
                )));
            }
            new_sample_ids.push(self.sample_ids[old_col].clone());
        }

        let mut tri_mat = TriMat::new((n_features, n_samples));
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (old_col, &val) in row_vec.iter() {
                if let Some(&new_col) = col_map.get(&old_col) {
                    tri_mat.add_triplet(row, new_col, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), self.feature_ids.clone(), new_sample_ids)
    }

    /// Subset to the named features, in the given order.
    pub fn select_features(&self, ids: &[String]) -> Result<Self> {
        let indices = lookup(&self.feature_ids, ids, "feature")?;
        self.subset_features(&indices)
    }

    /// Subset to the named samples, in the given order.
    pub fn select_samples(&self, ids: &[String]) -> Result<Self> {
        let indices = lookup(&self.sample_ids, ids, "sample")?;
        self.subset_samples(&indices)
    }

    /// Rewrite every feature and sample identifier with `f`.
    ///
    /// Fails, naming the table, if the rewrite makes two identifiers equal.
    pub fn map_ids<F: Fn(&str) -> String>(self, f: F, table: &str) -> Result<Self> {
        let feature_ids: Vec<String> = self.feature_ids.iter().map(|id| f(id.as_str())).collect();
        let sample_ids: Vec<String> = self.sample_ids.iter().map(|id| f(id.as_str())).collect();
        ensure_unique(&feature_ids, "feature IDs", table)?;
        ensure_unique(&sample_ids, "sample IDs", table)?;
        Ok(Self {
            data: self.data,
            feature_ids,
            sample_ids,
        })
    }

    /// View the table sample-first, so samples become the matched index.
    pub fn transpose(self) -> Transposed {
        Transposed(self)
    }
}

impl Indexed for AbundanceTable {
    fn index(&self) -> &[String] {
        &self.feature_ids
    }

    fn select_index(&self, ids: &[String]) -> Result<Self> {
        self.select_features(ids)
    }
}

/// An [`AbundanceTable`] indexed by sample instead of by feature.
///
/// The storage keeps its feature-major layout; only the matching index
/// changes. [`Transposed::transpose`] restores the original orientation.
#[derive(Debug, Clone)]
pub struct Transposed(AbundanceTable);

impl Transposed {
    pub fn transpose(self) -> AbundanceTable {
        self.0
    }

    pub fn as_table(&self) -> &AbundanceTable {
        &self.0
    }
}

impl Indexed for Transposed {
    fn index(&self) -> &[String] {
        &self.0.sample_ids
    }

    fn select_index(&self, ids: &[String]) -> Result<Self> {
        Ok(Transposed(self.0.select_samples(ids)?))
    }
}

fn lookup(all: &[String], wanted: &[String], kind: &str) -> Result<Vec<usize>> {
    let positions: HashMap<&str, usize> = all
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    wanted
        .iter()
        .map(|id| {
            positions.get(id.as_str()).copied().ok_or_else(|| {
                QurroError::validation(format!(
                    "{} '{}' not found in the abundance table",
                    kind, id
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::index::match_index;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn create_test_table() -> AbundanceTable {
        // 3 features × 4 samples
        let mut tri_mat = TriMat::new((3, 4));
        tri_mat.add_triplet(0, 0, 10.0);
        tri_mat.add_triplet(0, 1, 20.0);
        tri_mat.add_triplet(0, 3, 5.0);
        tri_mat.add_triplet(1, 0, 100.0);
        tri_mat.add_triplet(1, 1, 200.0);
        tri_mat.add_triplet(1, 2, 150.0);
        tri_mat.add_triplet(1, 3, 175.0);
        tri_mat.add_triplet(2, 0, 1.5);
        // feature 2 is sparse - only present in sample 0

        AbundanceTable::new(tri_mat.to_csr(), ids("F", 3), ids("S", 4)).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let table = create_test_table();
        assert_eq!(table.n_features(), 3);
        assert_eq!(table.n_samples(), 4);
        assert_eq!(table.nnz(), 8);
    }

    #[test]
    fn test_get_values() {
        let table = create_test_table();
        assert_eq!(table.get(0, 0), 10.0);
        assert_eq!(table.get(0, 2), 0.0);
        assert_eq!(table.get(2, 0), 1.5);
        assert_eq!(table.get(2, 1), 0.0);
    }

    #[test]
    fn test_sums() {
        let table = create_test_table();
        assert_eq!(table.col_sums(), vec![111.5, 220.0, 150.0, 180.0]);
        assert_eq!(table.row_sums(), vec![35.0, 625.0, 1.5]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let tri_mat: TriMat<f64> = TriMat::new((2, 1));
        let dup = vec!["F1".to_string(), "F1".to_string()];
        let err = AbundanceTable::new(tri_mat.to_csr(), dup, ids("S", 1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_sparse_minimum_size() {
        let one_row: TriMat<f64> = TriMat::new((1, 3));
        assert!(AbundanceTable::from_sparse(one_row.to_csr(), ids("F", 1), ids("S", 3)).is_err());

        let no_cols: TriMat<f64> = TriMat::new((3, 0));
        assert!(AbundanceTable::from_sparse(no_cols.to_csr(), ids("F", 3), vec![]).is_err());

        let ok: TriMat<f64> = TriMat::new((2, 1));
        assert!(AbundanceTable::from_sparse(ok.to_csr(), ids("F", 2), ids("S", 1)).is_ok());
    }

    #[test]
    fn test_from_triplets_drops_zeros() {
        let table = AbundanceTable::from_triplets(
            vec![(0, 0, 1.0), (1, 1, 0.0), (1, 0, 2.0)],
            ids("F", 2),
            ids("S", 2),
        )
        .unwrap();
        assert_eq!(table.nnz(), 2);
        assert!(AbundanceTable::from_triplets(vec![(5, 0, 1.0)], ids("F", 2), ids("S", 2)).is_err());
    }

    #[test]
    fn test_has_feature_and_sample() {
        let table = create_test_table();
        assert!(table.has_feature("F3"));
        assert!(!table.has_feature("F4"));
        assert!(table.has_sample("S4"));
        assert!(!table.has_sample("S5"));

        let subset = table.select_samples(&ids("S", 2)).unwrap();
        assert!(!subset.has_sample("S4"));
    }

    #[test]
    fn test_from_biom_tsv_export() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Constructed from biom file").unwrap();
        writeln!(file, "#OTU ID\tS1\tS2").unwrap();
        writeln!(file, "F1\t1.0\t0.0").unwrap();
        writeln!(file, "F2\t0\t7").unwrap();
        file.flush().unwrap();

        let table = AbundanceTable::from_tsv(&Source::path(file.path())).unwrap();
        assert_eq!(table.sample_ids(), &["S1", "S2"]);
        assert_eq!(table.feature_ids(), &["F1", "F2"]);
        assert_eq!(table.nnz(), 2);
        assert_eq!(table.get(1, 1), 7.0);
    }

    #[test]
    fn test_from_tsv_rejects_bad_values() {
        let text = "#OTU ID\tS1\nF1\tabc\nF2\t1\n";
        assert!(AbundanceTable::from_tsv(&Source::text(text)).is_err());

        let text = "#OTU ID\tS1\nF1\tinf\nF2\t1\n";
        assert!(AbundanceTable::from_tsv(&Source::text(text)).is_err());

        let text = "#OTU ID\tS1\tS2\nF1\t1\nF2\t1\t2\n";
        assert!(AbundanceTable::from_tsv(&Source::text(text)).is_err());
    }

    #[test]
    fn test_select_by_id() {
        let table = create_test_table();
        let subset = table
            .select_samples(&["S4".to_string(), "S2".to_string()])
            .unwrap();
        assert_eq!(subset.sample_ids(), &["S4", "S2"]);
        assert_eq!(subset.row_dense(0), vec![5.0, 20.0]);

        let subset = table.select_features(&["F3".to_string()]).unwrap();
        assert_eq!(subset.row_dense(0), vec![1.5, 0.0, 0.0, 0.0]);

        assert!(table.select_features(&["F9".to_string()]).is_err());
    }

    #[test]
    fn test_map_ids_collision() {
        let table = AbundanceTable::from_triplets(
            vec![(0, 0, 1.0)],
            vec!["a.b".to_string(), "a:b".to_string()],
            ids("S", 1),
        )
        .unwrap();
        let err = table.map_ids(|id| id.replace('.', ":"), "BIOM table").unwrap_err();
        assert!(err.to_string().contains("BIOM table"));
    }

    #[test]
    fn test_transposed_matches_on_samples() {
        let table = create_test_table();
        let other = AbundanceTable::from_triplets(
            vec![(0, 0, 1.0)],
            ids("F", 1),
            vec!["S2".to_string(), "S9".to_string()],
        )
        .unwrap();

        let (a, b) = match_index(&table.transpose(), &other.transpose()).unwrap();
        assert_eq!(a.as_table().sample_ids(), &["S2"]);
        assert_eq!(b.as_table().sample_ids(), &["S2"]);
        assert_eq!(a.transpose().n_features(), 3);
    }
}
