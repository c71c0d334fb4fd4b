//! Keep only the most extreme features of each ranking.

use crate::data::{AbundanceTable, RankTable};
use crate::error::{QurroError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Outcome of extreme-feature filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremeFilterResult {
    /// Number of ranked features before filtering.
    pub n_before: usize,
    /// Number of ranked features after filtering.
    pub n_after: usize,
    /// True when `2k` covered every feature and nothing was filtered.
    pub skipped: bool,
}

impl std::fmt::Display for ExtremeFilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Extreme Feature Filter")?;
        if self.skipped {
            writeln!(f, "  Skipped:   extreme feature count covers all {} features", self.n_before)?;
        }
        writeln!(f, "  Before:    {} features", self.n_before)?;
        writeln!(f, "  After:     {} features", self.n_after)?;
        Ok(())
    }
}

/// Restrict the table and rankings to the top and bottom `k` features of
/// every ranking column.
///
/// `None` returns the inputs unchanged. `k` must be positive. When `2k` is
/// at least the number of ranked features nothing can be removed, so the
/// inputs come back unchanged with a warning.
///
/// The result is the union over all columns, so it holds between `2k` and
/// `2k × columns` features. Ties at the `k`-th place are resolved by a
/// stable sort on the ranking values: consistent, but which tied feature
/// makes the cut is not otherwise guaranteed.
pub fn filter_unextreme_features(
    table: &AbundanceTable,
    ranks: &RankTable,
    extreme_feature_count: Option<i64>,
) -> Result<(AbundanceTable, RankTable)> {
    let (table, ranks, _) = filter_unextreme_features_with_stats(table, ranks, extreme_feature_count)?;
    Ok((table, ranks))
}

/// [`filter_unextreme_features`] with before/after counts.
pub fn filter_unextreme_features_with_stats(
    table: &AbundanceTable,
    ranks: &RankTable,
    extreme_feature_count: Option<i64>,
) -> Result<(AbundanceTable, RankTable, ExtremeFilterResult)> {
    let n_before = ranks.n_features();
    let unchanged = |skipped| ExtremeFilterResult {
        n_before,
        n_after: n_before,
        skipped,
    };

    let k = match extreme_feature_count {
        None => return Ok((table.clone(), ranks.clone(), unchanged(false))),
        Some(k) if k < 1 => {
            return Err(QurroError::validation(
                "Extreme feature count must be a positive integer.",
            ))
        }
        Some(k) => usize::try_from(k).map_err(|_| {
            QurroError::validation("Extreme feature count is too large for this platform.")
        })?,
    };

    if k.saturating_mul(2) >= n_before {
        warn!(
            "The extreme feature count ({}) is at least half of the number of ranked \
             features ({}); no filtering will be done.",
            k, n_before
        );
        return Ok((table.clone(), ranks.clone(), unchanged(true)));
    }

    let keep = extreme_positions(ranks, k);
    let ranked = ranks.subset_features(&keep)?;
    let filtered_table = table.select_features(ranked.feature_ids())?;

    let result = ExtremeFilterResult {
        n_before,
        n_after: ranked.n_features(),
        skipped: false,
    };
    info!(
        "Extreme feature filtering: {} features before, {} after.",
        result.n_before, result.n_after
    );

    Ok((filtered_table, ranked, result))
}

/// Positions (in ranking row order) of the union of every column's top and
/// bottom `k` features.
fn extreme_positions(ranks: &RankTable, k: usize) -> Vec<usize> {
    let n = ranks.n_features();
    let mut keep = vec![false; n];

    for col in 0..ranks.n_columns() {
        let values = ranks.values().column(col);

        // One stable ascending sort: bottom k from the head, top k from the tail.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        for &i in order.iter().take(k).chain(order.iter().skip(n - k)) {
            keep[i] = true;
        }
    }

    (0..n).filter(|&i| keep[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn table(n_features: usize) -> AbundanceTable {
        let triplets = (0..n_features).map(|r| (r, r % 2, (r + 1) as f64));
        AbundanceTable::from_triplets(triplets, ids("F", n_features), ids("S", 2)).unwrap()
    }

    /// Eight features whose extremes in both columns are F1, F2, F7, F8.
    fn aligned_ranks() -> RankTable {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, (i * 10) as f64]).collect();
        RankTable::from_rows(ids("F", 8), vec!["a".to_string(), "b".to_string()], &rows).unwrap()
    }

    #[test]
    fn test_none_is_identity() {
        let (t, r, stats) = filter_unextreme_features_with_stats(&table(8), &aligned_ranks(), None).unwrap();
        assert_eq!(t.feature_ids(), table(8).feature_ids());
        assert_eq!(r, aligned_ranks());
        assert!(!stats.skipped);
    }

    #[test]
    fn test_invalid_count() {
        for bad in [0, -3] {
            let err = filter_unextreme_features(&table(8), &aligned_ranks(), Some(bad)).unwrap_err();
            assert!(err.to_string().contains("positive integer"));
        }
    }

    #[test]
    fn test_aligned_extremes_keep_four() {
        let (t, r) = filter_unextreme_features(&table(8), &aligned_ranks(), Some(2)).unwrap();
        assert_eq!(r.feature_ids(), &["F1", "F2", "F7", "F8"]);
        assert_eq!(t.feature_ids(), &["F1", "F2", "F7", "F8"]);
        assert_eq!(t.row_dense(3), table(8).row_dense(7));
    }

    #[test]
    fn test_disjoint_extremes_union() {
        // Column b ranks the middle features as extreme.
        let b = [4.0, 3.0, 9.0, 8.0, -9.0, -8.0, 2.0, 1.0];
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, b[i]]).collect();
        let ranks = RankTable::from_rows(ids("F", 8), vec!["a".to_string(), "b".to_string()], &rows).unwrap();

        let (_, r) = filter_unextreme_features(&table(8), &ranks, Some(2)).unwrap();
        assert_eq!(r.n_features(), 8);

        let b = [9.0, 3.0, 8.0, 0.0, -9.0, 1.0, 2.0, 1.5];
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, b[i]]).collect();
        let ranks = RankTable::from_rows(ids("F", 8), vec!["a".to_string(), "b".to_string()], &rows).unwrap();
        let (_, r) = filter_unextreme_features(&table(8), &ranks, Some(2)).unwrap();
        // a: F1, F2, F7, F8; b: F1, F3, F5, F4
        assert_eq!(r.feature_ids(), &["F1", "F2", "F3", "F4", "F5", "F7", "F8"]);
    }

    #[test]
    fn test_count_too_large_skips() {
        let (t, r, stats) =
            filter_unextreme_features_with_stats(&table(8), &aligned_ranks(), Some(4)).unwrap();
        assert!(stats.skipped);
        assert_eq!(stats.n_after, 8);
        assert_eq!(r, aligned_ranks());
        assert_eq!(t.n_features(), 8);

        let (_, _, stats) =
            filter_unextreme_features_with_stats(&table(8), &aligned_ranks(), Some(i64::MAX)).unwrap();
        assert!(stats.skipped);
    }

    #[test]
    fn test_idempotent() {
        let b = [9.0, 3.0, 8.0, 0.0, -9.0, 1.0, 2.0, 1.5];
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, b[i]]).collect();
        let ranks = RankTable::from_rows(ids("F", 8), vec!["a".to_string(), "b".to_string()], &rows).unwrap();

        let (t1, r1) = filter_unextreme_features(&table(8), &ranks, Some(2)).unwrap();
        let (t2, r2) = filter_unextreme_features(&t1, &r1, Some(2)).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(t1.feature_ids(), t2.feature_ids());
    }

    #[test]
    fn test_ties_follow_ascending_order() {
        // Ascending stable order is F4, F5, F3, F1, F2.
        let rows: Vec<Vec<f64>> = vec![vec![1.0], vec![1.0], vec![0.0], vec![-1.0], vec![-1.0]];
        let ranks = RankTable::from_rows(ids("F", 5), vec!["a".to_string()], &rows).unwrap();
        let (_, r) = filter_unextreme_features(&table(5), &ranks, Some(1)).unwrap();
        assert_eq!(r.feature_ids(), &["F2", "F4"]);
    }
}
