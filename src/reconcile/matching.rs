//! Matching the abundance table against rankings and sample metadata.

use crate::data::{match_index, AbundanceTable, Metadata, RankTable};
use crate::error::{QurroError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// What matching had to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Table features without a ranking (silently dropped).
    pub unranked_features: usize,
    /// Sample metadata rows absent from the table.
    pub metadata_samples_dropped: usize,
    /// Table samples absent from the sample metadata (silently dropped).
    pub table_samples_dropped: usize,
}

/// Reconcile the table with the rankings and the sample metadata.
///
/// Keeps the table features that are ranked and the samples shared with the
/// metadata. Every ranked feature must be in the table, and at least one
/// sample must be shared. The feature check runs first, so it wins when both
/// problems are present.
pub fn match_table_and_data(
    table: &AbundanceTable,
    ranks: &RankTable,
    sample_metadata: &Metadata,
) -> Result<(AbundanceTable, Metadata)> {
    let (table, metadata, _) = match_table_and_data_with_stats(table, ranks, sample_metadata)?;
    Ok((table, metadata))
}

/// [`match_table_and_data`], also reporting what was dropped.
pub fn match_table_and_data_with_stats(
    table: &AbundanceTable,
    ranks: &RankTable,
    sample_metadata: &Metadata,
) -> Result<(AbundanceTable, Metadata, MatchStats)> {
    // Features: every ranked feature must be in the table.
    let (ranked_table, matched_ranks) = match_index(table, ranks)?;
    if matched_ranks.n_features() < ranks.n_features() {
        let missing = ranks.n_features() - matched_ranks.n_features();
        return Err(QurroError::validation(format!(
            "Of the {} ranked features, {} {} not present in the input BIOM table.",
            ranks.n_features(),
            missing,
            if missing == 1 { "was" } else { "were" }
        )));
    }

    // Samples: the table decides the final set.
    let (matched_samples, matched_metadata) = match_index(&ranked_table.transpose(), sample_metadata)?;
    if matched_metadata.n_rows() == 0 {
        return Err(QurroError::validation(
            "No samples are shared between the sample metadata file and BIOM table.",
        ));
    }
    let matched_table = matched_samples.transpose();

    let stats = MatchStats {
        unranked_features: table.n_features() - matched_table.n_features(),
        metadata_samples_dropped: sample_metadata.n_rows() - matched_metadata.n_rows(),
        table_samples_dropped: table.n_samples() - matched_table.n_samples(),
    };
    if stats.metadata_samples_dropped > 0 {
        info!(
            "{} sample{} in the sample metadata file {} not present in the BIOM table, and {} been removed.",
            stats.metadata_samples_dropped,
            if stats.metadata_samples_dropped == 1 { "" } else { "s" },
            if stats.metadata_samples_dropped == 1 { "was" } else { "were" },
            if stats.metadata_samples_dropped == 1 { "has" } else { "have" },
        );
    }
    debug!(
        "Matched table: {} features × {} samples ({} unranked features dropped)",
        matched_table.n_features(),
        matched_table.n_samples(),
        stats.unranked_features
    );

    Ok((matched_table, matched_metadata, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Source;

    fn table(features: &[&str], samples: &[&str]) -> AbundanceTable {
        let triplets: Vec<(usize, usize, f64)> = (0..features.len())
            .flat_map(|r| (0..samples.len()).map(move |c| (r, c, (r + c + 1) as f64)))
            .collect();
        AbundanceTable::from_triplets(
            triplets,
            features.iter().map(|s| s.to_string()).collect(),
            samples.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    fn ranks(features: &[&str]) -> RankTable {
        let rows: Vec<Vec<f64>> = (0..features.len()).map(|i| vec![i as f64]).collect();
        RankTable::from_rows(
            features.iter().map(|s| s.to_string()).collect(),
            vec!["r".to_string()],
            &rows,
        )
        .unwrap()
    }

    fn metadata(samples: &[&str]) -> Metadata {
        let mut text = String::from("id\tgroup\n");
        for s in samples {
            text.push_str(&format!("{}\tg\n", s));
        }
        Metadata::from_source(&Source::text(text)).unwrap()
    }

    #[test]
    fn test_unranked_table_features_dropped() {
        let t = table(&["F1", "F2", "F3"], &["S1", "S2"]);
        let (mt, md, stats) =
            match_table_and_data_with_stats(&t, &ranks(&["F3", "F1"]), &metadata(&["S1", "S2"])).unwrap();
        assert_eq!(mt.feature_ids(), &["F1", "F3"]);
        assert_eq!(mt.row_dense(1), t.row_dense(2));
        assert_eq!(md.n_rows(), 2);
        assert_eq!(stats.unranked_features, 1);
    }

    #[test]
    fn test_missing_ranked_feature_singular() {
        let t = table(&["F1", "F2"], &["S1"]);
        let err = match_table_and_data(&t, &ranks(&["F1", "F2", "F9"]), &metadata(&["S1"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Of the 3 ranked features, 1 was not present in the input BIOM table."
        );
    }

    #[test]
    fn test_missing_ranked_features_plural() {
        let t = table(&["F1", "F2"], &["S1"]);
        let err = match_table_and_data(&t, &ranks(&["F1", "F8", "F9"]), &metadata(&["S1"])).unwrap_err();
        assert!(err.to_string().contains("2 were not present"));
    }

    #[test]
    fn test_sample_tolerance_is_one_directional() {
        let t = table(&["F1", "F2"], &["S1", "S2", "S3"]);
        let (mt, md, stats) =
            match_table_and_data_with_stats(&t, &ranks(&["F1", "F2"]), &metadata(&["S2", "S3", "S4", "S5"]))
                .unwrap();
        assert_eq!(mt.sample_ids(), &["S2", "S3"]);
        assert_eq!(md.ids(), &["S2", "S3"]);
        assert_eq!(stats.metadata_samples_dropped, 2);
        assert_eq!(stats.table_samples_dropped, 1);
    }

    #[test]
    fn test_no_shared_samples() {
        let t = table(&["F1", "F2"], &["S1"]);
        let err = match_table_and_data(&t, &ranks(&["F1"]), &metadata(&["X1"])).unwrap_err();
        assert!(err.to_string().contains("No samples are shared"));
    }

    #[test]
    fn test_feature_error_reported_before_sample_error() {
        let t = table(&["F1", "F2"], &["S1"]);
        let err = match_table_and_data(&t, &ranks(&["F1", "F9"]), &metadata(&["X1"])).unwrap_err();
        assert!(err.to_string().contains("ranked features"));
    }
}
