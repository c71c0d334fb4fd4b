//! Left join of feature metadata onto the rankings.

use crate::data::{FeatureTable, Metadata, RankTable};
use crate::error::{QurroError, Result};
use log::debug;

/// Attach feature metadata to the rankings.
///
/// The rankings are the complete side: metadata rows for unranked features
/// are dropped, and ranked features without metadata get missing values.
/// Returns the joined table and the names of the metadata columns (empty
/// when no metadata is given). Fails before joining if any column name
/// appears in both inputs.
pub fn merge_feature_metadata(
    ranks: &RankTable,
    feature_metadata: Option<&Metadata>,
) -> Result<(FeatureTable, Vec<String>)> {
    let fm = match feature_metadata {
        Some(fm) => fm,
        None => return Ok((FeatureTable::from_ranks(ranks.clone())?, Vec::new())),
    };

    let shared: Vec<&String> = fm
        .column_names()
        .iter()
        .filter(|c| ranks.column_names().contains(*c))
        .collect();
    if !shared.is_empty() {
        return Err(QurroError::validation(format!(
            "Column names for the feature metadata and feature ranks should be distinct; \
             both contain {}.",
            shared
                .iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let aligned = fm.reindex(ranks.feature_ids())?;
    let unannotated = ranks
        .feature_ids()
        .iter()
        .filter(|id| !fm.has_id(id))
        .count();
    debug!(
        "Merged {} feature metadata column(s); {} ranked feature(s) have no metadata",
        fm.n_columns(),
        unannotated
    );

    let columns = aligned.column_names().to_vec();
    Ok((FeatureTable::new(ranks.clone(), aligned)?, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Source, Value};

    fn ranks() -> RankTable {
        let text = "id\tr1\tr2\nF1\t1\t2\nF2\t3\t4\nF3\t5\t6\n";
        RankTable::from_differentials(&Source::text(text)).unwrap()
    }

    #[test]
    fn test_no_metadata() {
        let (ft, cols) = merge_feature_metadata(&ranks(), None).unwrap();
        assert!(cols.is_empty());
        assert_eq!(ft.ranking_columns(), &["r1", "r2"]);
        assert!(ft.feature_metadata_columns().is_empty());
        assert_eq!(ft.ranks(), &ranks());
    }

    #[test]
    fn test_left_join() {
        let text = "id\tTaxon\tConfidence\nF2\tk__B\t0.90\nF9\tk__A\t1\nF1\tk__C\t\n";
        let fm = Metadata::from_source(&Source::text(text)).unwrap();
        let (ft, cols) = merge_feature_metadata(&ranks(), Some(&fm)).unwrap();

        assert_eq!(cols, vec!["Taxon", "Confidence"]);
        assert_eq!(ft.feature_ids(), &["F1", "F2", "F3"]);
        assert_eq!(ft.metadata_value("F2", "Confidence").unwrap().as_str(), Some("0.90"));
        assert_eq!(ft.metadata_value("F1", "Confidence"), Some(&Value::Missing));
        assert_eq!(ft.metadata_value("F3", "Taxon"), Some(&Value::Missing));
        assert!(ft.metadata_value("F9", "Taxon").is_none());
    }

    #[test]
    fn test_shared_column_rejected() {
        let ranks = RankTable::from_differentials(&Source::text(
            "id\tDescription\nF1\t1\nF2\t2\n",
        ))
        .unwrap();
        let fm = Metadata::from_source(&Source::text("id\tDescription\nF1\tfoo\n")).unwrap();
        let err = merge_feature_metadata(&ranks, Some(&fm)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'Description'"));
    }
}
