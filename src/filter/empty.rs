//! Removal of samples and features with no abundance.

use crate::data::{match_index, AbundanceTable, Metadata, RankTable};
use crate::error::{QurroError, Result};
use log::info;
use serde::{Deserialize, Serialize};

/// What empty-entity pruning removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneStats {
    /// Samples whose abundances summed to zero.
    pub empty_samples: Vec<String>,
    /// Features left with zero total once empty samples were gone.
    pub empty_features: Vec<String>,
}

impl std::fmt::Display for PruneStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Empty Entity Pruning")?;
        writeln!(f, "  Samples removed:   {}", self.empty_samples.len())?;
        writeln!(f, "  Features removed:  {}", self.empty_features.len())?;
        Ok(())
    }
}

/// Drop empty samples, then the features that became empty, from the table
/// and the matching rows of the sample metadata and rankings.
///
/// Meant to run after extreme-feature filtering, which can leave samples
/// whose only abundance was in removed features. Fails if no sample has any
/// abundance left.
pub fn remove_empty_samples_and_features(
    table: &AbundanceTable,
    sample_metadata: &Metadata,
    ranks: &RankTable,
) -> Result<(AbundanceTable, Metadata, RankTable)> {
    let (table, metadata, ranks, _) = remove_empty_with_stats(table, sample_metadata, ranks)?;
    Ok((table, metadata, ranks))
}

/// [`remove_empty_samples_and_features`], also reporting what was removed.
pub fn remove_empty_with_stats(
    table: &AbundanceTable,
    sample_metadata: &Metadata,
    ranks: &RankTable,
) -> Result<(AbundanceTable, Metadata, RankTable, PruneStats)> {
    let mut stats = PruneStats::default();

    let col_sums = table.col_sums();
    let mut keep_samples = Vec::with_capacity(col_sums.len());
    for (col, &sum) in col_sums.iter().enumerate() {
        if sum == 0.0 {
            stats.empty_samples.push(table.sample_ids()[col].clone());
        } else {
            keep_samples.push(col);
        }
    }
    if keep_samples.is_empty() {
        return Err(QurroError::validation(
            "Having removed empty samples, no samples remain. Every sample has zero abundance \
             across the features that are left; check the inputs or use a larger extreme \
             feature count.",
        ));
    }
    let table = table.subset_samples(&keep_samples)?;

    let row_sums = table.row_sums();
    let mut keep_features = Vec::with_capacity(row_sums.len());
    for (row, &sum) in row_sums.iter().enumerate() {
        if sum == 0.0 {
            stats.empty_features.push(table.feature_ids()[row].clone());
        } else {
            keep_features.push(row);
        }
    }
    let table = table.subset_features(&keep_features)?;

    let (samples, metadata) = match_index(&table.transpose(), sample_metadata)?;
    let (table, ranks) = match_index(&samples.transpose(), ranks)?;

    if !stats.empty_samples.is_empty() {
        info!(
            "{} empty sample{} (with zero abundance across all retained features) removed.",
            stats.empty_samples.len(),
            if stats.empty_samples.len() == 1 { "" } else { "s" }
        );
    }
    if !stats.empty_features.is_empty() {
        info!(
            "{} empty feature{} removed.",
            stats.empty_features.len(),
            if stats.empty_features.len() == 1 { "" } else { "s" }
        );
    }

    Ok((table, metadata, ranks, stats))
}
