//! Rankings joined with optional feature metadata.

use crate::data::index::Indexed;
use crate::data::{Metadata, RankTable, Value};
use crate::error::{QurroError, Result};

/// Per-feature data handed to the chart layer.
///
/// Ranking columns and feature-metadata columns live side by side but are
/// kept apart, since the two play different roles downstream. The metadata
/// rows are aligned to the ranking rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    ranks: RankTable,
    metadata: Metadata,
}

impl FeatureTable {
    /// Pair rankings with metadata whose rows are in the same order.
    pub fn new(ranks: RankTable, metadata: Metadata) -> Result<Self> {
        if ranks.feature_ids() != metadata.ids() {
            return Err(QurroError::validation(
                "Feature metadata rows must line up with the feature rankings.",
            ));
        }
        Ok(Self { ranks, metadata })
    }

    /// Rankings with no metadata columns.
    pub fn from_ranks(ranks: RankTable) -> Result<Self> {
        let metadata = Metadata::empty(ranks.feature_ids().to_vec())?;
        Self::new(ranks, metadata)
    }

    pub fn feature_ids(&self) -> &[String] {
        self.ranks.feature_ids()
    }

    pub fn n_features(&self) -> usize {
        self.ranks.n_features()
    }

    /// Names of the numeric ranking columns.
    pub fn ranking_columns(&self) -> &[String] {
        self.ranks.column_names()
    }

    /// Names of the string feature-metadata columns.
    pub fn feature_metadata_columns(&self) -> &[String] {
        self.metadata.column_names()
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_value(&self, feature_id: &str, column: &str) -> Option<&Value> {
        self.metadata.get(feature_id, column)
    }
}

impl Indexed for FeatureTable {
    fn index(&self) -> &[String] {
        self.ranks.feature_ids()
    }

    fn select_index(&self, ids: &[String]) -> Result<Self> {
        Self::new(self.ranks.select_features(ids)?, self.metadata.select_ids(ids)?)
    }
}
