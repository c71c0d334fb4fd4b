//! Qurro data reconciliation library
//!
//! This library turns three independently produced inputs into one
//! consistent dataset for a log-ratio visualization:
//!
//! - an abundance table (features × samples, sparse)
//! - feature rankings (differentials or ordination feature loadings)
//! - sample metadata, plus optional feature metadata
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AbundanceTable, RankTable, Metadata)
//! - **sanitize**: Escaping of identifiers and column names
//! - **validate**: Shape, reserved-name and numeric-range checks
//! - **reconcile**: Matching across tables and feature-metadata merging
//! - **filter**: Extreme-feature filtering and empty-entity pruning
//! - **pipeline**: Stage ordering, configuration and reporting
//! - **export**: JSON handoff of the matched dataset
//!
//! # Example
//!
//! ```no_run
//! use qurro::prelude::*;
//!
//! let inputs = Inputs {
//!     table: AbundanceTable::from_tsv(&Source::path("table.tsv")).unwrap(),
//!     ranks: RankTable::from_differentials(&Source::path("differentials.tsv")).unwrap(),
//!     sample_metadata: Metadata::from_source(&Source::path("sample_metadata.tsv")).unwrap(),
//!     feature_metadata: None,
//! };
//!
//! let (dataset, report) = Pipeline::new()
//!     .extreme_feature_count(50)
//!     .run(inputs)
//!     .unwrap();
//! println!("{}", report);
//! write_json(&dataset, "qurro_data.json").unwrap();
//! ```

pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod reconcile;
pub mod sanitize;
pub mod validate;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        match_index, read_metadata_file, read_rank_file, AbundanceTable, FeatureTable, Indexed,
        Metadata, RankFormat, RankTable, Source, Transposed, Value,
    };
    pub use crate::error::{QurroError, Result};
    pub use crate::export::{to_json, write_json, FEATURE_ID_FIELD, SAMPLE_ID_FIELD};
    pub use crate::filter::{
        filter_unextreme_features, filter_unextreme_features_with_stats,
        remove_empty_samples_and_features, remove_empty_with_stats, ExtremeFilterResult,
        PruneStats,
    };
    pub use crate::pipeline::{
        run_from_config, Inputs, MatchedDataset, Pipeline, PipelineConfig, PipelineReport,
    };
    pub use crate::reconcile::{
        match_table_and_data, match_table_and_data_with_stats, merge_feature_metadata, MatchStats,
    };
    pub use crate::sanitize::{escape_id, sanitize_metadata, sanitize_ranks, sanitize_table};
    pub use crate::validate::{check_column_names, check_json_safe, validate_shape, MAX_SAFE_MAGNITUDE};
}
