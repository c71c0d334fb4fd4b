//! Reconciliation of independently sourced tables.

mod matching;
mod merge;

pub use matching::{match_table_and_data, match_table_and_data_with_stats, MatchStats};
pub use merge::merge_feature_metadata;
