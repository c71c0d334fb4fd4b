//! Feature and sample filtering after matching.

pub mod empty;
pub mod extreme;

pub use empty::{remove_empty_samples_and_features, remove_empty_with_stats, PruneStats};
pub use extreme::{
    filter_unextreme_features, filter_unextreme_features_with_stats, ExtremeFilterResult,
};
