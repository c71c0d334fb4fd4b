//! Data structures for the reconciliation pipeline.

mod features;
pub mod index;
mod metadata;
mod ranks;
mod source;
mod table;
pub(crate) mod tsv;

pub use features::FeatureTable;
pub use index::{match_index, Indexed};
pub use metadata::{read_metadata_file, Metadata, Value};
pub use ranks::{read_rank_file, RankFormat, RankTable};
pub use source::Source;
pub use table::{AbundanceTable, Transposed};
pub use tsv::DIRECTIVE_PREFIX;
