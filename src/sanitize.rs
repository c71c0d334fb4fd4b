//! Escaping of identifiers and column names.
//!
//! The chart layer addresses fields by name, and some characters (`.`,
//! brackets, quotes, backslashes) change how those names are parsed. Every
//! identifier and column name is rewritten before matching so that all
//! tables agree on the escaped form.

use crate::data::{AbundanceTable, Metadata, RankTable};
use crate::error::Result;

/// Rewrite the characters that break field references.
///
/// `.` → `:`, `]` → `)`, `[` → `(`, and each of `'`, `"`, `\` → `|`.
/// Everything else passes through.
pub fn escape_id(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '.' => ':',
            ']' => ')',
            '[' => '(',
            '\'' | '"' | '\\' => '|',
            other => other,
        })
        .collect()
}

/// Escape feature and sample IDs of the abundance table.
pub fn sanitize_table(table: AbundanceTable) -> Result<AbundanceTable> {
    table.map_ids(escape_id, "BIOM table")
}

/// Escape feature IDs and column names of the feature rankings.
pub fn sanitize_ranks(ranks: RankTable) -> Result<RankTable> {
    ranks.map_names(escape_id, "feature ranks")
}

/// Escape IDs and column names of a metadata table; `name` labels errors.
pub fn sanitize_metadata(metadata: Metadata, name: &str) -> Result<Metadata> {
    metadata.map_names(escape_id, name)
}
