//! Identifier-keyed tables and index matching.

use crate::error::{QurroError, Result};
use std::collections::HashSet;

/// A table whose rows are keyed by unique string identifiers.
pub trait Indexed: Sized {
    /// Row identifiers, in row order.
    fn index(&self) -> &[String];

    /// A new table holding only the rows named in `ids`, in that order.
    fn select_index(&self, ids: &[String]) -> Result<Self>;
}

/// Restrict two tables to the identifiers they share.
///
/// Each result keeps its own row order, so swapping the arguments yields
/// the same pair of results in swapped positions. When nothing is shared
/// both results are empty but keep their column layout.
pub fn match_index<A: Indexed, B: Indexed>(a: &A, b: &B) -> Result<(A, B)> {
    let a_ids: HashSet<&str> = a.index().iter().map(String::as_str).collect();
    let b_ids: HashSet<&str> = b.index().iter().map(String::as_str).collect();

    let shared_a: Vec<String> = a
        .index()
        .iter()
        .filter(|id| b_ids.contains(id.as_str()))
        .cloned()
        .collect();
    let shared_b: Vec<String> = b
        .index()
        .iter()
        .filter(|id| a_ids.contains(id.as_str()))
        .cloned()
        .collect();

    Ok((a.select_index(&shared_a)?, b.select_index(&shared_b)?))
}

/// Fail if `names` contains a repeat.
///
/// `what` names the axis ("IDs", "column names") and `table` the input.
pub fn ensure_unique(names: &[String], what: &str, table: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(QurroError::validation(format!(
                "The {} of the {} must be unique; '{}' occurs more than once.",
                what, table, name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_unique() {
        let ok = vec!["a".to_string(), "b".to_string()];
        assert!(ensure_unique(&ok, "IDs", "sample metadata").is_ok());

        let dup = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = ensure_unique(&dup, "IDs", "sample metadata").unwrap_err();
        assert!(err.to_string().contains("sample metadata"));
        assert!(err.to_string().contains("'a'"));
    }
}
