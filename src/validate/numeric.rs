use crate::data::{AbundanceTable, RankTable};
use crate::error::{QurroError, Result};
use rayon::prelude::*;

/// Largest magnitude that survives a trip through an IEEE-754 double
/// (and so a JSON number read by a browser) without losing integer precision:
/// 2^53 - 1.
pub const MAX_SAFE_MAGNITUDE: f64 = 9_007_199_254_740_991.0;

/// Fail if any abundance or ranking value lies outside ±[`MAX_SAFE_MAGNITUDE`].
///
/// Metadata is not checked; it is carried as text.
pub fn check_json_safe(table: &AbundanceTable, ranks: &RankTable) -> Result<()> {
    let unsafe_count = table
        .data()
        .data()
        .par_iter()
        .filter(|v| !is_safe(**v))
        .count();
    if unsafe_count > 0 {
        return Err(QurroError::validation(format!(
            "{} value{} in the BIOM table {} outside the range [-{max}, {max}] that can be \
             represented exactly in the visualization.",
            unsafe_count,
            if unsafe_count == 1 { "" } else { "s" },
            if unsafe_count == 1 { "is" } else { "are" },
            max = MAX_SAFE_MAGNITUDE
        )));
    }

    for (col, name) in ranks.column_names().iter().enumerate() {
        if let Some(row) = ranks.values().column(col).iter().position(|v| !is_safe(*v)) {
            return Err(QurroError::validation(format!(
                "The value of ranking '{}' for feature '{}' is outside the range [-{max}, {max}] \
                 that can be represented exactly in the visualization.",
                name,
                ranks.feature_ids()[row],
                max = MAX_SAFE_MAGNITUDE
            )));
        }
    }
    Ok(())
}

fn is_safe(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_SAFE_MAGNITUDE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn ranks_with(value: f64) -> RankTable {
        RankTable::from_rows(ids("F", 2), vec!["r".to_string()], &[vec![0.5], vec![value]]).unwrap()
    }

    fn table_with(value: f64) -> AbundanceTable {
        AbundanceTable::from_triplets(vec![(0, 0, 1.0), (1, 0, value)], ids("F", 2), ids("S", 1)).unwrap()
    }

    #[test]
    fn test_boundary_values_pass() {
        assert!(check_json_safe(&table_with(MAX_SAFE_MAGNITUDE), &ranks_with(-MAX_SAFE_MAGNITUDE)).is_ok());
    }

    #[test]
    fn test_large_abundance_fails() {
        let err = check_json_safe(&table_with(2f64.powi(53)), &ranks_with(1.0)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("1 value in the BIOM table is outside"));
    }

    #[test]
    fn test_large_ranking_fails() {
        let err = check_json_safe(&table_with(1.0), &ranks_with(-1e300)).unwrap_err();
        assert!(err.to_string().contains("'F2'"));
    }
}
