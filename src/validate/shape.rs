use crate::error::{QurroError, Result};

/// Require at least `min_rows` rows and `min_cols` columns.
///
/// `None` leaves that axis unconstrained.
pub fn validate_shape(
    name: &str,
    n_rows: usize,
    n_cols: usize,
    min_rows: Option<usize>,
    min_cols: Option<usize>,
) -> Result<()> {
    if let Some(min) = min_rows {
        if n_rows < min {
            return Err(QurroError::validation(format!(
                "The {} must have at least {} row{} (it has {}).",
                name,
                min,
                plural(min),
                n_rows
            )));
        }
    }
    if let Some(min) = min_cols {
        if n_cols < min {
            return Err(QurroError::validation(format!(
                "The {} must have at least {} column{} (it has {}).",
                name,
                min,
                plural(min),
                n_cols
            )));
        }
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_shape() {
        assert!(validate_shape("feature ranks", 2, 1, Some(2), Some(1)).is_ok());
        assert!(validate_shape("feature metadata", 0, 0, None, None).is_ok());

        let err = validate_shape("feature ranks", 1, 3, Some(2), Some(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The feature ranks must have at least 2 rows (it has 1)."
        );

        let err = validate_shape("BIOM table", 5, 0, Some(2), Some(1)).unwrap_err();
        assert!(err.to_string().contains("at least 1 column "));
    }
}
