use crate::data::{Metadata, RankTable};
use crate::error::{QurroError, Result};

/// Column names the chart layer adds to sample data.
pub const RESERVED_SAMPLE_COLUMNS: [&str; 3] = ["Sample ID", "qurro_balance", "qurro_spc"];

/// Column names the chart layer adds to feature data.
pub const RESERVED_FEATURE_COLUMNS: [&str; 2] = ["Feature ID", "qurro_classification"];

/// Reject column names that collide with fields the chart layer reserves.
pub fn check_column_names(
    sample_metadata: &Metadata,
    ranks: &RankTable,
    feature_metadata: Option<&Metadata>,
) -> Result<()> {
    reject_reserved(sample_metadata.column_names(), &RESERVED_SAMPLE_COLUMNS, "sample metadata")?;
    reject_reserved(ranks.column_names(), &RESERVED_FEATURE_COLUMNS, "feature ranks")?;
    if let Some(fm) = feature_metadata {
        reject_reserved(fm.column_names(), &RESERVED_FEATURE_COLUMNS, "feature metadata")?;
    }
    Ok(())
}

fn reject_reserved(columns: &[String], reserved: &[&str], table: &str) -> Result<()> {
    match columns.iter().find(|c| reserved.contains(&c.as_str())) {
        Some(col) => Err(QurroError::validation(format!(
            "'{}' is a reserved name and cannot be a column of the {}.",
            col, table
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Source;

    fn ranks(header: &str) -> RankTable {
        let text = format!("id\t{}\nF1\t1\nF2\t2\n", header);
        RankTable::from_differentials(&Source::text(text)).unwrap()
    }

    fn metadata(header: &str) -> Metadata {
        let text = format!("id\t{}\nS1\tx\n", header);
        Metadata::from_source(&Source::text(text)).unwrap()
    }

    #[test]
    fn test_accepts_ordinary_names() {
        assert!(check_column_names(&metadata("group"), &ranks("r"), Some(&metadata("Taxon"))).is_ok());
    }

    #[test]
    fn test_rejects_reserved_names() {
        let err = check_column_names(&metadata("qurro_balance"), &ranks("r"), None).unwrap_err();
        assert!(err.to_string().contains("sample metadata"));

        assert!(check_column_names(&metadata("g"), &ranks("Feature ID"), None).is_err());
        assert!(
            check_column_names(&metadata("g"), &ranks("r"), Some(&metadata("qurro_classification")))
                .is_err()
        );
    }
}
