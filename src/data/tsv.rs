//! Shared tab-delimited reading for tables, rankings and metadata.

use crate::data::Source;
use crate::error::{QurroError, Result};

/// Prefix of QIIME 2 metadata directive lines (e.g. `#q2:types`).
pub const DIRECTIVE_PREFIX: &str = "#q2:";

/// Prefix of free-form comment lines written above a BIOM TSV header.
pub const PREAMBLE_PREFIX: &str = "# ";

/// Header and data rows of a tab-delimited file, cells untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tsv {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read every record of a tab-delimited source.
///
/// Fully empty lines are dropped by the underlying reader. Quote characters
/// are ordinary cell content.
pub(crate) fn read_records(source: &Source) -> Result<Vec<Vec<String>>> {
    let reader = source.open()?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record?;
        records.push(record.iter().map(String::from).collect());
    }
    Ok(records)
}

/// Read a header plus data rows.
///
/// With `skip_preamble`, records above the header starting with
/// [`PREAMBLE_PREFIX`] are ignored. Directive lines are skipped only while
/// they directly follow the header; the first ordinary row ends the scan
/// and any later directive-looking row is kept as data.
pub(crate) fn read_tsv(source: &Source, name: &str, skip_preamble: bool) -> Result<Tsv> {
    let mut records = read_records(source)?.into_iter();

    let header = loop {
        match records.next() {
            Some(record) if skip_preamble && is_preamble(&record) => continue,
            Some(record) => break record,
            None => {
                return Err(QurroError::validation(format!(
                    "The {} is empty.",
                    name
                )))
            }
        }
    };

    let mut rows = Vec::new();
    let mut in_directives = true;
    for record in records {
        if in_directives && is_directive(&record) {
            continue;
        }
        in_directives = false;
        rows.push(record);
    }

    Ok(Tsv { header, rows })
}

fn is_preamble(record: &[String]) -> bool {
    record
        .first()
        .is_some_and(|first| first.starts_with(PREAMBLE_PREFIX))
}

fn is_directive(record: &[String]) -> bool {
    record
        .first()
        .is_some_and(|first| first.starts_with(DIRECTIVE_PREFIX))
}
