//! JSON handoff of a matched dataset to the chart layer.
//!
//! The document has five keys:
//! - `feature_data`: one object per feature with `Feature ID`, every ranking
//!   value and every feature-metadata value (`null` when missing)
//! - `sample_data`: one object per sample with `Sample ID` and its metadata
//! - `counts`: feature ID → sample ID → abundance, non-zero entries only
//! - `ranking_columns` / `feature_metadata_columns`: which feature fields
//!   are rankings and which are metadata

use crate::data::Metadata;
use crate::error::{QurroError, Result};
use crate::pipeline::MatchedDataset;
use serde_json::{json, Map, Number, Value as Json};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Field holding each feature's identifier.
pub const FEATURE_ID_FIELD: &str = "Feature ID";

/// Field holding each sample's identifier.
pub const SAMPLE_ID_FIELD: &str = "Sample ID";

/// Build the handoff document.
pub fn to_json(dataset: &MatchedDataset) -> Result<Json> {
    let features = &dataset.features;
    let ranks = features.ranks();

    let mut feature_data = Vec::with_capacity(features.n_features());
    for (row, feature_id) in features.feature_ids().iter().enumerate() {
        let mut obj = Map::new();
        obj.insert(FEATURE_ID_FIELD.to_string(), Json::String(feature_id.clone()));
        for (col, name) in ranks.column_names().iter().enumerate() {
            obj.insert(name.clone(), number(ranks.get(row, col))?);
        }
        insert_metadata(&mut obj, features.metadata(), feature_id)?;
        feature_data.push(Json::Object(obj));
    }

    let sample_metadata = &dataset.sample_metadata;
    let mut sample_data = Vec::with_capacity(sample_metadata.n_rows());
    for sample_id in sample_metadata.ids() {
        let mut obj = Map::new();
        obj.insert(SAMPLE_ID_FIELD.to_string(), Json::String(sample_id.clone()));
        insert_metadata(&mut obj, sample_metadata, sample_id)?;
        sample_data.push(Json::Object(obj));
    }

    let table = &dataset.table;
    let mut counts = Map::new();
    for feature_id in table.feature_ids() {
        counts.insert(feature_id.clone(), Json::Object(Map::new()));
    }
    for (row, col, value) in table.iter_nonzero() {
        if let Some(Json::Object(per_sample)) = counts.get_mut(&table.feature_ids()[row]) {
            per_sample.insert(table.sample_ids()[col].clone(), number(value)?);
        }
    }

    Ok(json!({
        "feature_data": feature_data,
        "sample_data": sample_data,
        "counts": counts,
        "ranking_columns": dataset.ranking_columns(),
        "feature_metadata_columns": dataset.feature_metadata_columns(),
    }))
}

/// Write the handoff document to `path`.
pub fn write_json<P: AsRef<Path>>(dataset: &MatchedDataset, path: P) -> Result<()> {
    let doc = to_json(dataset)?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, &doc)?;
    Ok(())
}

fn insert_metadata(obj: &mut Map<String, Json>, metadata: &Metadata, id: &str) -> Result<()> {
    if let Some(row) = metadata.row(id) {
        for (name, value) in metadata.column_names().iter().zip(row) {
            obj.insert(name.clone(), serde_json::to_value(value)?);
        }
    }
    Ok(())
}

fn number(value: f64) -> Result<Json> {
    Number::from_f64(value)
        .map(Json::Number)
        .ok_or_else(|| QurroError::validation(format!("{} cannot be written as JSON.", value)))
}
