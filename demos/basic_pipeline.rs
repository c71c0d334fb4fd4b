//! Basic example of the reconciliation pipeline.
//!
//! This example shows how to:
//! 1. Build a small abundance table, rankings and metadata in memory
//! 2. Run the pipeline with extreme-feature filtering
//! 3. Examine the report and the JSON handoff

use qurro::prelude::*;
use sprs::TriMat;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Qurro Reconciliation Example ===\n");

    let inputs = create_example_inputs()?;
    println!("Inputs:");
    println!("  Table:    {} features × {} samples", inputs.table.n_features(), inputs.table.n_samples());
    println!("  Rankings: {} features × {} columns", inputs.ranks.n_features(), inputs.ranks.n_columns());
    println!("  Metadata: {} samples", inputs.sample_metadata.n_rows());
    println!();

    let (dataset, report) = Pipeline::new().extreme_feature_count(3).run(inputs)?;

    println!("=== Report ===\n");
    println!("{}", report);

    println!("=== Matched Dataset ===\n");
    println!("  Features: {:?}", dataset.features.feature_ids());
    println!("  Samples:  {:?}", dataset.sample_metadata.ids());
    println!("  Ranking columns: {:?}", dataset.ranking_columns());

    let doc = to_json(&dataset)?;
    println!("\n{}", serde_json::to_string_pretty(&doc["sample_data"])?);

    Ok(())
}

/// Twelve features, eight samples; sample `s8` only carries middle features.
fn create_example_inputs() -> Result<Inputs> {
    let n_features = 12;
    let n_samples = 8;

    let mut tri_mat = TriMat::new((n_features, n_samples));
    for feature in 0..n_features {
        for sample in 0..n_samples - 1 {
            if (feature + sample) % 3 != 0 {
                tri_mat.add_triplet(feature, sample, ((feature + 1) * (sample + 2)) as f64);
            }
        }
    }
    tri_mat.add_triplet(5, n_samples - 1, 40.0);
    tri_mat.add_triplet(6, n_samples - 1, 12.0);

    let feature_ids: Vec<String> = (1..=n_features).map(|i| format!("OTU.{}", i)).collect();
    let sample_ids: Vec<String> = (1..=n_samples).map(|i| format!("s{}", i)).collect();
    let table = AbundanceTable::new(tri_mat.to_csr(), feature_ids.clone(), sample_ids.clone())?;

    let rows: Vec<Vec<f64>> = (0..n_features)
        .map(|i| {
            let x = i as f64 - 5.5;
            vec![x, (x * 0.7).sin()]
        })
        .collect();
    let ranks = RankTable::from_rows(
        feature_ids,
        vec!["Intercept".to_string(), "treatment[T.drug]".to_string()],
        &rows,
    )?;

    let metadata_rows = sample_ids
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let group = if i % 2 == 0 { "control" } else { "drug" };
            vec![Value::from_raw(group), Value::from_raw(if i == 3 { " " } else { "True" })]
        })
        .collect();
    let sample_metadata = Metadata::new(
        sample_ids,
        vec!["treatment".to_string(), "passed_qc".to_string()],
        metadata_rows,
    )?;

    Ok(Inputs {
        table,
        ranks,
        sample_metadata,
        feature_metadata: None,
    })
}
