//! Pipeline runner: validation, matching, filtering and merging in order.

use crate::data::{AbundanceTable, FeatureTable, Metadata, RankFormat, RankTable, Source};
use crate::error::{QurroError, Result};
use crate::filter::{filter_unextreme_features_with_stats, remove_empty_with_stats, ExtremeFilterResult, PruneStats};
use crate::reconcile::{match_table_and_data_with_stats, merge_feature_metadata, MatchStats};
use crate::sanitize::{sanitize_metadata, sanitize_ranks, sanitize_table};
use crate::validate::{check_column_names, check_json_safe, validate_shape};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// BIOM-style TSV abundance table.
    pub table: PathBuf,
    /// Feature rankings.
    pub ranks: PathBuf,
    /// Layout of the rankings file.
    #[serde(default = "default_rank_format")]
    pub rank_format: RankFormat,
    /// Sample metadata TSV.
    pub sample_metadata: PathBuf,
    /// Optional feature metadata TSV.
    #[serde(default)]
    pub feature_metadata: Option<PathBuf>,
    /// Keep only the top/bottom N features of each ranking.
    #[serde(default)]
    pub extreme_feature_count: Option<i64>,
    /// Where to write the JSON handoff, if anywhere.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_rank_format() -> RankFormat {
    RankFormat::Differentials
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(QurroError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(QurroError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// A filled-in configuration to start from.
    pub fn example() -> Self {
        Self {
            table: PathBuf::from("table.tsv"),
            ranks: PathBuf::from("differentials.tsv"),
            rank_format: RankFormat::Differentials,
            sample_metadata: PathBuf::from("sample_metadata.tsv"),
            feature_metadata: Some(PathBuf::from("feature_metadata.tsv")),
            extreme_feature_count: Some(100),
            output: Some(PathBuf::from("qurro_data.json")),
        }
    }
}

/// The raw inputs, already parsed into tables.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub table: AbundanceTable,
    pub ranks: RankTable,
    pub sample_metadata: Metadata,
    pub feature_metadata: Option<Metadata>,
}

impl Inputs {
    /// Read every input named in a configuration.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let source = Source::path(&config.table);
        info!("Reading BIOM table {}", source.describe());
        let table = AbundanceTable::from_tsv(&source)?;

        let source = Source::path(&config.ranks);
        info!("Reading feature ranks {}", source.describe());
        let ranks = RankTable::from_source(&source, config.rank_format)?;

        let source = Source::path(&config.sample_metadata);
        info!("Reading sample metadata {}", source.describe());
        let sample_metadata = Metadata::from_source(&source)?;

        let feature_metadata = match &config.feature_metadata {
            Some(path) => {
                let source = Source::path(path);
                info!("Reading feature metadata {}", source.describe());
                Some(Metadata::from_source(&source)?)
            }
            None => None,
        };
        Ok(Self {
            table,
            ranks,
            sample_metadata,
            feature_metadata,
        })
    }
}

/// The reconciled tables handed to the chart layer.
///
/// Every ranked feature is in `table`, every metadata sample is a column of
/// `table`, and no sample or feature in `table` sums to zero.
#[derive(Debug, Clone)]
pub struct MatchedDataset {
    pub table: AbundanceTable,
    pub features: FeatureTable,
    pub sample_metadata: Metadata,
}

impl MatchedDataset {
    /// Names of the ranking columns in `features`.
    pub fn ranking_columns(&self) -> &[String] {
        self.features.ranking_columns()
    }

    /// Names of the feature-metadata columns in `features`.
    pub fn feature_metadata_columns(&self) -> &[String] {
        self.features.feature_metadata_columns()
    }
}

/// Non-fatal notices collected while the pipeline ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub matching: MatchStats,
    pub extreme_filter: ExtremeFilterResult,
    pub pruning: PruneStats,
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Matching")?;
        writeln!(f, "  Unranked features dropped:  {}", self.matching.unranked_features)?;
        writeln!(f, "  Metadata samples dropped:   {}", self.matching.metadata_samples_dropped)?;
        writeln!(f, "  Table samples dropped:      {}", self.matching.table_samples_dropped)?;
        write!(f, "{}", self.extreme_filter)?;
        write!(f, "{}", self.pruning)?;
        Ok(())
    }
}

/// Builder for configuring and running the reconciliation pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    extreme_feature_count: Option<i64>,
}

impl Pipeline {
    /// Create a pipeline with no extreme-feature filtering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            extreme_feature_count: config.extreme_feature_count,
        }
    }

    /// Keep only the top/bottom `count` features of each ranking.
    pub fn extreme_feature_count(mut self, count: i64) -> Self {
        self.extreme_feature_count = Some(count);
        self
    }

    /// Run every stage on the inputs.
    ///
    /// Order: shape checks, escaping, reserved-name checks, matching,
    /// extreme-feature filtering, empty pruning, numeric range check,
    /// feature-metadata merge. The first failure is returned unchanged.
    pub fn run(&self, inputs: Inputs) -> Result<(MatchedDataset, PipelineReport)> {
        let Inputs {
            table,
            ranks,
            sample_metadata,
            feature_metadata,
        } = inputs;

        validate_shape("feature ranks", ranks.n_features(), ranks.n_columns(), Some(2), Some(1))?;
        validate_shape("sample metadata", sample_metadata.n_rows(), sample_metadata.n_columns(), Some(1), None)?;
        validate_shape("BIOM table", table.n_features(), table.n_samples(), Some(2), Some(1))?;

        let table = sanitize_table(table)?;
        let ranks = sanitize_ranks(ranks)?;
        let sample_metadata = sanitize_metadata(sample_metadata, "sample metadata")?;
        let feature_metadata = feature_metadata
            .map(|fm| sanitize_metadata(fm, "feature metadata"))
            .transpose()?;
        check_column_names(&sample_metadata, &ranks, feature_metadata.as_ref())?;

        let (table, sample_metadata, matching) =
            match_table_and_data_with_stats(&table, &ranks, &sample_metadata)?;
        debug!("After matching: {} features × {} samples", table.n_features(), table.n_samples());

        let (table, ranks, extreme_filter) =
            filter_unextreme_features_with_stats(&table, &ranks, self.extreme_feature_count)?;

        let (table, sample_metadata, ranks, pruning) =
            remove_empty_with_stats(&table, &sample_metadata, &ranks)?;
        debug!("After pruning: {} features × {} samples", table.n_features(), table.n_samples());

        check_json_safe(&table, &ranks)?;

        let (features, _) = merge_feature_metadata(&ranks, feature_metadata.as_ref())?;

        info!(
            "Reconciled {} features and {} samples.",
            table.n_features(),
            table.n_samples()
        );
        let dataset = MatchedDataset {
            table,
            features,
            sample_metadata,
        };
        let report = PipelineReport {
            matching,
            extreme_filter,
            pruning,
        };
        Ok((dataset, report))
    }
}

/// Read the inputs named in a config and run the pipeline on them.
pub fn run_from_config(config: &PipelineConfig) -> Result<(MatchedDataset, PipelineReport)> {
    let inputs = Inputs::load(config)?;
    Pipeline::from_config(config).run(inputs)
}
