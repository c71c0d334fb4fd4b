//! Qurro CLI
//!
//! Reconciles an abundance table, feature rankings and metadata, and writes
//! the JSON handed to the visualization.

use clap::{Parser, Subcommand, ValueEnum};
use qurro::data::RankFormat;
use qurro::error::Result;
use qurro::export::write_json;
use qurro::pipeline::{run_from_config, PipelineConfig};
use std::path::PathBuf;

/// CLI-friendly rank format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRankFormat {
    /// Tab-delimited differentials (feature ID + numeric columns)
    Differentials,
    /// Ordination results; feature loadings are used
    Ordination,
}

impl From<CliRankFormat> for RankFormat {
    fn from(format: CliRankFormat) -> Self {
        match format {
            CliRankFormat::Differentials => RankFormat::Differentials,
            CliRankFormat::Ordination => RankFormat::Ordination,
        }
    }
}

/// Rank plot and sample plot data preparation
#[derive(Parser)]
#[command(name = "qurro")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every pipeline stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile inputs and write the visualization data
    Run {
        /// Read every setting from a YAML configuration file
        #[arg(long, conflicts_with_all = ["table", "ranks", "sample_metadata"])]
        config: Option<PathBuf>,

        /// Path to BIOM-style TSV abundance table
        #[arg(short, long, required_unless_present = "config")]
        table: Option<PathBuf>,

        /// Path to feature rankings
        #[arg(short, long, required_unless_present = "config")]
        ranks: Option<PathBuf>,

        /// Layout of the rankings file
        #[arg(long, value_enum, default_value = "differentials")]
        rank_format: CliRankFormat,

        /// Path to sample metadata TSV
        #[arg(short = 's', long, required_unless_present = "config")]
        sample_metadata: Option<PathBuf>,

        /// Path to feature metadata TSV
        #[arg(short = 'f', long)]
        feature_metadata: Option<PathBuf>,

        /// Keep only the top/bottom N features of each ranking
        #[arg(short = 'x', long, allow_negative_numbers = true)]
        extreme_feature_count: Option<i64>,

        /// Output path for the JSON data
        #[arg(short, long, default_value = "qurro_data.json")]
        output: PathBuf,
    },

    /// Generate an example configuration
    ExampleConfig {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "qurro.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Run {
            config,
            table,
            ranks,
            rank_format,
            sample_metadata,
            feature_metadata,
            extreme_feature_count,
            output,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::from_file(path),
                None => Ok(PipelineConfig {
                    table: table.unwrap_or_default(),
                    ranks: ranks.unwrap_or_default(),
                    rank_format: rank_format.into(),
                    sample_metadata: sample_metadata.unwrap_or_default(),
                    feature_metadata,
                    extreme_feature_count,
                    output: Some(output.clone()),
                }),
            };
            config.and_then(|config| cmd_run(&config, output))
        }
        Commands::ExampleConfig { output } => cmd_example_config(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the pipeline and write its JSON
fn cmd_run(config: &PipelineConfig, default_output: PathBuf) -> Result<()> {
    let (dataset, report) = run_from_config(config)?;
    eprint!("{}", report);

    let output = config.output.clone().unwrap_or(default_output);
    log::info!("Writing visualization data to {:?}", output);
    write_json(&dataset, &output)?;

    eprintln!(
        "Done! {} features × {} samples",
        dataset.table.n_features(),
        dataset.table.n_samples()
    );
    Ok(())
}

/// Write an example configuration
fn cmd_example_config(output: &PathBuf) -> Result<()> {
    let yaml = PipelineConfig::example().to_yaml()?;
    std::fs::write(output, yaml)?;
    eprintln!("Example configuration written to {:?}", output);
    Ok(())
}
