use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use haplomap_analysis::pipeline::{Pipeline, PipelineConfig};

use crate::{
    render, table,
    util::{self, Output},
};

/// Map ancient-DNA haplogroup frequencies onto clustered map markers
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Annotation table (tab-separated `.anno`/`.tsv`/`.txt`, otherwise comma-separated)
    input: PathBuf,
    /// Number of Y-chromosome clusters [default: 150]
    #[arg(long = "cluster_Y", value_name = "N")]
    cluster_y: Option<usize>,
    /// Number of mtDNA clusters [default: 350]
    #[arg(long = "cluster_mt", value_name = "N")]
    cluster_mt: Option<usize>,
    /// Seed of the k-means initialization [default: 42]
    #[arg(long)]
    seed: Option<u64>,
    /// Comma-separated time bin edges in years BP
    #[arg(long, value_delimiter = ',', value_name = "BP")]
    bin_edges: Option<Vec<f64>>,
    /// Keep present-day (BP 0) samples
    #[arg(long)]
    keep_present_day: bool,
    /// Pipeline configuration JSON; explicit flags take precedence
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output HTML file
    #[arg(long, default_value = "map.html")]
    output: PathBuf,
    /// Also write the map data as JSON (`-` for stdout)
    #[arg(long, value_name = "PATH")]
    data_output: Option<PathBuf>,
    /// Do not open the map in a browser
    #[arg(long)]
    no_open: bool,
    /// Field delimiter of the input table (a single ASCII character or `tab`)
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<u8>,
}

impl CommandArgs {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config: PipelineConfig = match &self.config {
            Some(path) => util::read_json_file("configuration", path)?,
            None => PipelineConfig::default(),
        };
        if let Some(count) = self.cluster_y {
            config.cluster_y = count;
        }
        if let Some(count) = self.cluster_mt {
            config.cluster_mt = count;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(edges) = &self.bin_edges {
            config.bin_edges.clone_from(edges);
        }
        if self.keep_present_day {
            config.normalize.drop_present_day = false;
        }
        Ok(config)
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("expected a single ASCII character, got {value:?}")),
        },
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();

    let config = args.pipeline_config()?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    let records = table::read_table(&args.input, args.delimiter)?;
    log::info!("read {} rows from {}", records.len(), args.input.display());

    let data = pipeline.run(&records);

    if let Some(path) = &args.data_output {
        Output::save_json(&data, Some(path.clone()))?;
    }
    render::write_html(&data, &args.output)?;
    log::info!("map written to {}", args.output.display());

    if !args.no_open {
        util::open_in_browser(&args.output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CommandArgs::try_parse_from(["haplomap", "data.anno"]).unwrap();
        assert_eq!(args.output, PathBuf::from("map.html"));
        assert_eq!(args.pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = CommandArgs::try_parse_from([
            "haplomap",
            "--cluster_Y",
            "20",
            "--cluster_mt",
            "30",
            "--seed",
            "7",
            "--bin-edges",
            "0,500,1000",
            "--keep-present-day",
            "--delimiter",
            "tab",
            "data.csv",
        ])
        .unwrap();
        let config = args.pipeline_config().unwrap();
        assert_eq!(config.cluster_y, 20);
        assert_eq!(config.cluster_mt, 30);
        assert_eq!(config.seed, 7);
        assert_eq!(config.bin_edges, [0.0, 500.0, 1000.0]);
        assert!(!config.normalize.drop_present_day);
        assert_eq!(args.delimiter, Some(b'\t'));
    }

    #[test]
    fn test_zero_clusters_is_a_config_error() {
        let args = CommandArgs::try_parse_from(["haplomap", "--cluster_Y", "0", "missing.anno"])
            .unwrap();
        let config = args.pipeline_config().unwrap();
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
