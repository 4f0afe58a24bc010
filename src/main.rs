mod config;
mod dataset;
mod error;
mod labels;
mod matrix;
mod output;
mod result;

use std::{fs::File, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GenerateConfig;
use labels::LabelIndex;
use matrix::{ConfusionMatrix, MatrixType};
use output::OutputFormat;

/// Generates a confusion matrix from a CSV file with actual/predicted label columns.
#[derive(Parser, Debug)]
#[command(name = "scm-gen", version)]
struct Cli {
    /// The CSV (or .parquet) file to load the actual/predicted labels from
    #[arg(short, long, value_name = "FILE", required_unless_present = "dump_config")]
    input: Option<PathBuf>,

    /// The optional file to write the generated matrix to, prints to stdout otherwise
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON file with default options, explicit flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// The column delimiter in the CSV file [default: ,]
    #[arg(short, long, value_name = "DELIMITER")]
    delimiter: Option<char>,

    /// The quote character to use in the CSV file [default: "]
    #[arg(short, long, value_name = "CHAR")]
    quotechar: Option<char>,

    /// The CSV file has no header row
    #[arg(short = 'H', long, alias = "no_header")]
    no_header: bool,

    /// The output format to use when writing to the output file: csv, plaintext, json
    /// [default: csv]
    #[arg(short = 'O', long, value_name = "FORMAT", alias = "output_format")]
    output_format: Option<OutputFormat>,

    /// The 1-based column index for the actual/ground truth labels [default: 1]
    #[arg(short, long, value_name = "COL")]
    actual: Option<usize>,

    /// The prefix for the labels in the 'actual' labels column [default: "a: "]
    #[arg(short = 'A', long, value_name = "PREFIX", alias = "actual_prefix")]
    actual_prefix: Option<String>,

    /// The 1-based column index for the predicted labels [default: 2]
    #[arg(short, long, value_name = "COL")]
    predicted: Option<usize>,

    /// The prefix for the labels in the 'predicted' labels row [default: "p: "]
    #[arg(short = 'P', long, value_name = "PREFIX", alias = "predicted_prefix")]
    predicted_prefix: Option<String>,

    /// The 1-based column index for the weight (0-1) of the predicted label
    #[arg(short, long, value_name = "COL")]
    weight: Option<usize>,

    /// Comma-separated list of predefined labels to use (eg if not all labels are present in
    /// the file)
    #[arg(short, long, value_name = "LABELS")]
    labels: Option<String>,

    /// The text to print in the top-left corner [default: x]
    #[arg(short = 'C', long, value_name = "CORNER")]
    corner: Option<String>,

    /// The maximum number of decimals for float values like percentages, -1 for no limit
    /// [default: 3]
    #[arg(
        short = 'D',
        long,
        value_name = "NUM",
        allow_negative_numbers = true,
        alias = "max_decimals"
    )]
    max_decimals: Option<i32>,

    /// The type of matrix to generate: counts, percentages, percentages_per_row [default: counts]
    #[arg(short = 't', long, value_name = "TYPE", alias = "matrix_type")]
    matrix_type: Option<MatrixType>,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layers the explicit flags over the config file (or the defaults).
    fn resolve_config(&self) -> anyhow::Result<GenerateConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut file = File::open(path)
                    .with_context(|| format!("failed to open config file {}", path.display()))?;
                GenerateConfig::load_from_file(&mut file)
                    .with_context(|| format!("failed to load config file {}", path.display()))?
            }
            None => GenerateConfig::default(),
        };

        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(quotechar) = self.quotechar {
            config.quotechar = quotechar;
        }
        if self.no_header {
            config.header = false;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(col) = self.actual {
            config.col_actual = col;
        }
        if let Some(col) = self.predicted {
            config.col_predicted = col;
        }
        if let Some(col) = self.weight {
            config.col_weight = Some(col);
        }
        if let Some(prefix) = &self.actual_prefix {
            config.prefix_actual = prefix.clone();
        }
        if let Some(prefix) = &self.predicted_prefix {
            config.prefix_predicted = prefix.clone();
        }
        if let Some(labels) = &self.labels {
            config.labels = Some(dataset::parse_labels(labels));
        }
        if let Some(corner) = &self.corner {
            config.corner = corner.clone();
        }
        if let Some(decimals) = self.max_decimals {
            config.max_decimals = decimals;
        }
        if let Some(matrix_type) = self.matrix_type {
            config.matrix_type = matrix_type;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    if cli.dump_config {
        config.save_to_file(&mut std::io::stdout())?;
        println!();
        return Ok(());
    }

    let input = cli.input.as_deref().context("no input file given")?;
    let dialect = config.dialect()?;
    let observations = dataset::load(input, config.columns(), &dialect, config.header)
        .with_context(|| format!("failed to load {}", input.display()))?;
    if observations.is_empty() {
        warn!(path = %input.display(), "no observations found");
    }

    let mut matrix = ConfusionMatrix::new(
        observations.actual,
        observations.predicted,
        observations.weight,
    )?
    .with_actual_prefix(config.prefix_actual.as_str())
    .with_predicted_prefix(config.prefix_predicted.as_str())
    .with_corner(config.corner.as_str());
    if let Some(labels) = &config.labels {
        matrix = matrix.with_labels(LabelIndex::new(labels));
    }

    let result = matrix.generate(config.matrix_type, config.decimals())?;
    info!(labels = matrix.labels().len(), matrix_type = %config.matrix_type, "generated matrix");

    output::write(&result, cli.output.as_deref(), config.output_format, &dialect)
        .context("failed to write matrix")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version print to stdout and exit 0
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
