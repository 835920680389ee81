use std::fs::File;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use metk::analysis::max_correlation::{DEFAULT_RELATIVE_ERROR, DEFAULT_TRIALS};
use metk::analysis::plots::draw_plots;
use metk::analysis::report::compute_metrics;
use metk::config::{PlotFormat, PlotOptions, ReportOptions};
use metk::data_handling::paired_dataset::PairedCsvDataset;
use metk::data_handling::Dataset;
use metk::helper_functions::ensure_prefix_dir;
use metk::models::{CorrelationMethod, Unit};

const EXAMPLES: &str = "\
Examples:
  metk --in affinities.csv --prefix results/run1
  metk --in affinities.csv --prefix results/run1 --units nM --format png
  metk --in ki_values.csv --prefix results/run2 --input-units nM --units nM
  metk --in affinities.csv --prefix results/run3 --seed 42 --trials 5000 --json";

/// Agreement statistics and plots for predicted vs experimental binding affinities.
#[derive(Parser, Debug)]
#[command(name = "metk", version, after_help = EXAMPLES)]
struct Cli {
    /// Input CSV with "Pred" and "Exp" columns in kcal/mol
    #[arg(long = "in", value_name = "INFILE_NAME", required_unless_present = "example")]
    input: Option<String>,

    /// Prefix for output file names
    #[arg(long, value_name = "OUTFILE_PREFIX", required_unless_present = "example")]
    prefix: Option<String>,

    /// Units to display on the IC50 page (uM or nM)
    #[arg(long, value_name = "UNIT_NAME", default_value = "uM")]
    units: String,

    /// Read "Pred"/"Exp" as Ki or IC50 in this unit instead of kcal/mol
    #[arg(long, value_name = "UNIT_NAME")]
    input_units: Option<String>,

    /// Relative experimental error used by the max-correlation simulation
    #[arg(long = "error", default_value_t = DEFAULT_RELATIVE_ERROR)]
    relative_error: f64,

    /// Number of simulation trials
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Seed for a reproducible simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Correlation used by the max-correlation simulation
    #[arg(long, value_enum, default_value_t = CorrelationMethod::Pearson)]
    method: CorrelationMethod,

    /// Also write each plot page as a PNG or SVG image
    #[arg(long, value_enum)]
    format: Option<PlotFormat>,

    /// Also write the metrics as <prefix>.json
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Show example command lines
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.example {
        println!("{EXAMPLES}");
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let (Some(input), Some(prefix)) = (cli.input.as_deref(), cli.prefix.as_deref()) else {
        anyhow::bail!("--in and --prefix are required");
    };

    // Validate everything user-supplied before any file is written
    let units: Unit = cli.units.parse()?;
    let input_units = cli
        .input_units
        .as_deref()
        .map(str::parse::<Unit>)
        .transpose()?;

    let report_options = ReportOptions {
        relative_error: cli.relative_error,
        trials: cli.trials,
        method: cli.method,
        seed: cli.seed,
        ..ReportOptions::default()
    };
    let plot_options = PlotOptions {
        units,
        extra_format: cli.format,
    };

    info!("Starting model evaluation for {}", input);
    let samples = PairedCsvDataset {
        path: input.to_string(),
        input_units,
    }
    .load_validated()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let summary = compute_metrics(&samples, &report_options, &mut rng)?;
    let report_str = summary.report_lines().join("\n");

    ensure_prefix_dir(prefix)?;
    let plot_paths = draw_plots(&samples, prefix, &plot_options)?;

    println!("{report_str}");
    let report_file_name = format!("{prefix}.txt");
    std::fs::write(&report_file_name, format!("{report_str}\n"))
        .with_context(|| format!("failed to write {report_file_name}"))?;

    if cli.json {
        let json_file_name = format!("{prefix}.json");
        let file = File::create(&json_file_name)
            .with_context(|| format!("failed to create {json_file_name}"))?;
        serde_json::to_writer_pretty(file, &summary)?;
        println!("Metrics written to {json_file_name}");
    }

    println!("Report written to {report_file_name}");
    let plot_names: Vec<String> = plot_paths.iter().map(|p| p.display().to_string()).collect();
    println!("Plots written to {}", plot_names.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metk::analysis::report::metk_report;
    use metk::models::PairedSamples;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["metk", "--in", "data.csv", "--prefix", "out/run"]).unwrap();
        assert_eq!(cli.units, "uM");
        assert_eq!(cli.trials, DEFAULT_TRIALS);
        assert_eq!(cli.relative_error, DEFAULT_RELATIVE_ERROR);
        assert_eq!(cli.method, CorrelationMethod::Pearson);
        assert!(cli.format.is_none());
        assert!(cli.seed.is_none());
    }

    #[test]
    fn cli_requires_input_unless_example() {
        assert!(Cli::try_parse_from(["metk", "--prefix", "out"]).is_err());
        assert!(Cli::try_parse_from(["metk", "--example"]).is_ok());
    }

    #[test]
    fn unsupported_unit_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("run");
        let cli = Cli::try_parse_from([
            "metk",
            "--in",
            "does-not-matter.csv",
            "--prefix",
            prefix.to_str().unwrap(),
            "--units",
            "mM",
        ])
        .unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("mM"), "{err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_column_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "Pred,Measured\n-9.0,-9.1\n-8.0,-8.3\n").unwrap();
        let prefix = dir.path().join("run");
        let cli = Cli::try_parse_from([
            "metk",
            "--in",
            input.to_str().unwrap(),
            "--prefix",
            prefix.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("\"Exp\""), "{err}");
        assert!(!dir.path().join("run.txt").exists());
    }

    #[test]
    fn writes_report_and_figure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "Pred,Exp\n-10,-10.5\n-9,-9.2\n-8,-7.8\n-7,-7.1\n").unwrap();
        let prefix = dir.path().join("out/run");
        let cli = Cli::try_parse_from([
            "metk",
            "--in",
            input.to_str().unwrap(),
            "--prefix",
            prefix.to_str().unwrap(),
            "--seed",
            "1",
            "--trials",
            "50",
        ])
        .unwrap();
        run(&cli).unwrap();

        let samples =
            PairedSamples::new(vec![-10.0, -9.0, -8.0, -7.0], vec![-10.5, -9.2, -7.8, -7.1]).unwrap();
        let options = ReportOptions {
            trials: 50,
            seed: Some(1),
            ..ReportOptions::default()
        };
        let expected = metk_report(&samples, &options, &mut StdRng::seed_from_u64(1)).unwrap();

        let written = std::fs::read_to_string(dir.path().join("out/run.txt")).unwrap();
        assert_eq!(written.lines().collect::<Vec<_>>(), expected);
        assert!(dir.path().join("out/run.pdf").is_file());
        assert!(!dir.path().join("out/run.json").exists());
    }
}
