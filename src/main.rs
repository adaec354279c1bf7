//! pcm-compare entry point: CLI wiring and config-driven pipeline run.

use std::process;

use clap::Parser;
use tracing::info;

use pcm_compare::cli::Cli;
use pcm_compare::config::AnalysisConfig;
use pcm_compare::io::export::{ChartOptions, export_report};
use pcm_compare::logging;
use pcm_compare::palette::Palette;
use pcm_compare::pipeline::{load_inputs, run};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // --config takes priority over the built-in defaults
    let mut config = match &cli.config {
        Some(path) => match AnalysisConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => AnalysisConfig::default(),
    };
    cli.apply_overrides(&mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let report = match load_inputs(&config).and_then(|inputs| run(&inputs, &config)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("{report}");

    let charts = config.output.charts.then(|| ChartOptions {
        palette: Palette::new(config.output.palette_seed),
        width: config.output.width,
        height: config.output.height,
    });
    match export_report(&report, &config.output.dir, charts) {
        Ok(files) => info!(count = files.len(), "outputs written"),
        Err(e) => {
            eprintln!("error: failed to write outputs: {e}");
            process::exit(1);
        }
    }
    eprintln!("Outputs written to {}", config.output.dir.display());
}
