use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::AnalysisConfig;

/// Command-line arguments of `pcm-compare`.
#[derive(Parser, Debug)]
#[command(
    name = "pcm-compare",
    about = "Compare Plexos and Sienna production-cost-model results",
    version
)]
pub struct Cli {
    /// TOML analysis configuration. Built-in defaults are used when omitted.
    #[arg(long, short = 'c', env = "PCM_COMPARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving charts and report files.
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// First timestamp of the generation comparison window.
    #[arg(long)]
    pub start: Option<String>,

    /// Last timestamp of the generation comparison window.
    #[arg(long)]
    pub end: Option<String>,

    /// Skip chart rendering.
    #[arg(long)]
    pub no_charts: bool,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(start) = &self.start {
            config.window.start = start.clone();
        }
        if let Some(end) = &self.end {
            config.window.end = end.clone();
        }
        if self.no_charts {
            config.output.charts = false;
        }
    }
}
