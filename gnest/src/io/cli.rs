use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::Backend;

/// Nests the parts of a JSON instance into its bin and writes the best placement found
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON instance with a bin and its parts
    #[arg(short, long, value_name = "FILE")]
    pub input_file: PathBuf,
    /// Folder receiving the JSON solution and one SVG per bin
    #[arg(short, long, value_name = "FOLDER")]
    pub solution_folder: PathBuf,
    #[arg(short, long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
    /// Overrides the number of generations of the config
    #[arg(short = 'g', long, value_name = "N")]
    pub generations: Option<usize>,
    /// Overrides the worker backend of the config
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,
    /// Overrides the number of workers of the config
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,
    #[arg(
        short,
        long,
        value_name = "[off, error, warn, info, debug, trace]",
        default_value = "info"
    )]
    pub log_level: LevelFilter,
}
