use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::prelude::SmallRng;

use gnest::config::NestConfig;
use gnest::io::cli::Cli;
use gnest::io::output::NestOutput;
use gnest::io::svg_export::bin_to_svg;
use gnest::session::NestSession;
use gnest::{EPOCH, io};
use polynest::io::export::export_solution;
use polynest::io::import::import_instance;

fn main() -> Result<()> {
    let args = Cli::parse();
    io::init_logger(args.log_level)?;

    let mut config = match args.config_file {
        None => {
            warn!("[MAIN] No config file provided, use --config-file to provide a custom config");
            NestConfig::default()
        }
        Some(config_file) => {
            let file = File::open(config_file)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).context("incorrect config file format")?
        }
    };
    if let Some(n) = args.generations {
        config.n_generations = n;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if args.workers.is_some() {
        config.n_workers = args.workers;
    }
    info!("[MAIN] Successfully parsed NestConfig: {config:?}");

    let input_stem = args
        .input_file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("input file has no usable name")?
        .to_owned();

    if !args.solution_folder.exists() {
        fs::create_dir_all(&args.solution_folder)
            .with_context(|| format!("could not create solution folder: {:?}", args.solution_folder))?;
    }

    let ext_instance = io::read_json_instance(args.input_file.as_path())?;
    let instance = import_instance(&ext_instance, config.curve_tolerance)?;

    let rng = match config.prng_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let mut session = NestSession::new(config, rng).with_progress(|p| debug!("[MAIN] batch progress {:.0}%", p * 100.0));
    session.start(instance.clone())?;
    session.run(config.n_generations)?;
    let generations = session.generation();
    session.stop();

    let Some(best) = session.best() else {
        warn!("[MAIN] no placement was evaluated, nothing to write");
        return Ok(());
    };

    let output = NestOutput {
        instance: ext_instance,
        solution: export_solution(&best.placement, &instance),
        config,
        generations,
        run_time_sec: EPOCH.elapsed().as_secs(),
    };
    let solution_path = args.solution_folder.join(format!("sol_{input_stem}.json"));
    io::write_json(&output, Path::new(&solution_path))?;

    for i in 0..best.placement.bins.len() {
        let title = format!("{input_stem} | gen {}", best.generation);
        if let Some(svg) = bin_to_svg(&instance, &best.placement, i, config.svg_draw_options, &title) {
            let svg_path = args.solution_folder.join(format!("sol_{input_stem}_{i}.svg"));
            io::write_svg(&svg, Path::new(&svg_path))?;
        }
    }

    Ok(())
}
