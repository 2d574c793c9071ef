use serde::{Deserialize, Serialize};

use polynest::util::PackedConfig;

use crate::io::svg_export::SvgDrawOptions;

/// Configuration of a nesting run
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct NestConfig {
    /// Distance below which consecutive points are merged
    pub curve_tolerance: f64,
    /// Minimum gap between parts, and between parts and the bin edge
    pub spacing: f64,
    /// Number of allowed rotations, evenly spread over 360 degrees
    pub rotations: u32,
    pub population_size: usize,
    /// Chance in percent that a gene mutates
    pub mutation_rate: u32,
    /// Allow parts to be placed inside the holes of other parts
    pub use_holes: bool,
    /// Trace outer NFPs by orbiting, which finds the pockets of concave parts the Minkowski difference misses
    pub explore_concave: bool,
    /// Number of worker threads. Available parallelism if undefined
    pub n_workers: Option<usize>,
    pub backend: Backend,
    /// Seed for the PRNG. If undefined, the run is non-deterministic
    pub prng_seed: Option<u64>,
    /// Number of generations the CLI runs before writing its solution
    pub n_generations: usize,
    pub svg_draw_options: SvgDrawOptions,
}

/// How worker jobs are executed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Shared rayon thread pool
    #[default]
    Pool,
    /// One dedicated thread per worker, fed through a channel
    Dedicated,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            curve_tolerance: 0.3,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
            explore_concave: false,
            n_workers: None,
            backend: Backend::Pool,
            prng_seed: None,
            n_generations: 20,
            svg_draw_options: SvgDrawOptions::default(),
        }
    }
}

impl NestConfig {
    /// Options the workers need, in their bit-packed transport form.
    pub fn packed(&self) -> PackedConfig {
        PackedConfig {
            curve_tolerance: self.curve_tolerance,
            spacing: self.spacing.round().max(0.0) as u32,
            rotations: self.rotations,
            population_size: self.population_size as u32,
            mutation_rate: self.mutation_rate,
            use_holes: self.use_holes,
            explore_concave: self.explore_concave,
        }
    }

    pub fn pack(&self) -> u32 {
        self.packed().pack()
    }

    pub fn n_workers(&self) -> usize {
        self.n_workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_files() {
        let config: NestConfig = serde_json::from_str(r#"{ "spacing": 2.0, "backend": "dedicated" }"#).unwrap();
        assert_eq!(config.spacing, 2.0);
        assert_eq!(config.backend, Backend::Dedicated);
        assert_eq!(config.rotations, 4);
        assert_eq!(config.population_size, 10);
    }

    #[test]
    fn packs_core_options() {
        let config = NestConfig {
            use_holes: true,
            ..NestConfig::default()
        };
        let unpacked = PackedConfig::unpack(config.pack());
        assert_eq!(unpacked.rotations, 4);
        assert_eq!(unpacked.population_size, 10);
        assert_eq!(unpacked.mutation_rate, 10);
        assert!(unpacked.use_holes);
        assert!(!unpacked.explore_concave);
        assert_eq!(unpacked.curve_tolerance, 0.3);
    }

    #[test]
    fn worker_count_is_positive() {
        let config = NestConfig {
            n_workers: Some(0),
            ..NestConfig::default()
        };
        assert_eq!(config.n_workers(), 1);
        assert!(NestConfig::default().n_workers() >= 1);
    }
}
