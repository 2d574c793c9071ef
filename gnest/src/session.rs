use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use log::{debug, info, warn};
use rand::prelude::SmallRng;
use thousands::Separable;

use polynest::cache::{MAX_ROTATIONS, MAX_SOURCE, NfpStore};
use polynest::clipper::CLIPPER_SCALE;
use polynest::entities::{PlacementResult, PolygonNode, offset_tree};
use polynest::geometry::geo_traits::Shape;
use polynest::io::import::Instance;
use polynest::io::wire;
use polynest::nfp::PairJob;

use crate::EPOCH;
use crate::config::NestConfig;
use crate::dispatch::{Job, WorkDispatcher, spawn_counter};
use crate::ga::{GaConfig, GaPart, GeneticAlgorithm, Phenotype};

/// Best placement found so far
#[derive(Debug, Clone)]
pub struct NestResult {
    pub placement: PlacementResult,
    /// Placed part area relative to the area of the used bins
    pub efficiency: f64,
    pub generation: usize,
}

pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;
pub type ResultCallback = Box<dyn FnMut(&NestResult) + Send>;

/// Everything a nesting run owns: the optimizer, the NFP store and the workers.
///
/// A session evaluates one phenotype per [`NestSession::step`]: the missing NFPs of that phenotype are
/// computed by the workers as one batch, then a single placement job yields its fitness.
pub struct NestSession {
    config: NestConfig,
    rng: Option<SmallRng>,
    instance: Option<Instance>,
    /// Offset part copies, indexed like the genes of the phenotypes
    parts: Vec<PolygonNode>,
    /// Sources whose spacing offset failed. Their copies stay in the run but never find a place.
    unplaceable: BTreeSet<i32>,
    bin: Option<PolygonNode>,
    bin_area: f64,
    store: NfpStore,
    ga: Option<GeneticAlgorithm>,
    dispatcher: Option<WorkDispatcher>,
    best: Option<NestResult>,
    progress: Option<ProgressCallback>,
    on_result: Option<ResultCallback>,
}

impl NestSession {
    pub fn new(config: NestConfig, rng: SmallRng) -> Self {
        NestSession {
            config,
            rng: Some(rng),
            instance: None,
            parts: vec![],
            unplaceable: BTreeSet::new(),
            bin: None,
            bin_area: 0.0,
            store: NfpStore::new(),
            ga: None,
            dispatcher: None,
            best: None,
            progress: None,
            on_result: None,
        }
    }

    /// Called with the fraction of spawned jobs of the running batch.
    pub fn with_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Called whenever a better placement is found.
    pub fn with_result_callback(mut self, on_result: impl FnMut(&NestResult) + Send + 'static) -> Self {
        self.on_result = Some(Box::new(on_result));
        self
    }

    pub fn config(&self) -> &NestConfig {
        &self.config
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn best(&self) -> Option<&NestResult> {
        self.best.as_ref()
    }

    pub fn generation(&self) -> usize {
        self.ga.as_ref().map_or(0, |ga| ga.generation())
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Flag that aborts the running batch when set from another thread.
    pub fn cancel_handle(&self) -> Option<Arc<AtomicBool>> {
        self.dispatcher.as_ref().map(|d| d.cancel_handle())
    }

    /// Offsets the shapes, seeds the optimizer and starts the workers.
    pub fn start(&mut self, instance: Instance) -> Result<()> {
        ensure!(
            instance.parts.len() <= (MAX_SOURCE + 1) as usize,
            "at most {} distinct parts are supported, got {}",
            MAX_SOURCE + 1,
            instance.parts.len()
        );
        ensure!(
            (1..=MAX_ROTATIONS).contains(&self.config.rotations),
            "rotations must lie in 1..={MAX_ROTATIONS}, got {}",
            self.config.rotations
        );
        ensure!(
            instance.total_quantity() <= u16::MAX as usize,
            "too many part copies: {}",
            instance.total_quantity()
        );

        let spacing = self.config.spacing;
        let tolerance = self.config.curve_tolerance;

        let mut bin = instance.bin.clone();
        offset_tree(std::slice::from_mut(&mut bin), -0.5 * spacing, tolerance, CLIPPER_SCALE)
            .context("bin does not survive the spacing offset")?;

        let mut parts = vec![];
        let mut unplaceable = BTreeSet::new();
        for part in &instance.parts {
            let mut tree = part.tree.clone();
            if let Err(e) = offset_tree(std::slice::from_mut(&mut tree), 0.5 * spacing, tolerance, CLIPPER_SCALE) {
                warn!("[SESSION] part {} is unplaceable, spacing offset failed: {e}", part.id);
                unplaceable.insert(part.tree.source);
                tree = part.tree.clone();
            }
            parts.extend(std::iter::repeat_n(tree, part.quantity));
        }
        ensure!(!parts.is_empty(), "no part to nest");
        ensure!(
            parts.iter().any(|p| !unplaceable.contains(&p.source)),
            "no part survives the spacing offset"
        );

        let rng = match self.rng.take() {
            Some(rng) => rng,
            None => bail!("session was already started once, create a new one"),
        };
        let ga_parts = parts
            .iter()
            .map(|p| GaPart {
                polygon: p.polygon.clone(),
                area: p.polygon.area().abs(),
            })
            .collect_vec();
        let ga_config = GaConfig {
            population_size: self.config.population_size,
            mutation_rate: self.config.mutation_rate,
            rotations: self.config.rotations,
        };
        self.ga = Some(GeneticAlgorithm::new(ga_parts, bin.polygon.bound_rect(), ga_config, rng));
        self.dispatcher = Some(WorkDispatcher::new(self.config.backend, self.config.n_workers())?);

        info!(
            "[SESSION] started: {} part copies of {} parts, bin area {:.2}",
            parts.len().separate_with_commas(),
            instance.parts.len(),
            bin.polygon.area().abs()
        );
        self.bin_area = bin.polygon.area().abs();
        self.bin = Some(bin);
        self.parts = parts;
        self.unplaceable = unplaceable;
        self.instance = Some(instance);
        self.store.clean();
        self.best = None;
        Ok(())
    }

    /// Evaluates the next phenotype. Returns the new best result if it improved.
    ///
    /// A failing batch restarts the workers and surfaces the error; the population is kept.
    pub fn step(&mut self) -> Result<Option<NestResult>> {
        let (Some(ga), Some(bin)) = (self.ga.as_mut(), self.bin.as_ref()) else {
            bail!("session not started");
        };
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            bail!("session stopped");
        };

        let idx = ga.next_unevaluated();
        let generation = ga.generation();
        let phenotype = match ga.phenotype(idx) {
            Some(p) => p.clone(),
            None => bail!("phenotype {idx} out of range"),
        };
        let nodes = phenotype_nodes(&self.parts, &phenotype);

        self.store.init(nodes, bin.clone(), self.config.packed());
        for &source in &self.unplaceable {
            self.store.resolve_infeasible(source);
        }
        let pairs: Vec<PairJob> = self.store.take_pairs();
        let noop = |_: f64| {};
        let progress: &(dyn Fn(f64) + Sync) = match &self.progress {
            Some(p) => p.as_ref(),
            None => &noop,
        };

        if !pairs.is_empty() {
            debug!("[SESSION] computing {} NFPs", pairs.len());
            let bufs = pairs
                .into_iter()
                .map(|p| Job::Pair(p).encode())
                .collect::<polynest::error::Result<Vec<_>>>()?;
            let on_spawn = spawn_counter(bufs.len(), progress);
            let outputs = match dispatcher.run_encoded(bufs, &on_spawn) {
                Ok(outputs) => outputs,
                Err(e) => {
                    dispatcher.restart()?;
                    return Err(e).context("NFP batch failed");
                }
            };
            for buf in outputs {
                self.store.ingest(&buf)?;
            }
        }

        let snapshot = match self.store.snapshot(self.bin_area).context("placement job does not encode")? {
            Some(s) => s,
            None => bail!("NFP store holds no phenotype"),
        };
        let on_spawn = spawn_counter(1, progress);
        let output = match dispatcher.run_encoded(vec![snapshot], &on_spawn) {
            Ok(mut outputs) => outputs.pop().context("placement batch returned nothing")?,
            Err(e) => {
                dispatcher.restart()?;
                return Err(e).context("placement job failed");
            }
        };
        let placement = wire::decode_placement_result(&output)?;
        ga.set_fitness(idx, placement.fitness);

        let improved = self
            .best
            .as_ref()
            .is_none_or(|b| placement.fitness < b.placement.fitness);
        if !improved {
            return Ok(None);
        }

        let efficiency = self
            .instance
            .as_ref()
            .map_or(0.0, |inst| placement.efficiency(inst.bin_area()));
        let result = NestResult {
            placement,
            efficiency,
            generation,
        };
        info!(
            "[SESSION] gen {generation}: fitness {:.4}, {}/{} placed in {} bin(s), efficiency {:.1}% ({:.2}s)",
            result.placement.fitness,
            result.placement.placed_count,
            result.placement.total_count,
            result.placement.bins.len(),
            result.efficiency * 100.0,
            EPOCH.elapsed().as_secs_f64()
        );
        if let Some(cb) = self.on_result.as_mut() {
            cb(&result);
        }
        self.best = Some(result.clone());
        Ok(Some(result))
    }

    /// Steps until the optimizer has bred `n_generations` generations.
    pub fn run(&mut self, n_generations: usize) -> Result<Option<&NestResult>> {
        while self.generation() < n_generations {
            self.step()?;
        }
        Ok(self.best.as_ref())
    }

    /// Aborts any running batch and shuts the workers down. Unresolved jobs are discarded.
    pub fn stop(&mut self) {
        if let Some(d) = self.dispatcher.take() {
            d.stop();
            info!("[SESSION] stopped at generation {}", self.generation());
        }
    }
}

/// Part copies in the order of `phenotype`, each carrying its rotation.
fn phenotype_nodes(parts: &[PolygonNode], phenotype: &Phenotype) -> Vec<PolygonNode> {
    phenotype
        .genes()
        .map(|(part, rotation)| {
            let mut node = parts[part].clone();
            node.rotation = rotation;
            node
        })
        .collect()
}
