use itertools::Itertools;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand::prelude::SmallRng;
use rand::seq::SliceRandom;

use polynest::cache::to_rotation_angle;
use polynest::geometry::geo_traits::Shape;
use polynest::geometry::{BoundRect, Polygon};

use crate::ga::Phenotype;

/// Crossover cut points are drawn from this fraction range of the ordering
const CUT_RANGE: (f64, f64) = (0.1, 0.9);

#[derive(Debug, Clone, Copy)]
pub struct GaConfig {
    pub population_size: usize,
    /// Chance in percent that a gene is swapped, and independently that it is rotated
    pub mutation_rate: u32,
    pub rotations: u32,
}

/// Part shapes the optimizer needs to choose feasible rotations.
#[derive(Debug, Clone)]
pub struct GaPart {
    pub polygon: Polygon,
    pub area: f64,
}

/// Genetic search over part orders and rotations with single elitism.
///
/// Phenotypes are handed out one at a time with [`GeneticAlgorithm::next_unevaluated`]. Once every member
/// of the population carries a fitness, the next call breeds a new generation.
pub struct GeneticAlgorithm {
    population: Vec<Phenotype>,
    parts: Vec<GaPart>,
    bin_bounds: BoundRect,
    config: GaConfig,
    /// SmallRng is a fast, non-cryptographic PRNG <https://rust-random.github.io/book/guide-rngs.html>
    rng: SmallRng,
    generation: usize,
}

impl GeneticAlgorithm {
    /// Seeds the population with parts ordered by descending area and random rotations, plus mutants of it.
    pub fn new(parts: Vec<GaPart>, bin_bounds: BoundRect, mut config: GaConfig, rng: SmallRng) -> Self {
        if config.population_size < 2 {
            warn!(
                "[GA] population size {} leaves nothing to breed, using 2",
                config.population_size
            );
            config.population_size = 2;
        }
        let mut ga = GeneticAlgorithm {
            population: vec![],
            parts,
            bin_bounds,
            config,
            rng,
            generation: 0,
        };

        let placement = (0..ga.parts.len())
            .sorted_by_key(|&i| std::cmp::Reverse(OrderedFloat(ga.parts[i].area)))
            .collect_vec();
        let rotation = placement.iter().map(|&p| ga.random_angle(p)).collect_vec();
        let adam = Phenotype::new(placement, rotation);

        ga.population.push(adam.clone());
        while ga.population.len() < ga.config.population_size {
            let mutant = ga.mutate(adam.clone());
            ga.population.push(mutant);
        }
        ga
    }

    pub fn population(&self) -> &[Phenotype] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn phenotype(&self, idx: usize) -> Option<&Phenotype> {
        self.population.get(idx)
    }

    /// Index of the next phenotype without fitness, breeding a new generation when all are evaluated.
    pub fn next_unevaluated(&mut self) -> usize {
        if let Some(idx) = self.population.iter().position(|p| !p.is_evaluated()) {
            return idx;
        }
        self.breed();
        // the elite is the only evaluated member of a fresh generation
        self.population.iter().position(|p| !p.is_evaluated()).unwrap_or(1)
    }

    pub fn set_fitness(&mut self, idx: usize, fitness: f64) {
        if let Some(p) = self.population.get_mut(idx) {
            p.fitness = Some(fitness);
        }
    }

    /// Best evaluated phenotype of the current population.
    pub fn best(&self) -> Option<&Phenotype> {
        self.population
            .iter()
            .filter_map(|p| p.fitness.map(|f| (OrderedFloat(f), p)))
            .min_by_key(|(f, _)| *f)
            .map(|(_, p)| p)
    }

    /// Replaces the population: the best phenotype survives, the rest are mutated offspring
    /// of fitness-weighted parents.
    pub fn breed(&mut self) {
        self.population
            .sort_by_key(|p| OrderedFloat(p.fitness.unwrap_or(f64::INFINITY)));
        let size = self.population.len();

        let mut next = vec![self.population[0].clone()];
        while next.len() < size {
            let male = self.weighted_index(None);
            let female = self.weighted_index(Some(male));
            let (c1, c2) = self.mate(male, female);
            let c1 = self.mutate(c1);
            next.push(c1);
            if next.len() < size {
                let c2 = self.mutate(c2);
                next.push(c2);
            }
        }
        self.population = next;
        self.generation += 1;
        info!(
            "[GA] generation {} bred, elite fitness {:.4}",
            self.generation,
            self.population[0].fitness.unwrap_or(f64::NAN)
        );
    }

    /// Samples an index of the sorted population, weights decreasing linearly from the front.
    fn weighted_index(&mut self, exclude: Option<usize>) -> usize {
        let candidates = (0..self.population.len())
            .filter(|&i| Some(i) != exclude)
            .collect_vec();
        let n = candidates.len() as f64;
        let r: f64 = self.rng.random();

        let weight = 1.0 / n;
        let mut lower = 0.0;
        let mut upper = weight;
        for (k, &i) in candidates.iter().enumerate() {
            if r > lower && r < upper {
                return i;
            }
            lower = upper;
            upper += 2.0 * weight * ((n - k as f64) / n);
        }
        candidates[0]
    }

    /// Single point crossover. Each child keeps the head of one parent and takes the remaining parts
    /// in the order of the other.
    fn mate(&mut self, male: usize, female: usize) -> (Phenotype, Phenotype) {
        let (m, f) = (&self.population[male], &self.population[female]);
        if m.len() < 2 {
            return (Phenotype::new(m.placement.clone(), m.rotation.clone()), Phenotype::new(f.placement.clone(), f.rotation.clone()));
        }
        let frac = self.rng.random::<f64>().clamp(CUT_RANGE.0, CUT_RANGE.1);
        let cut = (frac * (m.len() - 1) as f64).round() as usize;
        (splice(m, f, cut), splice(f, m, cut))
    }

    fn mutate(&mut self, mut p: Phenotype) -> Phenotype {
        let rate = 0.01 * self.config.mutation_rate as f64;
        for i in 0..p.len() {
            if self.rng.random::<f64>() < rate && i + 1 < p.len() {
                p.placement.swap(i, i + 1);
                p.rotation.swap(i, i + 1);
            }
            if self.rng.random::<f64>() < rate {
                p.rotation[i] = self.random_angle(p.placement[i]);
            }
        }
        p.fitness = None;
        p
    }

    /// Random allowed rotation under which the part still fits the bin's bounding box, 0 if none does.
    fn random_angle(&mut self, part: usize) -> f64 {
        let rotations = self.config.rotations.max(1);
        let mut buckets = (0..rotations).collect_vec();
        buckets.shuffle(&mut self.rng);

        let polygon = &self.parts[part].polygon;
        let fits = |angle: f64| {
            let b = polygon.rotated(angle).bound_rect();
            b.width < self.bin_bounds.width && b.height < self.bin_bounds.height
        };
        match buckets.into_iter().map(|b| to_rotation_angle(b, rotations)).find(|&a| fits(a)) {
            Some(angle) => angle,
            None => {
                debug!("[GA] part {part} exceeds the bin under every rotation");
                0.0
            }
        }
    }
}

fn splice(head: &Phenotype, tail: &Phenotype, cut: usize) -> Phenotype {
    let mut placement = head.placement[..cut].to_vec();
    let mut rotation = head.rotation[..cut].to_vec();
    for (part, angle) in tail.genes() {
        if !placement.contains(&part) {
            placement.push(part);
            rotation.push(angle);
        }
    }
    Phenotype::new(placement, rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn parts(n: usize) -> Vec<GaPart> {
        (0..n)
            .map(|i| {
                let size = 5.0 + i as f64;
                GaPart {
                    polygon: Polygon::rectangle(0.0, 0.0, size, 2.0 * size),
                    area: 2.0 * size * size,
                }
            })
            .collect()
    }

    fn ga(n_parts: usize, population_size: usize, seed: u64) -> GeneticAlgorithm {
        GeneticAlgorithm::new(
            parts(n_parts),
            BoundRect::new(0.0, 0.0, 100.0, 100.0),
            GaConfig {
                population_size,
                mutation_rate: 30,
                rotations: 4,
            },
            SmallRng::seed_from_u64(seed),
        )
    }

    fn is_permutation(p: &Phenotype, n: usize) -> bool {
        p.placement.iter().copied().sorted().eq(0..n) && p.rotation.len() == n
    }

    #[test]
    fn adam_orders_by_descending_area() {
        let ga = ga(5, 10, 0);
        assert_eq!(ga.population().len(), 10);
        assert_eq!(ga.population()[0].placement, vec![4, 3, 2, 1, 0]);
        assert!(ga.population().iter().all(|p| is_permutation(p, 5)));
        assert!(
            ga.population()
                .iter()
                .flat_map(|p| &p.rotation)
                .all(|r| [0.0, 90.0, 180.0, 270.0].contains(r))
        );
    }

    #[test]
    fn offspring_are_permutations() {
        let mut ga = ga(8, 12, 3);
        for _ in 0..5 {
            for i in 0..ga.population().len() {
                ga.set_fitness(i, i as f64);
            }
            ga.breed();
            assert_eq!(ga.population().len(), 12);
            assert!(ga.population().iter().all(|p| is_permutation(p, 8)));
        }
    }

    #[test]
    fn hands_out_every_phenotype_before_breeding() {
        let mut ga = ga(4, 6, 1);
        for expected in 0..6 {
            let idx = ga.next_unevaluated();
            assert_eq!(idx, expected);
            ga.set_fitness(idx, 10.0 - idx as f64);
        }
        assert_eq!(ga.generation(), 0);
        let idx = ga.next_unevaluated();
        assert_eq!(ga.generation(), 1);
        assert_eq!(idx, 1);
        assert_eq!(ga.population()[0].fitness, Some(5.0));
    }

    #[test]
    fn single_part_only_mutates() {
        let mut ga = ga(1, 4, 2);
        for i in 0..4 {
            ga.set_fitness(i, 1.0);
        }
        ga.breed();
        assert!(ga.population().iter().all(|p| p.placement == vec![0]));
    }

    #[test]
    fn oversized_parts_keep_rotation_zero() {
        let mut ga = GeneticAlgorithm::new(
            vec![GaPart {
                polygon: Polygon::rectangle(0.0, 0.0, 50.0, 50.0),
                area: 2500.0,
            }],
            BoundRect::new(0.0, 0.0, 10.0, 10.0),
            GaConfig {
                population_size: 3,
                mutation_rate: 100,
                rotations: 4,
            },
            SmallRng::seed_from_u64(7),
        );
        assert!(ga.population().iter().all(|p| p.rotation == vec![0.0]));
        assert_eq!(ga.random_angle(0), 0.0);
    }
}
