#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use rand::SeedableRng;
    use rand::prelude::SmallRng;
    use test_case::test_case;

    use gnest::config::{Backend, NestConfig};
    use gnest::ga::{GaConfig, GaPart, GeneticAlgorithm};
    use gnest::session::NestSession;
    use polynest::geometry::{BoundRect, Polygon};
    use polynest::io::export::export_solution;
    use polynest::io::ext_repr::{ExtInstance, ExtPart, ExtPolygon};
    use polynest::io::import::{Instance, import_instance};

    fn init_logger() {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .is_test(true)
            .try_init();
    }

    fn square(size: f64) -> ExtPolygon {
        ExtPolygon(vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)])
    }

    fn instance(bin: f64, parts: &[(f64, usize)]) -> anyhow::Result<Instance> {
        let ext = ExtInstance {
            name: "squares".into(),
            bin: square(bin),
            parts: parts
                .iter()
                .map(|&(size, quantity)| ExtPart {
                    id: None,
                    quantity,
                    outer: square(size),
                    holes: vec![],
                })
                .collect(),
        };
        Ok(import_instance(&ext, 0.3)?)
    }

    fn config(backend: Backend, rotations: u32) -> NestConfig {
        NestConfig {
            rotations,
            backend,
            n_workers: Some(2),
            prng_seed: Some(0),
            ..NestConfig::default()
        }
    }

    #[test_case(Backend::Pool; "pool")]
    #[test_case(Backend::Dedicated; "dedicated")]
    fn two_squares_fit_one_bin(backend: Backend) -> anyhow::Result<()> {
        init_logger();
        let instance = instance(100.0, &[(40.0, 2)])?;
        let mut session = NestSession::new(config(backend, 1), SmallRng::seed_from_u64(0));
        session.start(instance.clone())?;
        let best = session.run(2)?.cloned().ok_or_else(|| anyhow::anyhow!("no result"))?;
        session.stop();

        assert_eq!(best.placement.placed_count, 2);
        assert_eq!(best.placement.total_count, 2);
        assert_eq!(best.placement.bins.len(), 1);
        assert!(best.efficiency >= 0.32 - 1e-9);

        let solution = export_solution(&best.placement, &instance);
        assert_eq!(solution.placed, 2);
        assert!(solution.bins[0].placements.iter().all(|p| p.part == 0 && p.rotation == 0.0));
        Ok(())
    }

    #[test]
    fn oversized_part_is_never_placed() -> anyhow::Result<()> {
        init_logger();
        let instance = instance(10.0, &[(20.0, 1)])?;
        let mut session = NestSession::new(config(Backend::Pool, 4), SmallRng::seed_from_u64(1));
        session.start(instance)?;
        for _ in 0..25 {
            if let Some(result) = session.step()? {
                assert_eq!(result.placement.placed_count, 0);
            }
        }
        let best = session.best().ok_or_else(|| anyhow::anyhow!("no result"))?;
        assert_eq!(best.placement.placed_count, 0);
        assert!(!best.placement.has_result());
        // the unplaced penalty keeps the fitness away from the single bin regime
        assert!(best.placement.fitness >= 2.0);
        Ok(())
    }

    #[test]
    fn part_collapsing_under_spacing_counts_as_unplaced() -> anyhow::Result<()> {
        init_logger();
        // the 1 × 1 hole of part 1 vanishes when shrunk by half the spacing
        let ext = ExtInstance {
            name: "collapsing_hole".into(),
            bin: square(100.0),
            parts: vec![
                ExtPart {
                    id: Some(0),
                    quantity: 1,
                    outer: square(30.0),
                    holes: vec![],
                },
                ExtPart {
                    id: Some(1),
                    quantity: 1,
                    outer: square(20.0),
                    holes: vec![ExtPolygon(vec![(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0)])],
                },
            ],
        };
        let instance = import_instance(&ext, 0.3)?;
        let config = NestConfig {
            spacing: 4.0,
            ..config(Backend::Pool, 1)
        };
        let mut session = NestSession::new(config, SmallRng::seed_from_u64(3));
        session.start(instance.clone())?;
        let best = session.run(1)?.cloned().ok_or_else(|| anyhow::anyhow!("no result"))?;
        session.stop();

        assert_eq!(best.placement.total_count, 2);
        assert_eq!(best.placement.placed_count, 1);
        assert!(best.placement.fitness >= 2.0);
        let solution = export_solution(&best.placement, &instance);
        assert_eq!((solution.placed, solution.total), (1, 2));
        assert!(solution.bins.iter().flat_map(|b| &b.placements).all(|p| p.part == 0));
        Ok(())
    }

    #[test]
    fn seeded_runs_agree_across_backends() -> anyhow::Result<()> {
        let instance = instance(100.0, &[(30.0, 3), (20.0, 2)])?;
        let mut results = vec![];
        for backend in [Backend::Pool, Backend::Dedicated] {
            let mut session = NestSession::new(config(backend, 4), SmallRng::seed_from_u64(7));
            session.start(instance.clone())?;
            session.run(1)?;
            let best = session.best().ok_or_else(|| anyhow::anyhow!("no result"))?;
            results.push((best.placement.placed_count, best.placement.fitness));
        }
        assert_eq!(results[0].0, results[1].0);
        assert!(approx_eq!(f64, results[0].1, results[1].1, epsilon = 1e-9));
        Ok(())
    }

    #[test]
    fn invalid_sessions_are_rejected() -> anyhow::Result<()> {
        let mut idle = NestSession::new(NestConfig::default(), SmallRng::seed_from_u64(0));
        assert!(idle.step().is_err());

        let mut session = NestSession::new(config(Backend::Pool, 0), SmallRng::seed_from_u64(0));
        assert!(session.start(instance(100.0, &[(10.0, 1)])?).is_err());

        let mut session = NestSession::new(config(Backend::Pool, 4), SmallRng::seed_from_u64(0));
        session.start(instance(100.0, &[(10.0, 1)])?)?;
        session.stop();
        assert!(!session.is_running());
        assert!(session.step().is_err());
        Ok(())
    }

    #[test_case(0; "seed_0")]
    #[test_case(42; "seed_42")]
    fn elite_never_regresses(seed: u64) {
        let parts = (0..6)
            .map(|i| {
                let size = 4.0 + i as f64;
                GaPart {
                    polygon: Polygon::rectangle(0.0, 0.0, size, size),
                    area: size * size,
                }
            })
            .collect();
        let mut ga = GeneticAlgorithm::new(
            parts,
            BoundRect::new(0.0, 0.0, 50.0, 50.0),
            GaConfig {
                population_size: 8,
                mutation_rate: 20,
                rotations: 4,
            },
            SmallRng::seed_from_u64(seed),
        );

        // fitness: how far the order is from ascending part index
        let score = |placement: &[usize]| placement.iter().enumerate().map(|(i, &p)| i.abs_diff(p)).sum::<usize>() as f64;

        let mut best_so_far = f64::INFINITY;
        for _ in 0..10 {
            for i in 0..ga.population().len() {
                if ga.population()[i].fitness.is_none() {
                    let f = score(ga.population()[i].placement.as_slice());
                    ga.set_fitness(i, f);
                }
            }
            let generation_best = ga.best().and_then(|p| p.fitness).unwrap();
            assert!(generation_best <= best_so_far);
            best_so_far = generation_best;

            ga.breed();
            assert_eq!(ga.population()[0].fitness, Some(generation_best));
        }
    }
}
