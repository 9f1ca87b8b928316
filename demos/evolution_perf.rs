//! Quick evolution performance test

use std::time::Instant;

use tile_evolver::{
    EvolutionConfig, EvolutionEngine,
    schema::{AlgorithmParameters, MapParameters, StopConditionParameters},
};

fn main() {
    println!("=== Evolution Performance Test ===\n");

    // Test different map sizes
    for map_size in [10, 20, 40] {
        println!("Map size: {}x{}", map_size, map_size);

        let config = EvolutionConfig {
            map: MapParameters::new(map_size, map_size, 3).unwrap(),
            stop: StopConditionParameters::new(10, 60).unwrap(),
            algorithm: AlgorithmParameters::new(100, 0.2, 2, 0.05).unwrap(),
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let mut engine = EvolutionEngine::new(config).unwrap();
        let result = engine.run();
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.4}", result.stats.best_fitness);
        println!();
    }

    println!("=== Scalability Test (fixed 20x20 map) ===\n");

    // Test different population sizes
    for pop_size in [50, 100, 200, 400] {
        let config = EvolutionConfig {
            map: MapParameters::new(20, 20, 3).unwrap(),
            stop: StopConditionParameters::new(5, 60).unwrap(),
            algorithm: AlgorithmParameters::new(pop_size, 0.2, 2, 0.05).unwrap(),
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let mut engine = EvolutionEngine::new(config).unwrap();
        let result = engine.run();
        let elapsed = start.elapsed();

        println!(
            "  Pop {:>3}: {:.2}s, {:.1} evals/s, best {:.4}",
            pop_size,
            elapsed.as_secs_f64(),
            result.stats.total_evaluations as f64 / elapsed.as_secs_f64(),
            result.stats.best_fitness
        );
    }
}
