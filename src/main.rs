//! Tile Evolver CLI - Run a map search from JSON configuration.

use std::path::PathBuf;

use tile_evolver::{
    compute::{Tile, evolution::EvolutionEngine},
    schema::EvolutionConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [seed]", args[0]);
        eprintln!();
        eprintln!("Evolve a tile map from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  seed         Random seed overriding the config (optional)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let mut config = EvolutionConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    if let Some(seed) = args.get(2) {
        config.random_seed = Some(seed.parse().unwrap_or_else(|e| {
            eprintln!("Invalid seed '{}': {}", seed, e);
            std::process::exit(1);
        }));
    }

    println!("Tile Evolver");
    println!("============");
    println!(
        "Map: {}x{} (kernel {})",
        config.map.width, config.map.height, config.map.kernel_size
    );
    println!(
        "Population: {}, generations: {}, time limit: {}s",
        config.algorithm.population_size,
        config.stop.max_generations,
        config.stop.time_limit_seconds
    );
    println!("Methods: {:?}", config.methods);
    println!();

    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let result = engine.run_with_callback(|progress| {
        println!(
            "  Generation {}/{}: best={:.3}, avg={:.3}, {:.1}s",
            progress.generation + 1,
            progress.total_generations,
            progress.generation_best,
            progress.avg_fitness,
            progress.elapsed_seconds
        );
    });

    println!();
    println!("Best map (fitness {:.3}):", result.best_fitness);
    print!("{}", result.best_grid);
    println!();
    println!("Legend:");
    for tile in Tile::ALL {
        println!("  {} = {}", tile.code(), tile.description());
    }
    println!();
    println!(
        "Stopped: {:?} after {} generations",
        result.stats.stop_reason, result.stats.generations
    );
    println!(
        "Time: {:.2}s ({:.1} evaluations/s)",
        result.stats.elapsed_seconds, result.stats.evaluations_per_second
    );
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
