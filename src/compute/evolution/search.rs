//! Generational search loop for map evolution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::grid::{FitnessMatrix, Grid, Matrix};
use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionProgress, EvolutionResult,
    EvolutionStats, MutationMethod, ReproductionMethod, StopReason,
};

use super::fitness::FitnessEvaluator;
use super::genome::MapRng;

/// A candidate map with its cached evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// The map.
    pub grid: Grid,
    /// Fitness score.
    pub fitness: f64,
    /// Per-cell regional fitness from the last evaluation.
    pub fitness_matrix: FitnessMatrix,
}

impl Individual {
    /// Unevaluated individual.
    pub fn new(grid: Grid) -> Self {
        let fitness_matrix = Matrix::filled(grid.width(), grid.height(), 0.0);
        Self {
            grid,
            fitness: 0.0,
            fitness_matrix,
        }
    }
}

/// Index of the first individual with the highest fitness.
fn best_index(population: &[Individual]) -> usize {
    population
        .iter()
        .enumerate()
        .fold(0, |best, (i, ind)| {
            if ind.fitness > population[best].fitness {
                i
            } else {
                best
            }
        })
}

/// Mutate a child when the generation draw passes.
///
/// The operator draws against `mutation_rate` again, so a child changes
/// with probability `mutation_rate` squared.
fn mutate_child<R: Rng + ?Sized>(
    method: MutationMethod,
    child: Grid,
    mutation_rate: f64,
    kernel_size: usize,
    rng: &mut R,
) -> Grid {
    if rng.gen_bool(mutation_rate) {
        method.mutate(child, mutation_rate, kernel_size, rng)
    } else {
        child
    }
}

fn average_fitness(population: &[Individual]) -> f64 {
    if population.is_empty() {
        0.0
    } else {
        population.iter().map(|i| i.fitness).sum::<f64>() / population.len() as f64
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: MapRng,
    evaluator: FitnessEvaluator,
    population: Vec<Individual>,
    history: EvolutionHistory,
    best_individual_values: Vec<Grid>,
    generation: usize,
    best_fitness: f64,
    best_generation: usize,
    total_evaluations: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create a new evolution engine from a validated configuration.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionConfigError> {
        config.validate()?;

        let rng = MapRng::from_seed_option(config.random_seed);
        let evaluator = FitnessEvaluator::new(config.map.kernel_size, config.fitness, config.pooling);

        if config.methods.reproduction == ReproductionMethod::Elitism
            && config.algorithm.elite_count() > 0
        {
            log::warn!(
                "Elitism adds {} elites on top of {} offspring; generations after the first hold {} individuals",
                config.algorithm.elite_count(),
                config.algorithm.population_size,
                config.algorithm.elite_count() + config.algorithm.population_size
            );
        }

        Ok(Self {
            config,
            rng,
            evaluator,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            best_individual_values: Vec::new(),
            generation: 0,
            best_fitness: f64::NEG_INFINITY,
            best_generation: 0,
            total_evaluations: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Current (or final) population, in insertion order.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Best fitness of every evaluated generation.
    pub fn best_fitness_values(&self) -> &[f64] {
        &self.history.best_fitness
    }

    /// Best map of every evaluated generation.
    pub fn best_individual_values(&self) -> &[Grid] {
        &self.best_individual_values
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Generation currently being evaluated (0-based).
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Reset state and build the initial population.
    pub fn initialize(&mut self) {
        let EvolutionConfig {
            map,
            pooling,
            algorithm,
            methods,
            ..
        } = &self.config;

        self.population = methods
            .initialization
            .initialize_population(algorithm.population_size, map, pooling, &mut self.rng)
            .into_iter()
            .map(Individual::new)
            .collect();

        self.generation = 0;
        self.history = EvolutionHistory::default();
        self.best_individual_values.clear();
        self.best_fitness = f64::NEG_INFINITY;
        self.best_generation = 0;
        self.total_evaluations = 0;
    }

    /// Evaluate all individuals in the population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self) {
        let evaluator = &self.evaluator;

        // Parallel evaluation
        self.population.par_iter_mut().for_each(|individual| {
            let (fitness, matrix) = evaluator.evaluate(&individual.grid);
            individual.fitness = fitness;
            individual.fitness_matrix = matrix;
        });

        self.total_evaluations += self.population.len() as u64;
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self) {
        for individual in &mut self.population {
            let (fitness, matrix) = self.evaluator.evaluate(&individual.grid);
            individual.fitness = fitness;
            individual.fitness_matrix = matrix;
        }

        self.total_evaluations += self.population.len() as u64;
    }

    /// Append this generation's best individual and average to the history.
    fn record_generation(&mut self, elapsed: Duration) -> f64 {
        let best = &self.population[best_index(&self.population)];
        let generation_best = best.fitness;
        let avg_fitness = average_fitness(&self.population);

        self.history.best_fitness.push(generation_best);
        self.history.avg_fitness.push(avg_fitness);
        self.best_individual_values.push(best.grid.clone());

        if generation_best > self.best_fitness {
            self.best_fitness = generation_best;
            self.best_generation = self.generation;
        }

        log::info!(
            "Generation {}: best {:.3}, avg {:.3}, {:.2}s",
            self.generation,
            generation_best,
            avg_fitness,
            elapsed.as_secs_f64()
        );

        generation_best
    }

    /// Replace the population with the next generation.
    fn next_generation(&mut self) {
        let fitness: Vec<f64> = self.population.iter().map(|i| i.fitness).collect();
        let algorithm = self.config.algorithm;
        let methods = self.config.methods;
        let kernel_size = self.config.map.kernel_size;

        let mut next = Vec::with_capacity(algorithm.population_size + algorithm.elite_count());

        if methods.reproduction == ReproductionMethod::Elitism {
            // Stable sort keeps population order among equal scores.
            let mut ranked: Vec<usize> = (0..self.population.len()).collect();
            ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
            next.extend(
                ranked
                    .iter()
                    .take(algorithm.elite_count())
                    .map(|&i| self.population[i].clone()),
            );
        }

        for _ in 0..algorithm.population_size {
            let (a, b) =
                methods
                    .selection
                    .select(&fitness, algorithm.tournament_size, &mut self.rng);
            let child = methods.crossover.crossover(
                &self.population[a],
                &self.population[b],
                kernel_size,
                &mut self.rng,
            );
            let child = mutate_child(
                methods.mutation,
                child,
                algorithm.mutation_rate,
                kernel_size,
                &mut self.rng,
            );
            next.push(Individual::new(methods.repair.repair(child, &mut self.rng)));
        }

        self.population = next;
    }

    /// Get current progress.
    pub fn progress(&self, elapsed: Duration) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.stop.max_generations,
            best_fitness: self.best_fitness,
            generation_best: self
                .history
                .best_fitness
                .last()
                .copied()
                .unwrap_or(f64::NEG_INFINITY),
            avg_fitness: average_fitness(&self.population),
            population_size: self.population.len(),
            elapsed_seconds: elapsed.as_secs_f64(),
        }
    }

    /// Check if evolution should stop after the current generation.
    fn should_stop(&self, elapsed: Duration) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation + 1 >= self.config.stop.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if elapsed >= Duration::from_secs(self.config.stop.time_limit_seconds) {
            return Some(StopReason::TimeLimit);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> EvolutionResult
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();

        self.initialize();

        let stop_reason = loop {
            self.evaluate_population();
            self.record_generation(start_time.elapsed());
            callback(&self.progress(start_time.elapsed()));

            if let Some(reason) = self.should_stop(start_time.elapsed()) {
                break reason;
            }

            self.next_generation();
            self.generation += 1;
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        log::info!(
            "Stopped after {} generations ({:?}), best {:.3}",
            self.history.best_fitness.len(),
            stop_reason,
            self.best_fitness
        );

        EvolutionResult {
            best_grid: self.best_individual_values[self.best_generation].clone(),
            best_fitness: self.best_fitness,
            stats: EvolutionStats {
                generations: self.history.best_fitness.len(),
                total_evaluations: self.total_evaluations,
                best_fitness: self.best_fitness,
                final_avg_fitness: average_fitness(&self.population),
                elapsed_seconds: elapsed,
                evaluations_per_second: self.total_evaluations as f64 / elapsed.max(f64::EPSILON),
                stop_reason,
            },
            history: self.history.clone(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}
