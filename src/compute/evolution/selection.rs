//! Parent selection.
//!
//! Selection works on the population's fitness values and returns the
//! indices of two parents.

use rand::Rng;

use crate::schema::SelectionMethod;

impl SelectionMethod {
    /// Pick two parent indices from `fitness`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        fitness: &[f64],
        tournament_size: usize,
        rng: &mut R,
    ) -> (usize, usize) {
        match self {
            Self::Tournament => tournament_select(fitness, tournament_size, rng),
            Self::Roulette => roulette_select(fitness, rng),
        }
    }
}

/// Draw `2 * size` candidates with replacement and run two tournaments.
pub fn tournament_select<R: Rng + ?Sized>(
    fitness: &[f64],
    size: usize,
    rng: &mut R,
) -> (usize, usize) {
    let candidates: Vec<usize> = (0..2 * size.max(1))
        .map(|_| rng.gen_range(0..fitness.len()))
        .collect();
    tournament_from_indices(fitness, &candidates)
}

/// Winners of the two halves of `candidates`.
///
/// Each winner is the fittest member of its half; ties go to the earlier
/// candidate.
pub fn tournament_from_indices(fitness: &[f64], candidates: &[usize]) -> (usize, usize) {
    let (first, second) = candidates.split_at(candidates.len() / 2);
    (fittest(fitness, first), fittest(fitness, second))
}

fn fittest(fitness: &[f64], candidates: &[usize]) -> usize {
    candidates
        .iter()
        .copied()
        .reduce(|best, i| if fitness[i] > fitness[best] { i } else { best })
        .unwrap_or(0)
}

/// Two independent fitness-proportionate draws.
///
/// Falls back to uniform weights when the total fitness is not positive.
pub fn roulette_select<R: Rng + ?Sized>(fitness: &[f64], rng: &mut R) -> (usize, usize) {
    let cumulative = cumulative_probabilities(fitness);
    (
        spin(&cumulative, rng.r#gen()),
        spin(&cumulative, rng.r#gen()),
    )
}

fn cumulative_probabilities(fitness: &[f64]) -> Vec<f64> {
    let total: f64 = fitness.iter().sum();
    let uniform = 1.0 / fitness.len() as f64;

    fitness
        .iter()
        .scan(0.0, |acc, &f| {
            *acc += if total > 0.0 && total.is_finite() {
                f / total
            } else {
                uniform
            };
            Some(*acc)
        })
        .collect()
}

/// First index whose cumulative probability exceeds `r`; the last on overshoot.
fn spin(cumulative: &[f64], r: f64) -> usize {
    cumulative
        .iter()
        .position(|&c| r < c)
        .unwrap_or(cumulative.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_tournament_halves() {
        let fitness = [1.0, 2.0, 3.0, 4.0];
        let (a, b) = tournament_from_indices(&fitness, &[0, 2, 1, 3]);
        assert_eq!(fitness[a], 3.0);
        assert_eq!(fitness[b], 4.0);
    }

    #[test]
    fn test_tournament_tie_keeps_first() {
        let fitness = [5.0, 5.0, 1.0];
        assert_eq!(tournament_from_indices(&fitness, &[1, 0, 2, 2]), (1, 2));
    }

    #[test]
    fn test_tournament_prefers_fit() {
        let mut rng = StdRng::seed_from_u64(4);
        let fitness: Vec<f64> = (0..20).map(f64::from).collect();
        let mut sum = 0usize;
        for _ in 0..500 {
            let (a, b) = SelectionMethod::Tournament.select(&fitness, 3, &mut rng);
            sum += a + b;
        }
        // Uniform picks would average 9.5 per index.
        assert!(sum as f64 / 1000.0 > 11.0);
    }

    #[test]
    fn test_spin_overshoot_returns_last() {
        let cumulative = [0.2, 0.5, 0.999_999];
        assert_eq!(spin(&cumulative, 0.1), 0);
        assert_eq!(spin(&cumulative, 0.2), 1);
        assert_eq!(spin(&cumulative, 0.999_999_9), 2);
    }

    #[test]
    fn test_roulette_zero_total_is_uniform() {
        let cumulative = cumulative_probabilities(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(cumulative, vec![0.25, 0.5, 0.75, 1.0]);

        let negative = cumulative_probabilities(&[-3.0, 1.0]);
        assert_eq!(negative, vec![0.5, 1.0]);
    }

    #[test]
    fn test_roulette_skips_zero_fitness() {
        let mut rng = StdRng::seed_from_u64(12);
        let fitness = [0.0, 0.0, 6.0, 0.0];
        for _ in 0..50 {
            assert_eq!(SelectionMethod::Roulette.select(&fitness, 2, &mut rng), (2, 2));
        }
    }
}
