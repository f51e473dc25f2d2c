//! Evolutionary solver for the travelling salesman problem.
//!
//! Each generation scores the population, keeps the `elite_size` best
//! candidates, fills the remaining parent slots by roulette-wheel sampling,
//! breeds adjacent parents with order crossover and finally mutates every
//! non-elite child with random position swaps.
//!
//! Candidates are permutations of city indices into the problem's world.
//! They are only turned into tours when the problem scores them.

use std::collections::HashSet;
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{TspError, TspResult};
use crate::problem::{Route, Tsp};

/// A candidate tour as a permutation of city indices.
pub type Candidate = Vec<usize>;

/// Largest population a run will allocate.
pub const MAX_POP_SIZE: usize = 1 << 20;

/// The four knobs of the evolutionary search.
///
/// Counts deserialize from any non-negative JSON number and are truncated,
/// since the recommender service answers with floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    #[serde(deserialize_with = "truncated_count")]
    pub pop_size: usize,
    #[serde(deserialize_with = "truncated_count")]
    pub generations: usize,
    #[serde(deserialize_with = "truncated_count")]
    pub elite_size: usize,
    pub mutation_rate: f64,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            pop_size: 100,
            generations: 500,
            elite_size: 20,
            mutation_rate: 0.01,
        }
    }
}

impl Hyperparams {
    /// Reject parameter combinations that would break the generational loop.
    pub fn validate(&self) -> TspResult<()> {
        if self.pop_size < 2 {
            return Err(TspError::InvalidHyperparams(format!(
                "pop_size must be at least 2, got {}",
                self.pop_size
            )));
        }
        if self.pop_size > MAX_POP_SIZE {
            return Err(TspError::InvalidHyperparams(format!(
                "pop_size must be at most {MAX_POP_SIZE}, got {}",
                self.pop_size
            )));
        }
        if self.elite_size > self.pop_size {
            return Err(TspError::InvalidHyperparams(format!(
                "elite_size {} exceeds pop_size {}",
                self.elite_size, self.pop_size
            )));
        }
        if !self.mutation_rate.is_finite() || self.mutation_rate < 0.0 {
            return Err(TspError::InvalidHyperparams(format!(
                "mutation_rate must be a non-negative number, got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

fn truncated_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative count, got {value}"
        )));
    }
    Ok(value.trunc() as usize)
}

/// Best tour found by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// City names in visiting order.
    pub best_route: Vec<String>,
    /// Closed tour length.
    pub best_score: f64,
}

#[derive(Debug, Clone)]
pub struct EvolutionaryAlgo {
    params: Hyperparams,
    parallel_scoring: bool,
}

impl EvolutionaryAlgo {
    pub fn new(params: Hyperparams) -> TspResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            parallel_scoring: false,
        })
    }

    /// Score each generation on the rayon thread pool.
    ///
    /// Scoring draws no random numbers, so results do not change.
    pub fn with_parallel_scoring(mut self, enabled: bool) -> Self {
        self.parallel_scoring = enabled;
        self
    }

    pub fn params(&self) -> &Hyperparams {
        &self.params
    }

    /// Run the search with a generator seeded from `seed`.
    pub fn solve_seeded(&self, tsp: &Tsp, seed: u64) -> TspResult<Solution> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.solve(tsp, &mut rng)
    }

    pub fn solve<R: Rng>(&self, tsp: &Tsp, rng: &mut R) -> TspResult<Solution> {
        if tsp.n_cities() == 0 {
            return Err(TspError::EmptyWorld);
        }

        tracing::info!(
            n_cities = tsp.n_cities(),
            pop_size = self.params.pop_size,
            generations = self.params.generations,
            elite_size = self.params.elite_size,
            mutation_rate = self.params.mutation_rate,
            "starting evolutionary search"
        );

        let mut pop = self.generate_init_pop(tsp.n_cities(), rng);
        for generation in 0..self.params.generations {
            let _span = tracing::debug_span!("generation", index = generation).entered();
            let parents = self.select_parents(&pop, tsp, rng)?;
            pop = self.breed(&parents, rng);
            self.mutate(&mut pop, rng);
        }

        let (best, best_score) = self.best_solution(&pop, tsp)?;
        let world = tsp.world();
        let best_route = best
            .iter()
            .filter_map(|&i| world.city_at(i))
            .map(|city| city.name.clone())
            .collect();

        tracing::info!(best_score, "evolutionary search finished");
        Ok(Solution {
            best_route,
            best_score,
        })
    }

    /// `pop_size` independent uniform permutations of `0..n_cities`.
    pub fn generate_init_pop<R: Rng>(&self, n_cities: usize, rng: &mut R) -> Vec<Candidate> {
        (0..self.params.pop_size)
            .map(|_| {
                let mut candidate: Candidate = (0..n_cities).collect();
                candidate.shuffle(rng);
                candidate
            })
            .collect()
    }

    fn score_population(&self, pop: &[Candidate], tsp: &Tsp) -> TspResult<Vec<f64>> {
        if self.parallel_scoring {
            pop.par_iter()
                .map(|candidate| tsp.solve(Route::Indices(candidate)))
                .collect()
        } else {
            pop.iter()
                .map(|candidate| tsp.solve(Route::Indices(candidate)))
                .collect()
        }
    }

    /// Elites first, then roulette-wheel samples from the ranked population.
    pub fn select_parents<R: Rng>(
        &self,
        pop: &[Candidate],
        tsp: &Tsp,
        rng: &mut R,
    ) -> TspResult<Vec<Candidate>> {
        let lengths = self.score_population(pop, tsp)?;

        let mut scored = Vec::with_capacity(pop.len());
        for (candidate, length) in pop.iter().zip(lengths) {
            if length == 0.0 {
                return Err(TspError::ZeroLengthTour);
            }
            scored.push((candidate.clone(), 1.0 / length));
        }
        // Stable sort keeps population order among equal fitness.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        if let Some((_, fitness)) = scored.first() {
            tracing::debug!(best_length = 1.0 / fitness, "scored population");
        }

        let elite_size = self.params.elite_size.min(scored.len());
        let mut parents: Vec<Candidate> = scored[..elite_size]
            .iter()
            .map(|(candidate, _)| candidate.clone())
            .collect();
        parents.extend(fitness_prop_sample(
            &scored,
            self.params.pop_size.saturating_sub(elite_size),
            rng,
        ));
        Ok(parents)
    }

    /// Elites pass through; adjacent parents are coupled until the
    /// population is full again.
    pub fn breed<R: Rng>(&self, parents: &[Candidate], rng: &mut R) -> Vec<Candidate> {
        let pop_size = self.params.pop_size;
        let mut children: Vec<Candidate> = parents
            .iter()
            .take(self.params.elite_size)
            .cloned()
            .collect();

        for pair in parents.windows(2) {
            if children.len() >= pop_size {
                break;
            }
            let [first, second] = couple(&pair[0], &pair[1], rng);
            children.push(first);
            if children.len() < pop_size {
                children.push(second);
            }
        }

        children
    }

    /// Swap-mutate every candidate after the elite slots in place.
    pub fn mutate<R: Rng>(&self, pop: &mut [Candidate], rng: &mut R) {
        self.mutate_with(
            pop,
            rng,
            |rng| rng.gen_range(0.5..1.5),
            |len, n_swaps, rng| draw_swap_pairs(len, n_swaps, rng),
        );
    }

    /// [`Self::mutate`] with the rate jitter and the swap-pair draw supplied
    /// by the caller. `pairs` receives the path length and the swap count.
    pub fn mutate_with<R, J, P>(
        &self,
        pop: &mut [Candidate],
        rng: &mut R,
        mut jitter: J,
        mut pairs: P,
    ) where
        J: FnMut(&mut R) -> f64,
        P: FnMut(usize, usize, &mut R) -> Vec<(usize, usize)>,
    {
        let elite_size = self.params.elite_size.min(pop.len());
        for path in &mut pop[elite_size..] {
            let n_swaps = swap_count(path.len(), jitter(rng), self.params.mutation_rate);
            if n_swaps == 0 {
                continue;
            }
            let drawn = pairs(path.len(), n_swaps, rng);
            apply_swaps(path, &drawn);
        }
    }

    /// Shortest candidate of a population; ties go to the earliest.
    pub fn best_solution<'p>(
        &self,
        pop: &'p [Candidate],
        tsp: &Tsp,
    ) -> TspResult<(&'p Candidate, f64)> {
        let lengths = self.score_population(pop, tsp)?;

        let mut best: Option<(&Candidate, f64)> = None;
        for (candidate, length) in pop.iter().zip(lengths) {
            match best {
                Some((_, best_length)) if length >= best_length => {}
                _ => best = Some((candidate, length)),
            }
        }
        best.ok_or_else(|| TspError::InvalidHyperparams("population is empty".into()))
    }
}

/// Normalized running sum of `scores`.
pub fn cumulative_distribution(scores: &[f64]) -> Vec<f64> {
    let total: f64 = scores.iter().sum();
    let mut running = 0.0;
    scores
        .iter()
        .map(|score| {
            running += score;
            running / total
        })
        .collect()
}

/// Index of the first bucket whose cumulative value reaches `u`.
///
/// A `u` on a boundary belongs to the bucket that boundary closes. Values
/// beyond the last bucket, which rounding can produce, select the last one.
pub fn sample_from_cdf(u: f64, cdf: &[f64]) -> usize {
    cdf.iter()
        .position(|&cumulative| u <= cumulative)
        .unwrap_or(cdf.len().saturating_sub(1))
}

/// Draw `k` items with probability proportional to their score.
pub fn fitness_prop_sample<T: Clone, R: Rng>(scored: &[(T, f64)], k: usize, rng: &mut R) -> Vec<T> {
    if scored.is_empty() {
        return Vec::new();
    }

    let scores: Vec<f64> = scored.iter().map(|(_, score)| *score).collect();
    let cdf = cumulative_distribution(&scores);
    (0..k)
        .map(|_| {
            let u = rng.gen_range(0.0..1.0);
            scored[sample_from_cdf(u, &cdf)].0.clone()
        })
        .collect()
}

/// Order crossover with cut points `a < b`.
///
/// The first child starts with `second[a..b]` and continues with the
/// remaining genes of `first`, reading from `b` to the end and then from
/// the start. The second child mirrors this with the parents swapped.
pub fn order_crossover<T>(first: &[T], second: &[T], a: usize, b: usize) -> [Vec<T>; 2]
where
    T: Clone + Eq + Hash,
{
    [fill_from(second, first, a, b), fill_from(first, second, a, b)]
}

fn fill_from<T>(donor: &[T], filler: &[T], a: usize, b: usize) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let segment = &donor[a..b];
    let taken: HashSet<&T> = segment.iter().collect();

    let mut child = Vec::with_capacity(filler.len());
    child.extend_from_slice(segment);
    child.extend(
        filler[b..]
            .iter()
            .chain(&filler[..b])
            .filter(|gene| !taken.contains(gene))
            .cloned(),
    );
    child
}

/// Order crossover with two distinct random cut points in `0..=len`.
pub fn couple<T, R>(first: &[T], second: &[T], rng: &mut R) -> [Vec<T>; 2]
where
    T: Clone + Eq + Hash,
    R: Rng,
{
    let cuts = index::sample(rng, second.len() + 1, 2);
    let (a, b) = (cuts.index(0), cuts.index(1));
    order_crossover(first, second, a.min(b), a.max(b))
}

/// Number of swaps for a path: `floor(len * jitter * rate)`.
pub fn swap_count(len: usize, jitter: f64, mutation_rate: f64) -> usize {
    (len as f64 * jitter * mutation_rate).floor() as usize
}

/// Distinct ordered index pairs `(i, j)` with `i != j`, drawn without
/// replacement. Asking for more pairs than exist yields all of them.
fn draw_swap_pairs<R: Rng>(len: usize, count: usize, rng: &mut R) -> Vec<(usize, usize)> {
    if len < 2 {
        return Vec::new();
    }

    let total = len * (len - 1);
    index::sample(rng, total, count.min(total))
        .into_iter()
        .map(|flat| {
            let i = flat / (len - 1);
            let j = flat % (len - 1);
            (i, if j >= i { j + 1 } else { j })
        })
        .collect()
}

/// Swap the values at each pair of positions, in order.
pub fn apply_swaps<T>(path: &mut [T], pairs: &[(usize, usize)]) {
    for &(a, b) in pairs {
        path.swap(a, b);
    }
}
