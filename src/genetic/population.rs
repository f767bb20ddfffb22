use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::types::GeneratorConfig;
use super::{Evaluator, Individual, IndividualKey, SearchContext};

/// Early-stop fitness when no `min_score` is configured
const TARGET_FITNESS: f64 = 95.0;
/// Window of recent generations inspected by the stagnation check
const STAGNATION_WINDOW: usize = 5;
/// Best-fitness range under which the window counts as stagnant
const STAGNATION_RANGE: f64 = 0.05;

/// One generation's worth of progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub generation: u32,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub std_fitness: f64,
    pub min_fitness: f64,
    /// Wall-clock duration of the generation, in seconds
    pub elapsed_secs: f64,
}

/// Aggregate statistics for a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_time_secs: f64,
    pub avg_generation_secs: f64,
    pub min_generation_secs: f64,
    pub max_generation_secs: f64,
    pub total_generations: u32,
    pub best_fitness: f64,
    /// Mean fitness of the final population
    pub avg_fitness: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result of an evolution run
#[derive(Debug)]
pub struct EvolutionOutcome {
    pub best_individual: Individual,
    pub best_fitness: f64,
    pub progress: Vec<ProgressRecord>,
    pub stats: GenerationStats,
    pub cancelled: bool,
    /// Present when the run ended abnormally (e.g. population collapse)
    pub diagnostic: Option<String>,
}

/// Driver lifecycle, advanced as the run progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Initialising,
    Evolving,
    Stopping,
    Done,
}

/// An individual paired with its (possibly stale) score
#[derive(Debug, Clone)]
struct Scored {
    individual: Individual,
    fitness: Option<f64>,
}

impl Scored {
    fn fresh(individual: Individual) -> Self {
        Self {
            individual,
            fitness: None,
        }
    }

    fn score(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }
}

/// The best individuals seen across all generations, deduplicated by gene
/// multiset. Ties are resolved last-write-wins.
#[derive(Debug, Default)]
pub struct HallOfFame {
    capacity: usize,
    entries: Vec<HofEntry>,
}

#[derive(Debug)]
struct HofEntry {
    key: IndividualKey,
    individual: Individual,
    fitness: f64,
}

impl HallOfFame {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    fn update(&mut self, population: &[Scored]) {
        for scored in population {
            let key = scored.individual.key();
            if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
                entry.fitness = scored.score();
                entry.individual = scored.individual.clone();
            } else {
                self.entries.push(HofEntry {
                    key,
                    individual: scored.individual.clone(),
                    fitness: scored.score(),
                });
            }
        }
        self.entries
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.entries.truncate(self.capacity);
    }

    pub fn best(&self) -> Option<(&Individual, f64)> {
        self.entries.first().map(|e| (&e.individual, e.fitness))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Champions in descending fitness order
    pub fn iter(&self) -> impl Iterator<Item = (&Individual, f64)> {
        self.entries.iter().map(|e| (&e.individual, e.fitness))
    }
}

/// Ratio of unique individuals (by gene multiset) to population size
fn population_diversity(population: &[Scored]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let unique: HashSet<IndividualKey> =
        population.iter().map(|s| s.individual.key()).collect();
    unique.len() as f64 / population.len() as f64
}

/// Population manager: runs the generational loop over an owned
/// [`SearchContext`] and [`Evaluator`]
pub struct EvolutionDriver<'a> {
    config: &'a GeneratorConfig,
    hall_of_fame: HallOfFame,
    state: DriverState,
}

impl<'a> EvolutionDriver<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            hall_of_fame: HallOfFame::new(config.hall_of_fame_size),
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Run the evolutionary loop until the iteration bound, an early-stop
    /// condition, or cancellation. Returns the champion plus the full
    /// progress trace; on cancellation the best-so-far is returned with
    /// `cancelled = true`.
    pub fn evolve(
        &mut self,
        ctx: &mut SearchContext,
        evaluator: &mut Evaluator,
        initial: Vec<Individual>,
        cancel: &AtomicBool,
        progress_sink: &mut dyn FnMut(&ProgressRecord),
    ) -> Result<EvolutionOutcome, SchedulerError> {
        if initial.is_empty() {
            return Err(SchedulerError::InvalidConfiguration(
                "initial population is empty".to_string(),
            ));
        }

        self.state = DriverState::Initialising;
        let mut population: Vec<Scored> = initial.into_iter().map(Scored::fresh).collect();
        for scored in &mut population {
            scored.fitness = Some(evaluator.evaluate_individual(&scored.individual));
        }
        self.hall_of_fame.update(&population);

        let start = Instant::now();
        let mut generation_times: Vec<f64> = Vec::new();
        let mut progress: Vec<ProgressRecord> = Vec::new();
        let mut cancelled = false;
        let mut diagnostic = None;

        self.state = DriverState::Evolving;
        for generation in 0..self.config.iterations {
            if cancel.load(Ordering::Relaxed) {
                info!("cancellation requested at generation {generation}");
                cancelled = true;
                break;
            }
            let generation_start = Instant::now();

            let diversity = population_diversity(&population);
            ctx.rates.update(diversity);

            // tournament selection with replacement
            let mut offspring: Vec<Scored> = (0..population.len())
                .map(|_| self.tournament(ctx, &population).clone())
                .collect();

            // pairwise crossover of adjacent parents
            for (left, right) in (0..offspring.len()).tuples() {
                if !ctx.rng.random_bool(ctx.rates.crossover.current) {
                    continue;
                }
                let (child_left, child_right) =
                    ctx.crossover(&offspring[left].individual, &offspring[right].individual);
                offspring[left] = Scored::fresh(child_left);
                offspring[right] = Scored::fresh(child_right);
            }

            // per-individual mutation
            for scored in &mut offspring {
                if ctx.rng.random_bool(ctx.rates.mutation.current) {
                    scored.individual = ctx.mutate(&scored.individual);
                    scored.fitness = None;
                }
            }

            // score whatever the variation operators touched
            for scored in &mut offspring {
                if scored.fitness.is_none() {
                    scored.fitness = Some(evaluator.evaluate_individual(&scored.individual));
                }
            }
            population = offspring;

            if population.iter().all(|s| s.individual.is_blank()) {
                diagnostic = Some(format!(
                    "population collapsed to all-unassigned individuals at generation {generation}"
                ));
                self.state = DriverState::Stopping;
                break;
            }

            self.hall_of_fame.update(&population);

            let record = self.record_generation(
                generation,
                &population,
                generation_start.elapsed().as_secs_f64(),
            );
            generation_times.push(record.elapsed_secs);
            progress_sink(&record);
            progress.push(record);

            if self.should_stop(&progress) {
                let last = &progress[progress.len() - 1];
                info!(
                    "early stop at generation {generation} with best fitness {:.2}",
                    last.best_fitness
                );
                self.state = DriverState::Stopping;
                break;
            }
        }

        self.state = DriverState::Done;

        let (best_individual, best_fitness) = match self.hall_of_fame.best() {
            Some((individual, fitness)) => (individual.clone(), fitness),
            None => {
                return Err(SchedulerError::InvalidConfiguration(
                    "no individual survived evaluation".to_string(),
                ))
            }
        };

        let final_avg = if population.is_empty() {
            0.0
        } else {
            population.iter().map(Scored::score).sum::<f64>() / population.len() as f64
        };

        let min_generation_secs = generation_times
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let stats = GenerationStats {
            total_time_secs: start.elapsed().as_secs_f64(),
            avg_generation_secs: mean(&generation_times),
            min_generation_secs: if min_generation_secs.is_finite() {
                min_generation_secs
            } else {
                0.0
            },
            max_generation_secs: generation_times.iter().copied().fold(0.0, f64::max),
            total_generations: generation_times.len() as u32,
            best_fitness,
            avg_fitness: final_avg,
            timestamp: Utc::now(),
        };

        Ok(EvolutionOutcome {
            best_individual,
            best_fitness,
            progress,
            stats,
            cancelled,
            diagnostic,
        })
    }

    fn tournament<'p>(&self, ctx: &mut SearchContext, population: &'p [Scored]) -> &'p Scored {
        let size = self.config.tournament_size.min(population.len()).max(1);
        let mut best = &population[ctx.rng.random_range(0..population.len())];
        for _ in 1..size {
            let candidate = &population[ctx.rng.random_range(0..population.len())];
            if candidate.score() > best.score() {
                best = candidate;
            }
        }
        best
    }

    fn record_generation(
        &self,
        generation: u32,
        population: &[Scored],
        elapsed_secs: f64,
    ) -> ProgressRecord {
        let scores: Vec<f64> = population.iter().map(Scored::score).collect();
        let avg = mean(&scores);
        let variance = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / scores.len() as f64
        };
        let best = scores.iter().copied().fold(0.0, f64::max);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);

        let record = ProgressRecord {
            generation,
            best_fitness: best,
            avg_fitness: avg,
            std_fitness: variance.sqrt(),
            min_fitness: if min.is_finite() { min } else { 0.0 },
            elapsed_secs,
        };
        debug!(
            "gen {generation}: best={best:.2} avg={avg:.2} std={:.2} in {elapsed_secs:.4}s",
            record.std_fitness
        );
        record
    }

    /// Early stop: target fitness reached, or, past the generation gate,
    /// either a stagnant best-fitness window or a converged population
    fn should_stop(&self, progress: &[ProgressRecord]) -> bool {
        let Some(last) = progress.last() else {
            return false;
        };
        let target = self.config.min_score.unwrap_or(TARGET_FITNESS);
        if last.best_fitness >= target {
            return true;
        }

        if last.generation as usize <= self.config.early_stop_generations as usize {
            return false;
        }

        if progress.len() >= STAGNATION_WINDOW {
            let window = &progress[progress.len() - STAGNATION_WINDOW..];
            let (low, high) = window.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.best_fitness), hi.max(r.best_fitness))
            });
            if high - low < STAGNATION_RANGE {
                return true;
            }
        }

        (last.best_fitness - last.avg_fitness).abs() < 0.1 && last.std_fitness < 0.1
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LessonSlot, RoomId, School, TeacherId};
    use approx::assert_relative_eq;

    fn lesson(day: u8, hour: u8, class: &str, teacher: &str) -> LessonSlot {
        LessonSlot::new(
            day,
            hour,
            class,
            "mathematics",
            TeacherId(teacher.to_string()),
            RoomId("r101".to_string()),
        )
    }

    fn scored(individual: Individual, fitness: f64) -> Scored {
        Scored {
            individual,
            fitness: Some(fitness),
        }
    }

    #[test]
    fn test_hall_of_fame_keeps_top_k() {
        let mut hof = HallOfFame::new(2);
        let population: Vec<Scored> = (0..4)
            .map(|i| {
                scored(
                    Individual::new(vec![Some(lesson(i, 0, "1A", "t1"))]),
                    f64::from(i) * 10.0,
                )
            })
            .collect();
        hof.update(&population);

        assert_eq!(hof.len(), 2);
        let (_, best) = hof.best().unwrap();
        assert_eq!(best, 30.0);
    }

    #[test]
    fn test_hall_of_fame_deduplicates_by_gene_multiset() {
        let mut hof = HallOfFame::new(5);
        let a = lesson(0, 0, "1A", "t1");
        let b = lesson(1, 0, "1B", "t2");

        let ind1 = Individual::new(vec![Some(a.clone()), Some(b.clone())]);
        let ind2 = Individual::new(vec![Some(b), Some(a)]);
        hof.update(&[scored(ind1, 50.0)]);
        hof.update(&[scored(ind2, 50.0)]);

        assert_eq!(hof.len(), 1);
    }

    #[test]
    fn test_hall_of_fame_never_drops_best() {
        let mut hof = HallOfFame::new(3);
        let strong = Individual::new(vec![Some(lesson(0, 0, "1A", "t1"))]);
        hof.update(&[scored(strong, 90.0)]);

        // a later generation full of weak individuals
        let weak: Vec<Scored> = (1..5)
            .map(|i| scored(Individual::new(vec![Some(lesson(i, 1, "1B", "t2"))]), 10.0))
            .collect();
        hof.update(&weak);

        let (_, best) = hof.best().unwrap();
        assert_eq!(best, 90.0);
    }

    #[test]
    fn test_population_diversity() {
        let a = Individual::new(vec![Some(lesson(0, 0, "1A", "t1"))]);
        let b = Individual::new(vec![Some(lesson(1, 0, "1A", "t1"))]);

        let uniform = vec![scored(a.clone(), 0.0), scored(a.clone(), 0.0)];
        assert_relative_eq!(population_diversity(&uniform), 0.5);

        let diverse = vec![scored(a, 0.0), scored(b, 0.0)];
        assert_relative_eq!(population_diversity(&diverse), 1.0);

        assert_relative_eq!(population_diversity(&[]), 0.0);
    }

    #[test]
    fn test_record_generation_statistics() {
        let config = GeneratorConfig::default();
        let driver = EvolutionDriver::new(&config);
        let population: Vec<Scored> = [10.0, 20.0, 30.0]
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                scored(Individual::new(vec![Some(lesson(i as u8, 0, "1A", "t1"))]), f)
            })
            .collect();

        let record = driver.record_generation(3, &population, 0.5);
        assert_eq!(record.generation, 3);
        assert_relative_eq!(record.best_fitness, 30.0);
        assert_relative_eq!(record.min_fitness, 10.0);
        assert_relative_eq!(record.avg_fitness, 20.0);
        assert_relative_eq!(record.std_fitness, (200.0f64 / 3.0).sqrt());
    }

    #[test]
    fn test_should_stop_on_target_fitness() {
        let config = GeneratorConfig::default();
        let driver = EvolutionDriver::new(&config);
        let record = ProgressRecord {
            generation: 0,
            best_fitness: 96.0,
            avg_fitness: 40.0,
            std_fitness: 10.0,
            min_fitness: 5.0,
            elapsed_secs: 0.1,
        };
        assert!(driver.should_stop(&[record]));
    }

    #[test]
    fn test_should_stop_respects_min_score_override() {
        let config = GeneratorConfig {
            min_score: Some(50.0),
            ..Default::default()
        };
        let driver = EvolutionDriver::new(&config);
        let record = ProgressRecord {
            generation: 0,
            best_fitness: 55.0,
            avg_fitness: 20.0,
            std_fitness: 10.0,
            min_fitness: 5.0,
            elapsed_secs: 0.1,
        };
        assert!(driver.should_stop(&[record]));
    }

    #[test]
    fn test_should_stop_on_converged_population() {
        let config = GeneratorConfig::default();
        let driver = EvolutionDriver::new(&config);
        let converged = |generation: u32| ProgressRecord {
            generation,
            best_fitness: 40.0,
            avg_fitness: 39.95,
            std_fitness: 0.01,
            min_fitness: 39.9,
            elapsed_secs: 0.1,
        };
        // convergence only counts past the generation gate
        assert!(!driver.should_stop(&[converged(2)]));
        assert!(driver.should_stop(&[converged(22)]));
    }

    #[test]
    fn test_should_stop_on_stagnation_after_gate() {
        let config = GeneratorConfig::default();
        let driver = EvolutionDriver::new(&config);

        let flat = |generation: u32| ProgressRecord {
            generation,
            best_fitness: 70.0,
            avg_fitness: 30.0,
            std_fitness: 15.0,
            min_fitness: 5.0,
            elapsed_secs: 0.1,
        };
        // before the gate: keep going even though best is flat
        let early: Vec<ProgressRecord> = (0..5).map(flat).collect();
        assert!(!driver.should_stop(&early));

        // past the gate with a flat 5-generation window: stop
        let late: Vec<ProgressRecord> = (18..25).map(flat).collect();
        assert!(driver.should_stop(&late));
    }

    #[test]
    fn test_evolution_on_demo_school_improves_or_holds() {
        let school = School::demo();
        let config = GeneratorConfig {
            population_size: 12,
            iterations: 4,
            seed: Some(3),
            min_score: Some(1000.0), // never stop early
            ..Default::default()
        };
        let mut ctx = SearchContext::new(&school, &config);
        let mut evaluator = Evaluator::new(&school, &config);
        let mut driver = EvolutionDriver::new(&config);

        let len = school.total_required_hours();
        let initial: Vec<Individual> = (0..config.population_size)
            .map(|_| ctx.random_individual(len))
            .collect();
        let first_best = {
            let mut probe = Evaluator::new(&school, &config);
            initial
                .iter()
                .map(|i| probe.evaluate_individual(i))
                .fold(0.0, f64::max)
        };

        let cancel = AtomicBool::new(false);
        let outcome = driver
            .evolve(&mut ctx, &mut evaluator, initial, &cancel, &mut |_| {})
            .unwrap();

        assert_eq!(driver.state(), DriverState::Done);
        assert!(outcome.best_fitness >= first_best, "champion lost ground");
        assert_eq!(outcome.progress.len() as u32, outcome.stats.total_generations);
        assert!(!outcome.cancelled);

        // hall of fame is non-decreasing: every generation's best is at
        // most the champion's fitness
        for record in &outcome.progress {
            assert!(record.best_fitness <= outcome.best_fitness + 1e-9);
        }
    }

    #[test]
    fn test_population_of_one_terminates() {
        let school = School::demo();
        let config = GeneratorConfig {
            population_size: 1,
            iterations: 50,
            seed: Some(5),
            min_score: Some(1000.0), // only the convergence check can stop it
            ..Default::default()
        };
        let mut ctx = SearchContext::new(&school, &config);
        let mut evaluator = Evaluator::new(&school, &config);
        let mut driver = EvolutionDriver::new(&config);

        let initial = vec![ctx.random_individual(school.total_required_hours())];
        let cancel = AtomicBool::new(false);
        let outcome = driver
            .evolve(&mut ctx, &mut evaluator, initial, &cancel, &mut |_| {})
            .unwrap();

        // a single individual is converged (best == avg, std == 0), so the
        // run ends at the first generation past the early-stop gate
        assert_eq!(outcome.progress.len(), 22);
    }

    #[test]
    fn test_cancellation_before_first_generation() {
        let school = School::demo();
        let config = GeneratorConfig {
            population_size: 4,
            seed: Some(9),
            ..Default::default()
        };
        let mut ctx = SearchContext::new(&school, &config);
        let mut evaluator = Evaluator::new(&school, &config);
        let mut driver = EvolutionDriver::new(&config);

        let initial: Vec<Individual> = (0..4)
            .map(|_| ctx.random_individual(school.total_required_hours()))
            .collect();
        let cancel = AtomicBool::new(true);
        let outcome = driver
            .evolve(&mut ctx, &mut evaluator, initial, &cancel, &mut |_| {})
            .unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.progress.is_empty());
        // the champion still comes from the evaluated initial population
        assert!(outcome.best_fitness >= 0.0);
    }

    #[test]
    fn test_collapse_diagnostic() {
        let school = School::new(vec![], vec![], vec![], vec![]);
        let config = GeneratorConfig {
            population_size: 3,
            iterations: 5,
            seed: Some(1),
            ..Default::default()
        };
        let mut ctx = SearchContext::new(&school, &config);
        let mut evaluator = Evaluator::new(&school, &config);
        let mut driver = EvolutionDriver::new(&config);

        // nothing can ever be scheduled: individuals stay blank
        let initial: Vec<Individual> = (0..3).map(|_| Individual::blank(4)).collect();
        let cancel = AtomicBool::new(false);
        let outcome = driver
            .evolve(&mut ctx, &mut evaluator, initial, &cancel, &mut |_| {})
            .unwrap();

        assert!(outcome.diagnostic.is_some());
    }
}
