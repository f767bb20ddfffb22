use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Configuration for the evolutionary search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Maximum number of generations
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Initial mutation rate (adapted during the run)
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Initial crossover rate (adapted during the run)
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Fitness at which the run stops early; defaults to 95 when absent
    #[serde(default)]
    pub min_score: Option<f64>,
    /// Generations to run before the stagnation check kicks in
    #[serde(default = "default_early_stop_generations")]
    pub early_stop_generations: u32,
    #[serde(default = "default_daily_hours")]
    pub daily_hours: u8,
    #[serde(default = "default_week_days")]
    pub week_days: u8,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    #[serde(default = "default_hall_of_fame_size")]
    pub hall_of_fame_size: usize,
    /// Score cache entries kept before the oldest fifth is evicted
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// RNG seed for reproducible runs; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_iterations() -> u32 {
    1000
}

fn default_population_size() -> usize {
    200
}

fn default_mutation_rate() -> f64 {
    0.2
}

fn default_crossover_rate() -> f64 {
    0.85
}

fn default_early_stop_generations() -> u32 {
    20
}

fn default_daily_hours() -> u8 {
    8
}

fn default_week_days() -> u8 {
    5
}

fn default_tournament_size() -> usize {
    3
}

fn default_hall_of_fame_size() -> usize {
    5
}

fn default_cache_capacity() -> usize {
    10_000
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            population_size: default_population_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            min_score: None,
            early_stop_generations: default_early_stop_generations(),
            daily_hours: default_daily_hours(),
            week_days: default_week_days(),
            tournament_size: default_tournament_size(),
            hall_of_fame_size: default_hall_of_fame_size(),
            cache_capacity: default_cache_capacity(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Reject configurations the generator refuses to run with
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.iterations == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "iterations must be positive".to_string(),
            ));
        }
        if self.population_size == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "population_size must be positive".to_string(),
            ));
        }
        if self.week_days == 0 || self.week_days > 7 {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "week_days must be in 1..=7, got {}",
                self.week_days
            )));
        }
        if self.daily_hours == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "daily_hours must be positive".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "tournament_size must be positive".to_string(),
            ));
        }
        if self.hall_of_fame_size == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "hall_of_fame_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "crossover_rate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        Ok(())
    }

    /// Weekly slots available to a single resource
    pub fn weekly_slots(&self) -> usize {
        self.week_days as usize * self.daily_hours as usize
    }
}
