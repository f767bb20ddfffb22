use std::sync::atomic::AtomicBool;

use log::info;

use crate::error::{Result, SchedulerError};
use crate::types::{Gene, GeneratorConfig, School, Timetable};
use super::{
    seed_individual, EvolutionDriver, Evaluator, GenerationStats, Individual, ProgressRecord,
    SearchContext,
};

/// Everything a finished run produces: the decoded champion timetable,
/// the progress trace, and the aggregate statistics
#[derive(Debug)]
pub struct GenerationOutcome {
    pub timetable: Timetable,
    pub best_individual: Individual,
    pub best_fitness: f64,
    pub progress: Vec<ProgressRecord>,
    pub stats: GenerationStats,
    pub cancelled: bool,
    pub diagnostic: Option<String>,
}

/// Single entry point for timetable generation.
///
/// Owns nothing but the configuration; the domain snapshot is borrowed
/// and shared read-only with every component. Construction fails fast on
/// invalid configuration or an empty school.
pub struct TimetableGenerator<'a> {
    school: &'a School,
    config: GeneratorConfig,
    best_known: Option<Vec<Gene>>,
}

impl<'a> TimetableGenerator<'a> {
    pub fn new(school: &'a School, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        if school.class_groups().is_empty() {
            return Err(SchedulerError::InvalidConfiguration(
                "school has no class groups".to_string(),
            )
            .into());
        }
        Ok(Self {
            school,
            config,
            best_known: None,
        })
    }

    /// Seed one population slot with a previously saved gene vector. The
    /// vector is treated as opaque: it is resized to the current
    /// individual length and invalid genes simply drop out on decode.
    pub fn with_best_known(mut self, genes: Vec<Gene>) -> Self {
        self.best_known = Some(genes);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run the full pipeline: seeded constructor, initial population,
    /// evolution, and decoding of the hall-of-fame champion.
    ///
    /// `cancel` is checked at generation boundaries; a cancelled run
    /// returns the best result so far with `cancelled = true`. The
    /// progress sink is invoked once per completed generation.
    pub fn generate(
        &self,
        cancel: &AtomicBool,
        mut progress_sink: impl FnMut(&ProgressRecord),
    ) -> Result<GenerationOutcome> {
        let school = self.school;
        let target_len = school.total_required_hours();
        info!(
            "starting generation: {} classes, {} lessons to schedule",
            school.class_groups().len(),
            target_len
        );

        let mut ctx = SearchContext::new(school, &self.config);
        let mut evaluator = Evaluator::new(school, &self.config);
        let mut driver = EvolutionDriver::new(&self.config);

        let initial = self.initial_population(&mut ctx, target_len);
        let outcome = driver.evolve(
            &mut ctx,
            &mut evaluator,
            initial,
            cancel,
            &mut progress_sink,
        )?;

        let timetable = outcome.best_individual.decode(school);
        info!(
            "generation finished in {:.2}s: fitness {:.2}, {} lessons scheduled",
            outcome.stats.total_time_secs,
            outcome.best_fitness,
            timetable.len()
        );

        Ok(GenerationOutcome {
            timetable,
            best_individual: outcome.best_individual,
            best_fitness: outcome.best_fitness,
            progress: outcome.progress,
            stats: outcome.stats,
            cancelled: outcome.cancelled,
            diagnostic: outcome.diagnostic,
        })
    }

    /// `N - k` random individuals, then the seeded constructor's output,
    /// then the optional best-known solution
    fn initial_population(&self, ctx: &mut SearchContext, target_len: usize) -> Vec<Individual> {
        let size = self.config.population_size;
        let reserved = 1 + usize::from(self.best_known.is_some());
        let randoms = size.saturating_sub(reserved);

        let mut population = Vec::with_capacity(size.max(reserved));
        for _ in 0..randoms {
            population.push(ctx.random_individual(target_len));
        }
        population.push(seed_individual(self.school, &self.config));

        if let Some(genes) = &self.best_known {
            let mut genes = genes.clone();
            genes.resize(target_len, None);
            population.push(Individual::new(genes));
        }

        population.truncate(size.max(1));
        population
    }
}
