use std::collections::{HashMap, HashSet};

use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, IteratorRandom};
use rand::{Rng, SeedableRng};

use crate::feasibility::{room_available, teacher_available};
use crate::types::{GeneratorConfig, LessonSlot, School, Timetable};
use super::Individual;

/// Attempts before giving up on a random gene
const MAX_SLOT_ATTEMPTS: usize = 100;
/// Attempts before giving up on a filling lesson
const MAX_FILL_ATTEMPTS: usize = 50;
/// Probability of running the hole-filling step during mutation
const FILL_PROBABILITY: f64 = 0.7;
/// Holes filled per mutation at most
const MAX_FILL_SLOTS: usize = 3;
/// Mutation points kept per mutation at most
const MAX_MUTATION_POINTS: usize = 10;
/// Classes with fewer weekly lessons than this attract mutation
const UNDERFILLED_WEEKLY_LESSONS: usize = 15;

/// Diversity thresholds driving rate adaptation
const LOW_DIVERSITY: f64 = 0.3;
const HIGH_DIVERSITY: f64 = 0.7;

const MUTATION_RATE_MIN: f64 = 0.05;
const MUTATION_RATE_MAX: f64 = 0.4;
const CROSSOVER_RATE_MIN: f64 = 0.7;
const CROSSOVER_RATE_MAX: f64 = 0.95;

/// One adaptive rate with its working band
#[derive(Debug, Clone, Copy)]
pub struct RateBand {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

impl RateBand {
    fn raise(&mut self, factor: f64) {
        self.current = (self.current * factor).min(self.max);
    }

    fn lower(&mut self, factor: f64) {
        self.current = (self.current * factor).max(self.min);
    }
}

/// Mutation and crossover rates, adapted once per generation from
/// population diversity: low diversity pushes both rates up to escape
/// convergence, high diversity eases them back down.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveRates {
    pub mutation: RateBand,
    pub crossover: RateBand,
}

impl AdaptiveRates {
    pub fn new(mutation_rate: f64, crossover_rate: f64) -> Self {
        Self {
            mutation: RateBand {
                min: MUTATION_RATE_MIN,
                max: MUTATION_RATE_MAX,
                current: mutation_rate,
            },
            crossover: RateBand {
                min: CROSSOVER_RATE_MIN,
                max: CROSSOVER_RATE_MAX,
                current: crossover_rate,
            },
        }
    }

    /// Update both rates from a diversity measure in [0, 1]
    pub fn update(&mut self, diversity: f64) {
        if diversity < LOW_DIVERSITY {
            self.mutation.raise(1.5);
            self.crossover.raise(1.2);
        } else if diversity > HIGH_DIVERSITY {
            self.mutation.lower(0.75);
            self.crossover.lower(0.9);
        }
    }
}

/// All mutable search state, owned and passed explicitly: the snapshot
/// reference, the run configuration, the PRNG, and the adaptive rates.
pub struct SearchContext<'a> {
    pub school: &'a School,
    pub config: &'a GeneratorConfig,
    pub rng: StdRng,
    pub rates: AdaptiveRates,
}

impl<'a> SearchContext<'a> {
    pub fn new(school: &'a School, config: &'a GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            school,
            config,
            rng,
            rates: AdaptiveRates::new(config.mutation_rate, config.crossover_rate),
        }
    }

    /// Generate a valid (not necessarily feasible-in-context) gene: a
    /// class, one of its subjects, a qualified teacher, a suitable room,
    /// and a uniform `(day, hour)`. Returns `None` when no valid gene can
    /// be formed within the retry bound.
    pub fn random_lesson_slot(&mut self) -> Option<LessonSlot> {
        let school = self.school;
        let classes = school.class_groups();
        if classes.is_empty() {
            return None;
        }

        for _ in 0..MAX_SLOT_ATTEMPTS {
            let Some(class) = classes.choose(&mut self.rng) else {
                break;
            };
            let Some(subject) = class.subjects.choose(&mut self.rng) else {
                continue;
            };
            let teachers = school.teachers_for_subject(subject);
            let rooms = school.rooms_for_subject(subject);
            let (Some(teacher), Some(room)) =
                (teachers.choose(&mut self.rng), rooms.choose(&mut self.rng))
            else {
                continue;
            };

            let day = self.rng.random_range(0..self.config.week_days);
            let hour = self.rng.random_range(0..self.config.daily_hours);
            return Some(LessonSlot::new(
                day,
                hour,
                class.name.clone(),
                subject.clone(),
                teacher.id.clone(),
                room.id.clone(),
            ));
        }

        debug!("failed to generate a valid lesson slot after {MAX_SLOT_ATTEMPTS} attempts");
        None
    }

    /// An individual built from repeated random genes
    pub fn random_individual(&mut self, len: usize) -> Individual {
        let genes = (0..len).map(|_| self.random_lesson_slot()).collect();
        Individual::new(genes)
    }

    /// Structured segment crossover: conflict-free contiguous blocks
    /// (per class and day) discovered in both parents are paired in
    /// discovery order, and each pair is exchanged with the current
    /// crossover probability. Children keep the parents' length.
    pub fn crossover(&mut self, a: &Individual, b: &Individual) -> (Individual, Individual) {
        let segments_a = find_good_segments(a);
        let segments_b = find_good_segments(b);

        let mut child_a = a.clone();
        let mut child_b = b.clone();

        for (&(start_a, end_a), &(start_b, end_b)) in segments_a.iter().zip(&segments_b) {
            if !self.rng.random_bool(self.rates.crossover.current) {
                continue;
            }
            // segments may differ in length; exchange the common prefix so
            // both children keep their fixed length
            let span = (end_a - start_a).min(end_b - start_b);
            for offset in 0..span {
                std::mem::swap(
                    &mut child_a.genes_mut()[start_a + offset],
                    &mut child_b.genes_mut()[start_b + offset],
                );
            }
        }

        (child_a, child_b)
    }

    /// Repair-biased mutation: fill empty class slots with synthesised
    /// lessons, then re-randomise a small set of problem genes (nulls,
    /// starved classes, conflicting pairs, gap neighbours).
    pub fn mutate(&mut self, individual: &Individual) -> Individual {
        let school = self.school;
        let mut mutant = individual.clone();

        let timetable = mutant.decode(school);
        let empty_slots = self.find_empty_slots(&timetable);
        if !empty_slots.is_empty() && self.rng.random_bool(FILL_PROBABILITY) {
            let count = empty_slots.len().min(MAX_FILL_SLOTS);
            let chosen: Vec<(u8, u8, String)> = empty_slots
                .choose_multiple(&mut self.rng, count)
                .cloned()
                .collect();
            for (day, hour, class_group) in chosen {
                if let Some(lesson) = self.filling_lesson(&timetable, day, hour, &class_group) {
                    replace_or_fill(&mut mutant, lesson);
                }
            }
        }

        let repaired = mutant.decode(school);
        let points = self.select_mutation_points(&mutant, &repaired);
        for index in points {
            if self.rng.random_bool(self.rates.mutation.current) {
                if let Some(slot) = self.random_lesson_slot() {
                    mutant.set(index, Some(slot));
                }
            }
        }

        mutant
    }

    /// Synthesise a lesson for an empty `(day, hour)` of a class: a random
    /// subject from the class list, a suitable free room, and a qualified
    /// teacher who is free and under caps. `None` when the retry bound is
    /// exhausted.
    fn filling_lesson(
        &mut self,
        timetable: &Timetable,
        day: u8,
        hour: u8,
        class_group: &str,
    ) -> Option<LessonSlot> {
        let school = self.school;
        let class = school.class_by_name(class_group)?;
        if class.subjects.is_empty() {
            return None;
        }

        for _ in 0..MAX_FILL_ATTEMPTS {
            let Some(subject) = class.subjects.choose(&mut self.rng) else {
                break;
            };

            let rooms: Vec<_> = school
                .rooms_for_subject(subject)
                .into_iter()
                .filter(|room| room_available(timetable, room, day, hour))
                .collect();
            if rooms.is_empty() {
                continue;
            }

            let teachers: Vec<_> = school
                .teachers_for_subject(subject)
                .into_iter()
                .filter(|teacher| teacher_available(timetable, teacher, day, hour))
                .collect();
            if teachers.is_empty() {
                continue;
            }

            let (Some(teacher), Some(room)) =
                (teachers.choose(&mut self.rng), rooms.choose(&mut self.rng))
            else {
                continue;
            };
            return Some(LessonSlot::new(
                day,
                hour,
                class_group,
                subject.clone(),
                teacher.id.clone(),
                room.id.clone(),
            ));
        }

        debug!("no filling lesson for {class_group} at day {day} hour {hour}");
        None
    }

    /// Empty `(day, hour)` slots per participating class, in deterministic
    /// class/day/hour order
    fn find_empty_slots(&self, timetable: &Timetable) -> Vec<(u8, u8, String)> {
        let mut empty = Vec::new();
        for class_group in timetable.class_groups() {
            for day in 0..self.config.week_days {
                for hour in 0..self.config.daily_hours {
                    if timetable.class_at(class_group, day, hour).is_none() {
                        empty.push((day, hour, class_group.to_string()));
                    }
                }
            }
        }
        empty
    }

    /// Pick the gene indices worth mutating, preferring problem spots:
    /// null genes, genes of empty or under-filled classes, genes involved
    /// in pairwise conflicts, and genes adjacent to schedule gaps. Capped
    /// at [`MAX_MUTATION_POINTS`]; a small random sample when nothing
    /// stands out.
    fn select_mutation_points(&mut self, individual: &Individual, timetable: &Timetable) -> Vec<usize> {
        let school = self.school;
        let genes = individual.genes();
        if genes.is_empty() {
            return Vec::new();
        }

        let mut seen = vec![false; genes.len()];
        let mut points: Vec<usize> = Vec::new();
        let mut push = |points: &mut Vec<usize>, seen: &mut Vec<bool>, index: usize| {
            if !seen[index] {
                seen[index] = true;
                points.push(index);
            }
        };

        let mut empty_classes: HashSet<&str> = HashSet::new();
        let mut underfilled_classes: HashSet<&str> = HashSet::new();
        for class in school.class_groups() {
            match timetable.class_lesson_count(&class.name) {
                0 => {
                    empty_classes.insert(class.name.as_str());
                }
                n if n < UNDERFILLED_WEEKLY_LESSONS => {
                    underfilled_classes.insert(class.name.as_str());
                }
                _ => {}
            }
        }

        for (i, gene) in genes.iter().enumerate() {
            let Some(lesson) = gene else {
                push(&mut points, &mut seen, i);
                continue;
            };
            if empty_classes.contains(lesson.class_group.as_str()) {
                push(&mut points, &mut seen, i);
                continue;
            }
            if underfilled_classes.contains(lesson.class_group.as_str())
                && self.rng.random_bool(0.5)
            {
                push(&mut points, &mut seen, i);
                continue;
            }
            for (j, other) in genes.iter().enumerate().skip(i + 1) {
                if let Some(other) = other {
                    if lesson.conflicts_with(other) {
                        push(&mut points, &mut seen, i);
                        push(&mut points, &mut seen, j);
                    }
                }
            }
        }

        for (day, hour, class_group) in self.find_empty_slots(timetable) {
            for (i, gene) in genes.iter().enumerate() {
                if let Some(lesson) = gene {
                    if lesson.class_group == class_group
                        && lesson.day == day
                        && lesson.hour.abs_diff(hour) <= 1
                    {
                        push(&mut points, &mut seen, i);
                    }
                }
            }
        }

        if points.is_empty() {
            let count = (genes.len() / 20).clamp(1, 5).min(genes.len());
            return (0..genes.len()).choose_multiple(&mut self.rng, count);
        }

        if points.len() > MAX_MUTATION_POINTS {
            let (priority, rest): (Vec<usize>, Vec<usize>) = points.into_iter().partition(|&i| {
                genes[i]
                    .as_ref()
                    .is_some_and(|g| empty_classes.contains(g.class_group.as_str()))
            });
            if priority.is_empty() {
                return rest
                    .into_iter()
                    .choose_multiple(&mut self.rng, MAX_MUTATION_POINTS);
            }
            let mut selected = priority;
            let extra = rest.len().min(5);
            selected.extend(rest.into_iter().choose_multiple(&mut self.rng, extra));
            return selected;
        }

        points
    }
}

/// Index ranges of conflict-free contiguous hour blocks, per class and
/// day, in discovery order. A range spans from the lowest to the highest
/// gene index of the block.
pub fn find_good_segments(individual: &Individual) -> Vec<(usize, usize)> {
    let mut order: Vec<(&str, u8)> = Vec::new();
    let mut groups: HashMap<(&str, u8), Vec<(usize, u8)>> = HashMap::new();

    for (i, gene) in individual.genes().iter().enumerate() {
        if let Some(lesson) = gene {
            let key = (lesson.class_group.as_str(), lesson.day);
            if !groups.contains_key(&key) {
                order.push(key);
            }
            groups.entry(key).or_default().push((i, lesson.hour));
        }
    }

    let mut segments = Vec::new();
    for key in order {
        let mut block = groups.remove(&key).unwrap_or_default();
        if block.len() < 2 {
            continue;
        }
        block.sort_by_key(|&(_, hour)| hour);
        let contiguous = block.windows(2).all(|w| w[1].1 - w[0].1 <= 1);
        if !contiguous {
            continue;
        }
        let start = block.iter().map(|&(i, _)| i).min().unwrap_or(0);
        let end = block.iter().map(|&(i, _)| i).max().unwrap_or(0);
        segments.push((start, end + 1));
    }
    segments
}

/// Put a synthesised lesson into the individual without growing it:
/// overwrite the gene occupying the same `(class, day, hour)` if one
/// exists, otherwise take the first unassigned position. The lesson is
/// discarded when the individual is already fully assigned.
fn replace_or_fill(individual: &mut Individual, lesson: LessonSlot) {
    let mut empty_at = None;
    for (i, gene) in individual.genes().iter().enumerate() {
        match gene {
            Some(existing)
                if existing.class_group == lesson.class_group
                    && existing.day == lesson.day
                    && existing.hour == lesson.hour =>
            {
                individual.set(i, Some(lesson));
                return;
            }
            None if empty_at.is_none() => empty_at = Some(i),
            _ => {}
        }
    }
    if let Some(i) = empty_at {
        individual.set(i, Some(lesson));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomId, TeacherId};
    use proptest::prelude::*;

    fn lesson(day: u8, hour: u8, class: &str, subject: &str, teacher: &str, room: &str) -> LessonSlot {
        LessonSlot::new(
            day,
            hour,
            class,
            subject,
            TeacherId(teacher.to_string()),
            RoomId(room.to_string()),
        )
    }

    fn seeded_context<'a>(school: &'a School, config: &'a GeneratorConfig) -> SearchContext<'a> {
        let mut ctx = SearchContext::new(school, config);
        ctx.rng = StdRng::seed_from_u64(7);
        ctx
    }

    #[test]
    fn test_random_slot_is_valid() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let mut ctx = seeded_context(&school, &config);

        for _ in 0..50 {
            let slot = ctx.random_lesson_slot().expect("demo school has valid genes");
            assert!(Individual::gene_valid(&school, &slot));
            assert!(slot.day < config.week_days);
            assert!(slot.hour < config.daily_hours);
        }
    }

    #[test]
    fn test_random_slot_exhausts_to_none() {
        // a school where no subject has any qualified teacher
        let school = School::new(
            vec![crate::types::Subject::new("mat", "mathematics", 2)],
            vec![],
            vec![crate::types::Classroom::new("r1", "Room 1", 30)],
            vec![crate::types::ClassGroup::new("1A", 1, "", vec!["mathematics"])],
        );
        let config = GeneratorConfig::default();
        let mut ctx = seeded_context(&school, &config);
        assert!(ctx.random_lesson_slot().is_none());
    }

    #[test]
    fn test_find_good_segments_requires_contiguous_hours() {
        let contiguous = Individual::new(vec![
            Some(lesson(0, 2, "1A", "mathematics", "t1", "r101")),
            Some(lesson(0, 3, "1A", "english", "t2", "r101")),
        ]);
        assert_eq!(find_good_segments(&contiguous), vec![(0, 2)]);

        let gapped = Individual::new(vec![
            Some(lesson(0, 2, "1A", "mathematics", "t1", "r101")),
            Some(lesson(0, 5, "1A", "english", "t2", "r101")),
        ]);
        assert!(find_good_segments(&gapped).is_empty());
    }

    #[test]
    fn test_find_good_segments_groups_by_class_and_day() {
        let ind = Individual::new(vec![
            Some(lesson(0, 0, "1A", "mathematics", "t1", "r101")),
            Some(lesson(1, 0, "1A", "mathematics", "t1", "r101")),
            Some(lesson(0, 1, "1A", "english", "t2", "r101")),
            Some(lesson(1, 1, "1A", "english", "t2", "r101")),
        ]);
        // two segments: (1A, day 0) covering indices 0..3 and (1A, day 1)
        // covering indices 1..4
        let segments = find_good_segments(&ind);
        assert_eq!(segments, vec![(0, 3), (1, 4)]);
    }

    #[test]
    fn test_replace_or_fill_overwrites_same_slot() {
        let mut ind = Individual::new(vec![
            Some(lesson(0, 0, "1A", "mathematics", "t1", "r101")),
            None,
        ]);
        replace_or_fill(&mut ind, lesson(0, 0, "1A", "english", "t2", "r102"));
        assert_eq!(ind.len(), 2);
        assert_eq!(ind.genes()[0].as_ref().unwrap().subject, "english");
    }

    #[test]
    fn test_replace_or_fill_uses_null_position() {
        let mut ind = Individual::new(vec![
            Some(lesson(0, 0, "1A", "mathematics", "t1", "r101")),
            None,
        ]);
        replace_or_fill(&mut ind, lesson(1, 0, "1A", "english", "t2", "r102"));
        assert_eq!(ind.len(), 2);
        assert!(ind.genes()[1].is_some());
    }

    #[test]
    fn test_replace_or_fill_drops_when_full() {
        let original = lesson(0, 0, "1A", "mathematics", "t1", "r101");
        let mut ind = Individual::new(vec![Some(original.clone())]);
        replace_or_fill(&mut ind, lesson(1, 0, "1A", "english", "t2", "r102"));
        assert_eq!(ind.len(), 1);
        assert_eq!(ind.genes()[0].as_ref(), Some(&original));
    }

    #[test]
    fn test_mutation_prefers_conflicting_genes() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let mut ctx = seeded_context(&school, &config);

        // two teacher conflicts and nothing else wrong
        let ind = Individual::new(vec![
            Some(lesson(0, 0, "1A", "mathematics", "t1", "r101")),
            Some(lesson(0, 0, "1B", "mathematics", "t1", "r102")),
            Some(lesson(1, 0, "2A", "english", "t2", "r101")),
            Some(lesson(1, 0, "2B", "english", "t2", "r102")),
        ]);
        let timetable = ind.decode(&school);
        let points = ctx.select_mutation_points(&ind, &timetable);

        for index in [0usize, 1, 2, 3] {
            assert!(points.contains(&index), "conflict gene {index} not selected");
        }
    }

    #[test]
    fn test_adaptive_rates_follow_diversity() {
        let mut rates = AdaptiveRates::new(0.2, 0.85);

        rates.update(0.1);
        assert!(rates.mutation.current > 0.2);
        assert!(rates.crossover.current > 0.85);

        let mut rates = AdaptiveRates::new(0.2, 0.85);
        rates.update(0.9);
        assert!(rates.mutation.current < 0.2);
        assert!(rates.crossover.current < 0.85);

        let mut rates = AdaptiveRates::new(0.2, 0.85);
        rates.update(0.5);
        assert_eq!(rates.mutation.current, 0.2);
        assert_eq!(rates.crossover.current, 0.85);
    }

    #[test]
    fn test_adaptive_rates_keep_explicit_zero_crossover() {
        // mutation-only runs configure crossover 0; adaptation must not
        // drag it back into the band
        let mut rates = AdaptiveRates::new(0.2, 0.0);
        rates.update(0.1);
        assert_eq!(rates.crossover.current, 0.0);
    }

    proptest! {
        #[test]
        fn prop_rates_stay_in_band(diversities in prop::collection::vec(0.0f64..=1.0, 0..50)) {
            let mut rates = AdaptiveRates::new(0.2, 0.85);
            for d in diversities {
                rates.update(d);
                prop_assert!(rates.mutation.current >= rates.mutation.min);
                prop_assert!(rates.mutation.current <= rates.mutation.max);
                prop_assert!(rates.crossover.current >= rates.crossover.min);
                prop_assert!(rates.crossover.current <= rates.crossover.max);
            }
        }

        #[test]
        fn prop_crossover_preserves_length(seed in any::<u64>(), len in 1usize..40) {
            let school = School::demo();
            let config = GeneratorConfig {
                seed: Some(seed),
                ..Default::default()
            };
            let mut ctx = SearchContext::new(&school, &config);
            let a = ctx.random_individual(len);
            let b = ctx.random_individual(len);
            let (c1, c2) = ctx.crossover(&a, &b);
            prop_assert_eq!(c1.len(), len);
            prop_assert_eq!(c2.len(), len);
        }

        #[test]
        fn prop_mutation_preserves_length(seed in any::<u64>(), len in 1usize..40) {
            let school = School::demo();
            let config = GeneratorConfig {
                seed: Some(seed),
                ..Default::default()
            };
            let mut ctx = SearchContext::new(&school, &config);
            let ind = ctx.random_individual(len);
            let mutant = ctx.mutate(&ind);
            prop_assert_eq!(mutant.len(), len);
        }

        #[test]
        fn prop_crossover_keeps_gene_pool(seed in any::<u64>(), len in 1usize..30) {
            // crossover only exchanges genes, so the union multiset of both
            // children equals the union multiset of both parents
            let school = School::demo();
            let config = GeneratorConfig {
                seed: Some(seed),
                ..Default::default()
            };
            let mut ctx = SearchContext::new(&school, &config);
            let a = ctx.random_individual(len);
            let b = ctx.random_individual(len);
            let (c1, c2) = ctx.crossover(&a, &b);

            let mut parents: Vec<_> = a.genes().iter().chain(b.genes()).cloned().collect();
            let mut children: Vec<_> = c1.genes().iter().chain(c2.genes()).cloned().collect();
            parents.sort();
            children.sort();
            prop_assert_eq!(parents, children);
        }
    }
}
