use std::collections::{HashMap, VecDeque};

use itertools::Itertools;
use log::debug;

use crate::types::{GeneratorConfig, School, Timetable};
use super::{Individual, IndividualKey};

const W_COMPLETENESS: f64 = 0.30;
const W_DISTRIBUTION: f64 = 0.20;
const W_TEACHER_LOAD: f64 = 0.20;
const W_ROOM_USAGE: f64 = 0.15;
const W_CONSTRAINTS: f64 = 0.15;

/// Per-metric scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricScores {
    pub completeness: f64,
    pub distribution: f64,
    pub teacher_load: f64,
    pub room_usage: f64,
    pub constraints: f64,
}

impl MetricScores {
    /// Weighted blend of the five metrics
    pub fn blended(&self) -> f64 {
        self.completeness * W_COMPLETENESS
            + self.distribution * W_DISTRIBUTION
            + self.teacher_load * W_TEACHER_LOAD
            + self.room_usage * W_ROOM_USAGE
            + self.constraints * W_CONSTRAINTS
    }
}

/// Multi-criterion fitness evaluator with a FIFO score cache.
///
/// Scores are memoised under the individual's order-independent key; a
/// cache hit returns exactly what a recompute would. When the cache
/// outgrows its capacity, the oldest fifth of the entries is evicted.
pub struct Evaluator<'a> {
    school: &'a School,
    week_days: u8,
    daily_hours: u8,
    cache_capacity: usize,
    cache: HashMap<IndividualKey, f64>,
    insertion_order: VecDeque<IndividualKey>,
    hits: u64,
    misses: u64,
}

impl<'a> Evaluator<'a> {
    pub fn new(school: &'a School, config: &GeneratorConfig) -> Self {
        Self {
            school,
            week_days: config.week_days,
            daily_hours: config.daily_hours,
            cache_capacity: config.cache_capacity.max(1),
            cache: HashMap::new(),
            insertion_order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Score an individual: decode it and score the resulting timetable,
    /// memoising by the individual's identity key
    pub fn evaluate_individual(&mut self, individual: &Individual) -> f64 {
        let key = individual.key();
        if let Some(&score) = self.cache.get(&key) {
            self.hits += 1;
            self.log_cache_stats();
            return score;
        }
        self.misses += 1;

        let timetable = individual.decode(self.school);
        let score = self.evaluate_timetable(&timetable);
        self.cache_insert(key, score);
        self.log_cache_stats();
        score
    }

    /// Score a decoded timetable in [0, 100]. Pure: the timetable is never
    /// mutated and equal timetables always score equally.
    pub fn evaluate_timetable(&self, timetable: &Timetable) -> f64 {
        let metrics = self.metrics(timetable);
        let total = metrics.blended() - self.penalties(&metrics) + self.rewards(&metrics);
        total.clamp(0.0, 100.0)
    }

    /// The five component scores for a timetable
    pub fn metrics(&self, timetable: &Timetable) -> MetricScores {
        MetricScores {
            completeness: self.completeness(timetable),
            distribution: self.distribution(timetable),
            teacher_load: self.teacher_load(timetable),
            room_usage: self.room_usage(timetable),
            constraints: self.constraints(timetable),
        }
    }

    /// Scheduled vs required hours, with heavy penalties for empty classes
    /// (worse for first-years) and for classes under 80% completion
    fn completeness(&self, timetable: &Timetable) -> f64 {
        let mut score = 100.0;
        let mut total_required = 0u32;
        let mut total_scheduled = 0usize;

        for class in self.school.class_groups() {
            let required = self.school.class_required_hours(class);
            let scheduled = timetable.class_lesson_count(&class.name);

            if scheduled == 0 {
                let mut penalty = 50.0;
                if class.year == 1 {
                    penalty += 20.0;
                }
                score -= penalty;
            }

            let completion = if required > 0 {
                scheduled as f64 / f64::from(required)
            } else {
                0.0
            };
            if completion < 0.8 {
                score -= (0.8 - completion) * 100.0;
            }

            total_required += required;
            total_scheduled += scheduled;
        }

        let overall = if total_required > 0 {
            total_scheduled as f64 / f64::from(total_required) * 100.0
        } else {
            0.0
        };
        score.min(overall).max(0.0)
    }

    /// Weekly spread per participating class: penalties for empty
    /// weekdays, gaps between lessons, late starts and late ends
    fn distribution(&self, timetable: &Timetable) -> f64 {
        let mut penalties = 0.0;

        for class_group in timetable.class_groups() {
            for day in 0..self.week_days {
                let hours: Vec<u8> = (0..self.daily_hours)
                    .filter(|&hour| timetable.class_at(class_group, day, hour).is_some())
                    .collect();

                let (Some(&first), Some(&last)) = (hours.first(), hours.last()) else {
                    penalties += 20.0;
                    continue;
                };

                let gaps: u32 = hours
                    .iter()
                    .tuple_windows()
                    .map(|(a, b)| u32::from(b - a) - 1)
                    .sum();
                penalties += 15.0 * f64::from(gaps);

                if first > 2 {
                    penalties += 10.0;
                }
                if last > 6 {
                    penalties += 10.0;
                }
            }
        }

        (100.0 - penalties).max(0.0)
    }

    /// Cap compliance and utilisation across the teaching staff
    fn teacher_load(&self, timetable: &Timetable) -> f64 {
        let mut penalties = 0.0;

        for teacher in self.school.teachers() {
            for day in 0..self.week_days {
                let daily = timetable.teacher_daily_hours(&teacher.id, day);
                let cap = usize::from(teacher.max_hours_per_day);
                if daily > cap {
                    penalties += 10.0 * (daily - cap) as f64;
                }
            }

            let weekly = timetable.teacher_weekly_hours(&teacher.id);
            let cap = usize::from(teacher.max_hours_per_week);
            if weekly > cap {
                penalties += 15.0 * (weekly - cap) as f64;
            } else if (weekly as f64) < f64::from(teacher.max_hours_per_week) * 0.5 {
                penalties += 10.0;
            }
        }

        (100.0 - penalties).max(0.0)
    }

    /// Room occupancy: idle rooms and overloaded rooms cost points, rooms
    /// in the 60-80% band earn a bonus
    fn room_usage(&self, timetable: &Timetable) -> f64 {
        let mut score: f64 = 100.0;
        let weekly_slots = self.week_days as usize * self.daily_hours as usize;
        if weekly_slots == 0 {
            return 0.0;
        }

        for room in self.school.classrooms() {
            let usage = timetable.room_occupancy(&room.id) as f64 / weekly_slots as f64 * 100.0;
            if usage < 30.0 {
                score -= 10.0;
            } else if usage > 90.0 {
                score -= 5.0;
            } else if (60.0..=80.0).contains(&usage) {
                score += 5.0;
            }
        }

        score.clamp(0.0, 100.0)
    }

    /// Pairs of lessons sharing a slot and a teacher, room, or class
    /// group. Timetables built through the conflict-checked insert cannot
    /// contain any, so this guards external input paths.
    fn constraints(&self, timetable: &Timetable) -> f64 {
        let mut conflicts = 0u32;
        let lessons = timetable.lessons();
        for (i, a) in lessons.iter().enumerate() {
            for b in &lessons[i + 1..] {
                if a.conflicts_with(b) {
                    conflicts += 1;
                }
            }
        }
        (100.0 - 20.0 * f64::from(conflicts)).max(0.0)
    }

    /// Global penalties for metrics under their floors
    fn penalties(&self, metrics: &MetricScores) -> f64 {
        let mut total = 0.0;
        if metrics.completeness < 90.0 {
            total += (90.0 - metrics.completeness) * 0.5;
        }
        if metrics.distribution < 70.0 {
            total += (70.0 - metrics.distribution) * 0.3;
        }
        if metrics.teacher_load < 80.0 {
            total += (80.0 - metrics.teacher_load) * 0.4;
        }
        total
    }

    /// Global rewards for metrics above their targets
    fn rewards(&self, metrics: &MetricScores) -> f64 {
        let mut total = 0.0;
        if metrics.completeness > 95.0 {
            total += (metrics.completeness - 95.0) * 0.5;
        }
        if metrics.distribution > 90.0 {
            total += (metrics.distribution - 90.0) * 0.3;
        }
        if metrics.teacher_load > 90.0 {
            total += (metrics.teacher_load - 90.0) * 0.4;
        }
        total
    }

    fn cache_insert(&mut self, key: IndividualKey, score: f64) {
        if self.cache.len() >= self.cache_capacity {
            let evict = (self.cache_capacity / 5).max(1);
            for _ in 0..evict {
                if let Some(old) = self.insertion_order.pop_front() {
                    self.cache.remove(&old);
                }
            }
        }
        self.insertion_order.push_back(key.clone());
        self.cache.insert(key, score);
    }

    fn log_cache_stats(&self) {
        let lookups = self.hits + self.misses;
        if lookups > 0 && lookups % 1000 == 0 {
            let hit_rate = self.hits as f64 / lookups as f64 * 100.0;
            debug!(
                "fitness cache: {hit_rate:.1}% hit rate, {} entries",
                self.cache.len()
            );
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
