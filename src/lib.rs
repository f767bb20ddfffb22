//! School Timetabler - Evolutionary school timetable generator
//!
//! This library computes a weekly school timetable (subject x class group x
//! teacher x classroom x day x hour) with a constraint-aware genetic
//! algorithm.
//!
//! # Algorithm Overview
//!
//! A run works in 4 phases:
//! 1. **Seeding**: A deterministic heuristic builds one feasible individual
//!    with at least one lesson per class per weekday, core subjects first
//! 2. **Initial Population**: The rest of the population is filled with
//!    randomly generated individuals (plus an optional best-known solution)
//! 3. **Evolution**: Tournament selection, segment crossover and
//!    repair-biased mutation, with rates adapted to population diversity
//! 4. **Decoding**: The hall-of-fame champion is decoded into a
//!    conflict-free timetable
//!
//! # Example
//!
//! ```no_run
//! use school_timetabler::genetic::TimetableGenerator;
//! use school_timetabler::types::{GeneratorConfig, School};
//! use std::sync::atomic::AtomicBool;
//!
//! let school = School::demo();
//! let generator = TimetableGenerator::new(&school, GeneratorConfig::default()).unwrap();
//! let cancel = AtomicBool::new(false);
//! let outcome = generator.generate(&cancel, |_| {}).unwrap();
//! println!("Score: {:.1}", outcome.best_fitness);
//! ```

pub mod error;
pub mod feasibility;
pub mod genetic;
pub mod parser;
pub mod reporter;
pub mod solution_store;
pub mod types;

pub use error::{Result, SchedulerError};
