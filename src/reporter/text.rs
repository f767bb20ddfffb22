use colored::Colorize;
use itertools::Itertools;

use crate::genetic::GenerationOutcome;
use crate::types::{day_name, School, Timetable};

const CELL_WIDTH: usize = 16;

/// Generate a plain-text report: one week grid per class plus a run
/// summary
pub fn generate_text_report(outcome: &GenerationOutcome, school: &School) -> String {
    let mut sections = vec![
        "SCHOOL TIMETABLE".to_string(),
        format!("Score: {:.1}/100", outcome.best_fitness),
        format!(
            "Generations: {} in {:.2}s",
            outcome.stats.total_generations, outcome.stats.total_time_secs
        ),
        String::new(),
    ];

    for class in school.class_groups() {
        sections.push(format!("=== Class {} ({}) ===", class.name, class.profile));
        sections.push(class_grid(&outcome.timetable, &class.name, school));
        sections.push(String::new());
    }

    sections.join("\n")
}

/// A week grid for one class: days as columns, hours as rows
fn class_grid(timetable: &Timetable, class_group: &str, school: &School) -> String {
    let days: Vec<u8> = (0..5).collect();
    let max_hour = timetable
        .class_lessons(class_group)
        .iter()
        .map(|l| l.hour)
        .max()
        .unwrap_or(0);

    let header = std::iter::once(format!("{:>4}", "hour"))
        .chain(
            days.iter()
                .map(|&d| format!("{:<width$}", day_name(d), width = CELL_WIDTH)),
        )
        .join(" | ");

    let mut lines = vec![header];
    for hour in 0..=max_hour {
        let row = std::iter::once(format!("{:>4}", hour + 1))
            .chain(days.iter().map(|&day| {
                let cell = timetable
                    .class_at(class_group, day, hour)
                    .map(|lesson| {
                        let room = school
                            .room_by_id(&lesson.room_id)
                            .map(|r| r.name.as_str())
                            .unwrap_or("?");
                        format!("{} ({})", lesson.subject, room)
                    })
                    .unwrap_or_default();
                format!("{:<width$}", truncate(&cell, CELL_WIDTH), width = CELL_WIDTH)
            }))
            .join(" | ");
        lines.push(row);
    }
    lines.join("\n")
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Print a colored run summary to stdout
pub fn print_summary(outcome: &GenerationOutcome, school: &School) {
    println!();
    println!("{}", "=== Generation Summary ===".bold());

    let score = outcome.best_fitness;
    let score_str = format!("{score:.1}/100");
    let colored_score = if score >= 90.0 {
        score_str.green()
    } else if score >= 70.0 {
        score_str.yellow()
    } else {
        score_str.red()
    };
    println!("Score:        {colored_score}");
    println!(
        "Lessons:      {} scheduled for {} classes",
        outcome.timetable.len(),
        school.class_groups().len()
    );
    println!(
        "Generations:  {} ({:.2}s total, {:.3}s avg)",
        outcome.stats.total_generations,
        outcome.stats.total_time_secs,
        outcome.stats.avg_generation_secs
    );
    if outcome.cancelled {
        println!("{}", "Run was cancelled before completion".yellow());
    }
    if let Some(diagnostic) = &outcome.diagnostic {
        println!("{} {diagnostic}", "Warning:".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeneratorConfig, LessonSlot, RoomId, TeacherId};
    use crate::genetic::TimetableGenerator;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_text_report_contains_lessons() {
        let school = School::demo();
        let config = GeneratorConfig {
            population_size: 8,
            iterations: 2,
            seed: Some(4),
            ..Default::default()
        };
        let generator = TimetableGenerator::new(&school, config).unwrap();
        let cancel = AtomicBool::new(false);
        let outcome = generator.generate(&cancel, |_| {}).unwrap();

        let report = generate_text_report(&outcome, &school);
        assert!(report.contains("SCHOOL TIMETABLE"));
        for class in school.class_groups() {
            assert!(report.contains(&format!("Class {}", class.name)));
        }
    }

    #[test]
    fn test_grid_places_lesson_in_cell() {
        let school = School::demo();
        let mut timetable = Timetable::new();
        timetable.try_insert(LessonSlot::new(
            0,
            0,
            "1A",
            "mathematics",
            TeacherId("t1".to_string()),
            RoomId("r101".to_string()),
        ));

        let grid = class_grid(&timetable, "1A", &school);
        assert!(grid.contains("mathematics"));
        assert!(grid.contains("Monday"));
    }
}
