use itertools::Itertools;

use crate::genetic::GenerationOutcome;
use crate::types::{day_name, School, Timetable};

/// Generate a markdown report: summary, per-class week tables, and the
/// progress trace of the run
pub fn generate_markdown_report(outcome: &GenerationOutcome, school: &School) -> String {
    let mut sections = vec![
        "# School Timetable".to_string(),
        String::new(),
        format!("**Score:** {:.1}/100", outcome.best_fitness),
        format!(
            "**Generations:** {} in {:.2}s",
            outcome.stats.total_generations, outcome.stats.total_time_secs
        ),
        format!("**Lessons scheduled:** {}", outcome.timetable.len()),
        String::new(),
    ];

    for class in school.class_groups() {
        sections.push(format!("## Class {} ({})", class.name, class.profile));
        sections.push(String::new());
        sections.push(class_table(&outcome.timetable, &class.name, school));
        sections.push(String::new());
    }

    sections.push("## Progress".to_string());
    sections.push(String::new());
    sections.push("| Generation | Best | Avg | Std | Min |".to_string());
    sections.push("|---:|---:|---:|---:|---:|".to_string());
    for record in &outcome.progress {
        sections.push(format!(
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} |",
            record.generation,
            record.best_fitness,
            record.avg_fitness,
            record.std_fitness,
            record.min_fitness
        ));
    }

    sections.join("\n")
}

fn class_table(timetable: &Timetable, class_group: &str, school: &School) -> String {
    let days: Vec<u8> = (0..5).collect();
    let max_hour = timetable
        .class_lessons(class_group)
        .iter()
        .map(|l| l.hour)
        .max()
        .unwrap_or(0);

    let header = format!(
        "| Hour | {} |",
        days.iter().map(|&d| day_name(d)).join(" | ")
    );
    let divider = format!("|---|{}|", days.iter().map(|_| "---").join("|"));

    let mut lines = vec![header, divider];
    for hour in 0..=max_hour {
        let cells = days
            .iter()
            .map(|&day| {
                timetable
                    .class_at(class_group, day, hour)
                    .map(|lesson| {
                        let teacher = school
                            .teacher_by_id(&lesson.teacher_id)
                            .map(|t| t.name.as_str())
                            .unwrap_or("?");
                        format!("{} ({})", lesson.subject, teacher)
                    })
                    .unwrap_or_else(|| "—".to_string())
            })
            .join(" | ");
        lines.push(format!("| {} | {} |", hour + 1, cells));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::TimetableGenerator;
    use crate::types::GeneratorConfig;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_markdown_report_structure() {
        let school = School::demo();
        let config = GeneratorConfig {
            population_size: 8,
            iterations: 2,
            seed: Some(6),
            ..Default::default()
        };
        let generator = TimetableGenerator::new(&school, config).unwrap();
        let cancel = AtomicBool::new(false);
        let outcome = generator.generate(&cancel, |_| {}).unwrap();

        let report = generate_markdown_report(&outcome, &school);
        assert!(report.starts_with("# School Timetable"));
        assert!(report.contains("## Class 1A"));
        assert!(report.contains("## Progress"));
        assert!(report.contains("| Monday |") || report.contains("| Monday "));
    }
}
