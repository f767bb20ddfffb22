mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::genetic::GenerationOutcome;
use crate::types::{day_name, School, TeacherId};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

impl OutputFormat {
    /// Parse a CLI format string; "all" selects every format
    pub fn parse_list(s: &str) -> Vec<OutputFormat> {
        match s {
            "all" => vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text],
            "json" => vec![OutputFormat::Json],
            "markdown" | "md" => vec![OutputFormat::Markdown],
            "text" | "txt" => vec![OutputFormat::Text],
            _ => vec![],
        }
    }
}

/// Generate all requested reports and write them to the output directory
pub fn generate_reports(
    outcome: &GenerationOutcome,
    school: &School,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(outcome)?;
                fs::write(output_dir.join("timetable.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(outcome, school);
                fs::write(output_dir.join("timetable.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(outcome, school);
                fs::write(output_dir.join("timetable.txt"), txt)?;
            }
        }
    }

    Ok(())
}

/// Generate a single teacher's weekly schedule
pub fn generate_teacher_schedule(
    outcome: &GenerationOutcome,
    school: &School,
    teacher_id: &TeacherId,
) -> Option<String> {
    let teacher = school.teacher_by_id(teacher_id)?;

    let mut lines = vec![
        format!("# Schedule for {} ({})", teacher.name, teacher.id),
        String::new(),
    ];

    let mut lessons = outcome.timetable.teacher_lessons(teacher_id);
    lessons.sort_by_key(|l| (l.day, l.hour));

    if lessons.is_empty() {
        lines.push("No lessons assigned.".to_string());
    } else {
        lines.push(format!("## Teaching {} lessons\n", lessons.len()));
        for lesson in lessons {
            let room = school
                .room_by_id(&lesson.room_id)
                .map(|r| r.name.as_str())
                .unwrap_or("Unknown");
            lines.push(format!(
                "- **{} hour {}**: {} with {} in {}",
                day_name(lesson.day),
                lesson.hour + 1,
                lesson.subject,
                lesson.class_group,
                room
            ));
        }
    }

    Some(lines.join("\n"))
}
