use serde::Serialize;

use crate::error::Result;
use crate::genetic::{GenerationOutcome, GenerationStats, ProgressRecord};
use crate::types::LessonSlot;

/// Serializable form of a finished run
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    score: f64,
    cancelled: bool,
    lessons: &'a [LessonSlot],
    stats: &'a GenerationStats,
    progress: &'a [ProgressRecord],
}

/// Generate a machine-readable JSON report
pub fn generate_json_report(outcome: &GenerationOutcome) -> Result<String> {
    let report = JsonReport {
        score: outcome.best_fitness,
        cancelled: outcome.cancelled,
        lessons: outcome.timetable.lessons(),
        stats: &outcome.stats,
        progress: &outcome.progress,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
