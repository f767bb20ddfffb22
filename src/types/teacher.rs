use serde::{Deserialize, Serialize};
use super::TeacherId;

/// Represents a teacher with their qualifications and workload caps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Names of subjects this teacher is qualified to teach
    pub subjects: Vec<String>,
    /// Maximum lessons per day
    #[serde(default = "default_daily_cap")]
    pub max_hours_per_day: u8,
    /// Maximum lessons per week
    #[serde(default = "default_weekly_cap")]
    pub max_hours_per_week: u8,
    /// Weekdays the teacher works (part-time teachers list a subset)
    #[serde(default = "default_available_days")]
    pub available_days: Vec<u8>,
}

fn default_daily_cap() -> u8 {
    8
}

fn default_weekly_cap() -> u8 {
    40
}

fn default_available_days() -> Vec<u8> {
    (0..5).collect()
}

impl Teacher {
    pub fn new(id: impl Into<String>, name: impl Into<String>, subjects: Vec<&str>) -> Self {
        Self {
            id: TeacherId(id.into()),
            name: name.into(),
            subjects: subjects.into_iter().map(String::from).collect(),
            max_hours_per_day: default_daily_cap(),
            max_hours_per_week: default_weekly_cap(),
            available_days: default_available_days(),
        }
    }

    /// Check if teacher can teach a given subject
    pub fn can_teach(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    /// Check if the teacher works on a given weekday
    pub fn works_on(&self, day: u8) -> bool {
        self.available_days.contains(&day)
    }
}
