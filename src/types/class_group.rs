use serde::{Deserialize, Serialize};

/// Represents a class group (e.g. "1A"): one cohort of students that
/// attends all its lessons together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroup {
    /// Unique name, conventionally year + letter ("1A", "3C")
    pub name: String,
    /// School year, 1-4
    pub year: u8,
    /// Profile name deciding the extended subjects ("science", "humanities")
    #[serde(default)]
    pub profile: String,
    /// Ordered subject names: the basic canon plus profile extensions
    pub subjects: Vec<String>,
}

impl ClassGroup {
    pub fn new(name: impl Into<String>, year: u8, profile: impl Into<String>, subjects: Vec<&str>) -> Self {
        Self {
            name: name.into(),
            year,
            profile: profile.into(),
            subjects: subjects.into_iter().map(String::from).collect(),
        }
    }

    pub fn takes_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}
