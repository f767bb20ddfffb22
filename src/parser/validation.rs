use std::collections::HashSet;

use crate::error::Result;
use crate::feasibility::room_suitable;
use crate::types::{ClassGroup, Classroom, Subject, Teacher};

/// Validation result with collected errors and warnings
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate the raw catalogs before they become a snapshot
pub fn validate_catalog(
    subjects: &[Subject],
    teachers: &[Teacher],
    rooms: &[Classroom],
    class_groups: &[ClassGroup],
) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    check_duplicate_subjects(subjects, &mut result);
    check_duplicate_teachers(teachers, &mut result);
    check_duplicate_rooms(rooms, &mut result);
    check_duplicate_classes(class_groups, &mut result);

    let subject_names: HashSet<&str> = subjects.iter().map(|s| s.name.as_str()).collect();

    // class subject references must resolve
    for class in class_groups {
        for subject in &class.subjects {
            if !subject_names.contains(subject.as_str()) {
                result.add_error(format!(
                    "Class '{}' references unknown subject '{}'",
                    class.name, subject
                ));
            }
        }
    }

    // teachers listing unknown subjects are suspicious but harmless
    for teacher in teachers {
        for subject in &teacher.subjects {
            if !subject_names.contains(subject.as_str()) {
                result.add_warning(format!(
                    "Teacher '{}' lists unknown subject '{}'",
                    teacher.id, subject
                ));
            }
        }
        for &day in &teacher.available_days {
            if day > 6 {
                result.add_warning(format!(
                    "Teacher '{}' lists invalid weekday {day}",
                    teacher.id
                ));
            }
        }
    }

    // a subject someone must take needs a qualified teacher and a room
    let taken: HashSet<&str> = class_groups
        .iter()
        .flat_map(|c| c.subjects.iter().map(String::as_str))
        .collect();
    for subject in subjects.iter().filter(|s| taken.contains(s.name.as_str())) {
        if !teachers.iter().any(|t| t.can_teach(&subject.name)) {
            result.add_error(format!(
                "Subject '{}' has no qualified teachers",
                subject.name
            ));
        }
        if !rooms.iter().any(|r| room_suitable(subject, r)) {
            result.add_error(format!(
                "Subject '{}' has no suitable room",
                subject.name
            ));
        }
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

fn check_duplicate_subjects(subjects: &[Subject], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for subject in subjects {
        if !seen.insert(&subject.name) {
            result.add_error(format!("Duplicate subject name: '{}'", subject.name));
        }
    }
}

fn check_duplicate_teachers(teachers: &[Teacher], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for teacher in teachers {
        if !seen.insert(&teacher.id) {
            result.add_error(format!("Duplicate teacher ID: '{}'", teacher.id));
        }
    }
}

fn check_duplicate_rooms(rooms: &[Classroom], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for room in rooms {
        if !seen.insert(&room.id) {
            result.add_error(format!("Duplicate room ID: '{}'", room.id));
        }
    }
}

fn check_duplicate_classes(class_groups: &[ClassGroup], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for class in class_groups {
        if !seen.insert(&class.name) {
            result.add_error(format!("Duplicate class name: '{}'", class.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::School;

    #[test]
    fn test_demo_catalog_is_valid() {
        let school = School::demo();
        let result = validate_catalog(
            school.subjects(),
            school.teachers(),
            school.classrooms(),
            school.class_groups(),
        )
        .unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_class_subject_is_an_error() {
        let subjects = vec![Subject::new("mat", "mathematics", 4)];
        let teachers = vec![Teacher::new("t1", "Keller", vec!["mathematics"])];
        let rooms = vec![Classroom::new("r1", "Room 1", 30)];
        let classes = vec![ClassGroup::new("1A", 1, "", vec!["mathematics", "alchemy"])];

        assert!(validate_catalog(&subjects, &teachers, &rooms, &classes).is_err());
    }

    #[test]
    fn test_unteachable_subject_is_an_error() {
        let subjects = vec![
            Subject::new("mat", "mathematics", 4),
            Subject::new("his", "history", 2),
        ];
        let teachers = vec![Teacher::new("t1", "Keller", vec!["mathematics"])];
        let rooms = vec![Classroom::new("r1", "Room 1", 30)];
        let classes = vec![ClassGroup::new("1A", 1, "", vec!["mathematics", "history"])];

        assert!(validate_catalog(&subjects, &teachers, &rooms, &classes).is_err());
    }

    #[test]
    fn test_untaken_subject_without_teacher_is_fine() {
        // history has no teacher, but no class takes it either
        let subjects = vec![
            Subject::new("mat", "mathematics", 4),
            Subject::new("his", "history", 2),
        ];
        let teachers = vec![Teacher::new("t1", "Keller", vec!["mathematics"])];
        let rooms = vec![Classroom::new("r1", "Room 1", 30)];
        let classes = vec![ClassGroup::new("1A", 1, "", vec!["mathematics"])];

        assert!(validate_catalog(&subjects, &teachers, &rooms, &classes).is_ok());
    }

    #[test]
    fn test_roomless_special_subject_is_an_error() {
        let subjects = vec![Subject::new("pe", "physical_education", 3).in_room_type("gym")];
        let teachers = vec![Teacher::new("t1", "Moreau", vec!["physical_education"])];
        let rooms = vec![Classroom::new("r1", "Room 1", 30)];
        let classes = vec![ClassGroup::new("1A", 1, "", vec!["physical_education"])];

        assert!(validate_catalog(&subjects, &teachers, &rooms, &classes).is_err());
    }

    #[test]
    fn test_duplicate_teacher_id_is_an_error() {
        let subjects = vec![Subject::new("mat", "mathematics", 4)];
        let teachers = vec![
            Teacher::new("t1", "Keller", vec!["mathematics"]),
            Teacher::new("t1", "Doppel", vec!["mathematics"]),
        ];
        let rooms = vec![Classroom::new("r1", "Room 1", 30)];
        let classes = vec![ClassGroup::new("1A", 1, "", vec!["mathematics"])];

        assert!(validate_catalog(&subjects, &teachers, &rooms, &classes).is_err());
    }
}
