use std::collections::HashMap;

use crate::feasibility::room_suitable;
use super::{ClassGroup, Classroom, RoomId, Subject, Teacher, TeacherId};

/// Immutable domain snapshot: the full catalog of subjects, teachers,
/// classrooms and class groups, with O(1) lookups and precomputed
/// qualification/suitability collections.
///
/// Constructed once from external loaders; nothing mutates it afterwards.
/// Derived collections preserve catalog order so that runs with a fixed
/// RNG seed are reproducible.
#[derive(Debug)]
pub struct School {
    subjects: Vec<Subject>,
    teachers: Vec<Teacher>,
    classrooms: Vec<Classroom>,
    class_groups: Vec<ClassGroup>,
    subject_index: HashMap<String, usize>,
    teacher_index: HashMap<TeacherId, usize>,
    room_index: HashMap<RoomId, usize>,
    class_index: HashMap<String, usize>,
    /// subject name -> indices of qualified teachers, in catalog order
    teachers_for_subject: HashMap<String, Vec<usize>>,
    /// subject name -> indices of suitable rooms, in catalog order
    rooms_for_subject: HashMap<String, Vec<usize>>,
}

impl School {
    pub fn new(
        subjects: Vec<Subject>,
        teachers: Vec<Teacher>,
        classrooms: Vec<Classroom>,
        class_groups: Vec<ClassGroup>,
    ) -> Self {
        let subject_index = subjects
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        let teacher_index = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let room_index = classrooms
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let class_index = class_groups
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        let mut teachers_for_subject: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, teacher) in teachers.iter().enumerate() {
            for subject in &teacher.subjects {
                teachers_for_subject
                    .entry(subject.clone())
                    .or_default()
                    .push(i);
            }
        }

        let mut rooms_for_subject: HashMap<String, Vec<usize>> = HashMap::new();
        for subject in &subjects {
            let suitable = classrooms
                .iter()
                .enumerate()
                .filter(|(_, room)| room_suitable(subject, room))
                .map(|(i, _)| i)
                .collect();
            rooms_for_subject.insert(subject.name.clone(), suitable);
        }

        Self {
            subjects,
            teachers,
            classrooms,
            class_groups,
            subject_index,
            teacher_index,
            room_index,
            class_index,
            teachers_for_subject,
            rooms_for_subject,
        }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn classrooms(&self) -> &[Classroom] {
        &self.classrooms
    }

    pub fn class_groups(&self) -> &[ClassGroup] {
        &self.class_groups
    }

    pub fn subject_by_name(&self, name: &str) -> Option<&Subject> {
        self.subject_index.get(name).map(|&i| &self.subjects[i])
    }

    pub fn teacher_by_id(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teacher_index.get(id).map(|&i| &self.teachers[i])
    }

    pub fn room_by_id(&self, id: &RoomId) -> Option<&Classroom> {
        self.room_index.get(id).map(|&i| &self.classrooms[i])
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassGroup> {
        self.class_index.get(name).map(|&i| &self.class_groups[i])
    }

    /// Teachers qualified for a subject, in catalog order
    pub fn teachers_for_subject(&self, subject: &str) -> Vec<&Teacher> {
        self.teachers_for_subject
            .get(subject)
            .map(|ids| ids.iter().map(|&i| &self.teachers[i]).collect())
            .unwrap_or_default()
    }

    /// Rooms suitable for a subject, in catalog order
    pub fn rooms_for_subject(&self, subject: &str) -> Vec<&Classroom> {
        self.rooms_for_subject
            .get(subject)
            .map(|ids| ids.iter().map(|&i| &self.classrooms[i]).collect())
            .unwrap_or_default()
    }

    /// Weekly hours a class must be scheduled, summed over its subjects.
    /// Subjects missing from the catalog contribute nothing.
    pub fn class_required_hours(&self, class_group: &ClassGroup) -> u32 {
        class_group
            .subjects
            .iter()
            .filter_map(|name| self.subject_by_name(name))
            .map(|s| u32::from(s.hours_per_week))
            .sum()
    }

    /// Total lessons to schedule across all classes: the individual length
    pub fn total_required_hours(&self) -> usize {
        self.class_groups
            .iter()
            .map(|c| self.class_required_hours(c) as usize)
            .sum()
    }

    /// Small built-in catalog used by the CLI demo and the test suite:
    /// ten subjects (three of them bound to special rooms), nine teachers,
    /// four regular rooms plus a computer lab, two science labs and a gym,
    /// and four classes across two years.
    pub fn demo() -> Self {
        let subjects = vec![
            Subject::new("mat", "mathematics", 4),
            Subject::new("eng", "english", 3),
            Subject::new("spa", "spanish", 2),
            Subject::new("phy", "physics", 2).in_room_type("physics_lab"),
            Subject::new("che", "chemistry", 2).in_room_type("chemistry_lab"),
            Subject::new("bio", "biology", 2),
            Subject::new("geo", "geography", 2),
            Subject::new("his", "history", 2),
            Subject::new("cs", "computer_science", 2).in_room_type("computer_lab"),
            Subject::new("pe", "physical_education", 3).in_room_type("gym"),
        ];

        let teachers = vec![
            Teacher::new("t1", "Keller", vec!["mathematics"]),
            Teacher::new("t2", "Okafor", vec!["english", "spanish"]),
            Teacher::new("t3", "Brandt", vec!["physics", "mathematics"]),
            Teacher::new("t4", "Silva", vec!["chemistry", "biology"]),
            Teacher::new("t5", "Nowak", vec!["geography", "biology"]),
            Teacher::new("t6", "Haddad", vec!["history"]),
            Teacher::new("t7", "Lindgren", vec!["computer_science"]),
            Teacher::new("t8", "Moreau", vec!["physical_education"]),
            Teacher::new("t9", "Yamada", vec!["english", "history"]),
        ];

        let classrooms = vec![
            Classroom::new("r101", "Room 101", 30),
            Classroom::new("r102", "Room 102", 30),
            Classroom::new("r103", "Room 103", 30),
            Classroom::new("r104", "Room 104", 30),
            Classroom::new("lab-c", "Computer Lab", 25).of_type("computer_lab"),
            Classroom::new("lab-p", "Physics Lab", 20).of_type("physics_lab"),
            Classroom::new("lab-ch", "Chemistry Lab", 20).of_type("chemistry_lab"),
            Classroom::new("gym", "Gymnasium", 50).of_type("gym"),
        ];

        let basic = vec![
            "mathematics",
            "english",
            "spanish",
            "physics",
            "chemistry",
            "biology",
            "geography",
            "history",
            "computer_science",
            "physical_education",
        ];
        let class_groups = vec![
            ClassGroup::new("1A", 1, "science", basic.clone()),
            ClassGroup::new("1B", 1, "humanities", basic.clone()),
            ClassGroup::new("2A", 2, "science", basic.clone()),
            ClassGroup::new("2B", 2, "humanities", basic),
        ];

        Self::new(subjects, teachers, classrooms, class_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let school = School::demo();
        assert!(school.subject_by_name("mathematics").is_some());
        assert!(school.subject_by_name("alchemy").is_none());
        assert!(school.teacher_by_id(&TeacherId("t1".to_string())).is_some());
        assert!(school.room_by_id(&RoomId("gym".to_string())).is_some());
        assert!(school.class_by_name("1A").is_some());
    }

    #[test]
    fn test_teachers_for_subject_in_catalog_order() {
        let school = School::demo();
        let english: Vec<&str> = school
            .teachers_for_subject("english")
            .iter()
            .map(|t| t.id.0.as_str())
            .collect();
        assert_eq!(english, vec!["t2", "t9"]);
    }

    #[test]
    fn test_rooms_for_special_subject() {
        let school = School::demo();
        let gyms = school.rooms_for_subject("physical_education");
        assert_eq!(gyms.len(), 1);
        assert_eq!(gyms[0].room_type, "gym");

        // a subject with no room requirement may use any room
        let math_rooms = school.rooms_for_subject("mathematics");
        assert_eq!(math_rooms.len(), school.classrooms().len());
    }

    #[test]
    fn test_required_hours() {
        let school = School::demo();
        let class = school.class_by_name("1A").unwrap();
        assert_eq!(school.class_required_hours(class), 24);
        assert_eq!(school.total_required_hours(), 4 * 24);
    }
}
