use std::collections::{BTreeMap, HashMap};

use super::{LessonSlot, RoomId, TeacherId};

/// Per-resource occupancy: `(day, hour)` to index into the lesson list
#[derive(Debug, Clone, Default)]
struct Occupancy {
    slots: HashMap<(u8, u8), usize>,
}

impl Occupancy {
    fn at(&self, day: u8, hour: u8) -> Option<usize> {
        self.slots.get(&(day, hour)).copied()
    }

    fn daily(&self, day: u8) -> usize {
        self.slots.keys().filter(|(d, _)| *d == day).count()
    }

    fn weekly(&self) -> usize {
        self.slots.len()
    }
}

/// The decoded, conflict-checked view of an individual.
///
/// Lessons are only admitted through [`Timetable::try_insert`], which
/// rejects any lesson whose teacher, room, or class group is already
/// booked at that `(day, hour)`. A timetable therefore always satisfies
/// the exclusivity invariants by construction.
///
/// The class index is ordered so that iteration over participating
/// class groups is deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    lessons: Vec<LessonSlot>,
    teachers: HashMap<TeacherId, Occupancy>,
    rooms: HashMap<RoomId, Occupancy>,
    classes: BTreeMap<String, Occupancy>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lesson unless it collides with an existing one.
    /// Returns whether the lesson was admitted.
    pub fn try_insert(&mut self, lesson: LessonSlot) -> bool {
        let slot = (lesson.day, lesson.hour);

        if self
            .teachers
            .get(&lesson.teacher_id)
            .is_some_and(|o| o.slots.contains_key(&slot))
        {
            return false;
        }
        if self
            .rooms
            .get(&lesson.room_id)
            .is_some_and(|o| o.slots.contains_key(&slot))
        {
            return false;
        }
        if self
            .classes
            .get(&lesson.class_group)
            .is_some_and(|o| o.slots.contains_key(&slot))
        {
            return false;
        }

        let idx = self.lessons.len();
        self.teachers
            .entry(lesson.teacher_id.clone())
            .or_default()
            .slots
            .insert(slot, idx);
        self.rooms
            .entry(lesson.room_id.clone())
            .or_default()
            .slots
            .insert(slot, idx);
        self.classes
            .entry(lesson.class_group.clone())
            .or_default()
            .slots
            .insert(slot, idx);
        self.lessons.push(lesson);
        true
    }

    pub fn lessons(&self) -> &[LessonSlot] {
        &self.lessons
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Class groups with at least one lesson, in name order
    pub fn class_groups(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn has_class(&self, class_group: &str) -> bool {
        self.classes.contains_key(class_group)
    }

    pub fn class_at(&self, class_group: &str, day: u8, hour: u8) -> Option<&LessonSlot> {
        self.classes
            .get(class_group)
            .and_then(|o| o.at(day, hour))
            .map(|i| &self.lessons[i])
    }

    pub fn teacher_at(&self, teacher_id: &TeacherId, day: u8, hour: u8) -> Option<&LessonSlot> {
        self.teachers
            .get(teacher_id)
            .and_then(|o| o.at(day, hour))
            .map(|i| &self.lessons[i])
    }

    pub fn room_at(&self, room_id: &RoomId, day: u8, hour: u8) -> Option<&LessonSlot> {
        self.rooms
            .get(room_id)
            .and_then(|o| o.at(day, hour))
            .map(|i| &self.lessons[i])
    }

    /// All lessons for a class group, in insertion order
    pub fn class_lessons(&self, class_group: &str) -> Vec<&LessonSlot> {
        self.lessons
            .iter()
            .filter(|l| l.class_group == class_group)
            .collect()
    }

    /// All lessons taught by a teacher, in insertion order
    pub fn teacher_lessons(&self, teacher_id: &TeacherId) -> Vec<&LessonSlot> {
        self.lessons
            .iter()
            .filter(|l| &l.teacher_id == teacher_id)
            .collect()
    }

    pub fn class_lesson_count(&self, class_group: &str) -> usize {
        self.classes.get(class_group).map_or(0, Occupancy::weekly)
    }

    pub fn teacher_daily_hours(&self, teacher_id: &TeacherId, day: u8) -> usize {
        self.teachers.get(teacher_id).map_or(0, |o| o.daily(day))
    }

    pub fn teacher_weekly_hours(&self, teacher_id: &TeacherId) -> usize {
        self.teachers.get(teacher_id).map_or(0, Occupancy::weekly)
    }

    /// Number of slots in which the room is in use
    pub fn room_occupancy(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, Occupancy::weekly)
    }
}
